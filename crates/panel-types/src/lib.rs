//! Shared types, adapter traits, validation and error types for the panel.
//!
//! Adapter implementations depend only on this crate, so they compile
//! independently of the feature crates.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod error;
pub mod notify;
pub mod prelude;
pub mod scope;
pub mod session;
pub mod store_adapter;
pub mod types;
pub mod utils;
pub mod validate;
pub mod worker;

// vim: ts=4
