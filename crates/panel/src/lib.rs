//! Panel server: account provisioning, scope grants and locations over HTTP.
//!
//! # Features
//!
//! - Self registration with a validated, race-free account creation path
//! - Scope grants, global or per target, checked on every protected route
//! - Location management
//! - JWT sessions as bearer token or cookie
//! - Email notifications rendered from templates

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

// Re-export shared types and feature crates
pub use panel_auth as auth;
pub use panel_core::settings;
pub use panel_email as email;
pub use panel_types::error;
pub use panel_types::store_adapter;
pub use panel_types::types;
pub use panel_types::worker;

// Local modules
pub mod app;
pub mod location;
pub mod prelude;
pub mod routes;

pub use crate::app::{App, AppBuilder};

// vim: ts=4
