//! Core infrastructure shared by the panel feature crates.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod extract;
pub mod perm;
pub mod prelude;
pub mod settings;

pub use app::{App, AppBuilderOpts, AppState};
pub use extract::Auth;
pub use perm::PermService;

// vim: ts=4
