//! Authentication subsystem: account provisioning, login and sessions.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod crypto;
pub mod handler;
pub mod register;
pub mod session;
pub mod settings;

mod prelude;

pub use register::{Provisioned, Provisioner, ProvisionState, RegisterRequest};
pub use session::JwtSessionIssuer;

use crate::prelude::*;

pub fn register_settings(registry: &mut panel_core::settings::SettingsRegistry) -> PnResult<()> {
	settings::register_settings(registry)
}

// vim: ts=4
