//! Authentication settings registration

use panel_core::settings::{SettingDefinition, SettingValue, SettingsRegistry};

use crate::prelude::*;

fn positive(v: &SettingValue) -> PnResult<()> {
	match v {
		SettingValue::Int(n) if *n > 0 => Ok(()),
		_ => Err(Error::ValidationError("Value must be a positive integer".into())),
	}
}

pub fn register_settings(registry: &mut SettingsRegistry) -> PnResult<()> {
	registry.register(
		SettingDefinition::builder("auth.registration_enabled")
			.description("Allow visitors to create accounts")
			.default(SettingValue::Bool(true))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("auth.session_timeout")
			.description("Session lifetime in seconds")
			.default(SettingValue::Int(8 * 3600))
			.validator(positive)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("auth.notify_timeout")
			.description("Seconds to wait for the account creation notification")
			.default(SettingValue::Int(10))
			.validator(positive)
			.build()?,
	)?;

	Ok(())
}

// vim: ts=4
