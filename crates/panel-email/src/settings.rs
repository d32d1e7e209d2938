//! Email settings registration

use panel_core::settings::{SettingDefinition, SettingValue, SettingsRegistry};

use crate::prelude::*;

pub fn register_settings(registry: &mut SettingsRegistry) -> PnResult<()> {
	registry.register(
		SettingDefinition::builder("email.enabled")
			.description("Enable email sending")
			.default(SettingValue::Bool(false))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.host")
			.description("SMTP server hostname. If not set, notifications are skipped.")
			.optional(true)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.port")
			.description("SMTP server port (typically 25, 465, or 587)")
			.default(SettingValue::Int(587))
			.validator(|v| match v {
				SettingValue::Int(p) if (1..=65535).contains(p) => Ok(()),
				_ => Err(Error::ValidationError("Port must be between 1 and 65535".into())),
			})
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.username")
			.description("SMTP authentication username")
			.optional(true)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.password")
			.description("SMTP authentication password")
			.optional(true)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.tls_mode")
			.description("TLS mode: none, starttls, or tls")
			.default(SettingValue::String("starttls".into()))
			.validator(|v| match v {
				SettingValue::String(s) if matches!(s.as_str(), "none" | "starttls" | "tls") => Ok(()),
				_ => Err(Error::ValidationError("TLS mode must be none, starttls or tls".into())),
			})
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.smtp.timeout_seconds")
			.description("SMTP connection timeout in seconds")
			.default(SettingValue::Int(30))
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.from.address")
			.description("Sender address (e.g., noreply@example.com)")
			.optional(true)
			.build()?,
	)?;

	registry.register(
		SettingDefinition::builder("email.from.name")
			.description("Sender display name")
			.default(SettingValue::String("Panel".into()))
			.build()?,
	)?;

	Ok(())
}

// vim: ts=4
