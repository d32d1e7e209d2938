//! Settings types and definitions
//!
//! Every runtime switch of the panel is a registered setting with a typed
//! default. Values changed at runtime are persisted through the store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::prelude::*;

pub type SettingValidator = Box<dyn Fn(&SettingValue) -> PnResult<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingScope {
	/// Fixed at startup, only the default applies
	#[serde(rename = "system")]
	System,
	/// Stored instance-wide, falls back to the default
	#[serde(rename = "global")]
	Global,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
	Bool(bool), // Must be before Int to avoid bool -> int coercion
	Int(i64),
	String(String),
	Json(serde_json::Value),
}

impl SettingValue {
	pub fn matches_type(&self, other: &SettingValue) -> bool {
		matches!(
			(self, other),
			(SettingValue::String(_), SettingValue::String(_))
				| (SettingValue::Int(_), SettingValue::Int(_))
				| (SettingValue::Bool(_), SettingValue::Bool(_))
				| (SettingValue::Json(_), SettingValue::Json(_))
		)
	}

	pub fn type_name(&self) -> &'static str {
		match self {
			SettingValue::String(_) => "string",
			SettingValue::Int(_) => "int",
			SettingValue::Bool(_) => "bool",
			SettingValue::Json(_) => "json",
		}
	}
}

pub struct SettingDefinition {
	/// Dot-separated key (e.g., "auth.registration_enabled")
	pub key: String,
	pub description: String,
	/// No default and not optional means the setting must be configured
	pub default: Option<SettingValue>,
	pub scope: SettingScope,
	pub optional: bool,
	pub validator: Option<SettingValidator>,
}

impl Debug for SettingDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingDefinition")
			.field("key", &self.key)
			.field("default", &self.default)
			.field("scope", &self.scope)
			.field("optional", &self.optional)
			.field("validator", &self.validator.is_some())
			.finish_non_exhaustive()
	}
}

impl SettingDefinition {
	pub fn builder(key: impl Into<String>) -> SettingDefinitionBuilder {
		SettingDefinitionBuilder::new(key)
	}
}

pub struct SettingDefinitionBuilder {
	key: String,
	description: Option<String>,
	default: Option<SettingValue>,
	scope: SettingScope,
	optional: bool,
	validator: Option<SettingValidator>,
}

impl SettingDefinitionBuilder {
	pub fn new(key: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			description: None,
			default: None,
			scope: SettingScope::Global,
			optional: false,
			validator: None,
		}
	}

	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn default(mut self, value: SettingValue) -> Self {
		self.default = Some(value);
		self
	}

	pub fn scope(mut self, scope: SettingScope) -> Self {
		self.scope = scope;
		self
	}

	pub fn optional(mut self, optional: bool) -> Self {
		self.optional = optional;
		self
	}

	pub fn validator<F>(mut self, f: F) -> Self
	where
		F: Fn(&SettingValue) -> PnResult<()> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(f));
		self
	}

	pub fn build(self) -> PnResult<SettingDefinition> {
		let description = self
			.description
			.ok_or_else(|| Error::ConfigError("Setting description is required".into()))?;

		if self.scope == SettingScope::System && self.default.is_none() {
			return Err(Error::ConfigError(format!(
				"System setting '{}' must have a default",
				self.key
			)));
		}
		if let (Some(default), Some(validator)) = (&self.default, &self.validator) {
			validator(default).map_err(|e| {
				Error::ConfigError(format!("Default of '{}' fails validation: {}", self.key, e))
			})?;
		}

		Ok(SettingDefinition {
			key: self.key,
			description,
			default: self.default,
			scope: self.scope,
			optional: self.optional,
			validator: self.validator,
		})
	}
}

/// Mutable registry used during app initialization
#[derive(Default)]
pub struct SettingsRegistry {
	definitions: HashMap<String, SettingDefinition>,
}

impl SettingsRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, def: SettingDefinition) -> PnResult<()> {
		if self.definitions.contains_key(&def.key) {
			return Err(Error::ConfigError(format!("Setting '{}' is already registered", def.key)));
		}

		debug!("Registering setting: {}", def.key);
		self.definitions.insert(def.key.clone(), def);
		Ok(())
	}

	pub fn freeze(self) -> FrozenSettingsRegistry {
		info!("Freezing settings registry with {} definitions", self.definitions.len());
		FrozenSettingsRegistry { definitions: self.definitions }
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

/// Immutable registry stored in AppState
pub struct FrozenSettingsRegistry {
	definitions: HashMap<String, SettingDefinition>,
}

impl FrozenSettingsRegistry {
	pub fn get(&self, key: &str) -> Option<&SettingDefinition> {
		self.definitions.get(key)
	}

	pub fn list(&self) -> impl Iterator<Item = &SettingDefinition> {
		self.definitions.values()
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_untagged_value_roundtrip() {
		let v: SettingValue = serde_json::from_str("true").unwrap();
		assert_eq!(v, SettingValue::Bool(true));
		let v: SettingValue = serde_json::from_str("42").unwrap();
		assert_eq!(v, SettingValue::Int(42));
		let v: SettingValue = serde_json::from_str("\"smtp.example.com\"").unwrap();
		assert_eq!(v, SettingValue::String("smtp.example.com".into()));
	}

	#[test]
	fn test_builder_requires_description() {
		let res = SettingDefinition::builder("auth.x").default(SettingValue::Bool(true)).build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_system_setting_needs_default() {
		let res = SettingDefinition::builder("server.x")
			.description("x")
			.scope(SettingScope::System)
			.build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_default_must_pass_validator() {
		let res = SettingDefinition::builder("auth.session_timeout")
			.description("Session lifetime")
			.default(SettingValue::Int(0))
			.validator(|v| match v {
				SettingValue::Int(n) if *n > 0 => Ok(()),
				_ => Err(Error::ValidationError("must be positive".into())),
			})
			.build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}

	#[test]
	fn test_duplicate_registration() {
		let mut registry = SettingsRegistry::new();
		let def = || {
			SettingDefinition::builder("auth.registration_enabled")
				.description("Allow self registration")
				.default(SettingValue::Bool(true))
				.build()
				.unwrap()
		};
		registry.register(def()).unwrap();
		assert!(registry.register(def()).is_err());
		assert_eq!(registry.freeze().len(), 1);
	}
}

// vim: ts=4
