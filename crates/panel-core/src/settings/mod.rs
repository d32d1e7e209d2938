//! Settings subsystem types and service

pub mod service;
pub mod types;

pub use types::{
	FrozenSettingsRegistry, SettingDefinition, SettingDefinitionBuilder, SettingScope,
	SettingValue, SettingsRegistry,
};

// vim: ts=4
