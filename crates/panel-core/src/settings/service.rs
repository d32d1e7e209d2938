//! Settings service with caching and validation

use lru::LruCache;
use parking_lot::RwLock;
use std::num::NonZeroUsize;
use std::sync::Arc;

use panel_types::store_adapter::StoreAdapter;

use super::types::{FrozenSettingsRegistry, SettingScope, SettingValue};
use crate::prelude::*;

const DEFAULT_CACHE_SIZE: NonZeroUsize = NonZeroUsize::MIN.saturating_add(99);

/// LRU cache for resolved settings values
pub struct SettingsCache {
	cache: RwLock<LruCache<String, SettingValue>>,
}

impl SettingsCache {
	pub fn new(capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity).unwrap_or(DEFAULT_CACHE_SIZE);
		Self { cache: RwLock::new(LruCache::new(capacity)) }
	}

	pub fn get(&self, key: &str) -> Option<SettingValue> {
		self.cache.write().get(key).cloned()
	}

	pub fn put(&self, key: String, value: SettingValue) {
		self.cache.write().put(key, value);
	}

	pub fn invalidate(&self, key: &str) {
		self.cache.write().pop(key);
	}
}

pub struct SettingsService {
	registry: Arc<FrozenSettingsRegistry>,
	cache: SettingsCache,
	store: Arc<dyn StoreAdapter>,
}

impl SettingsService {
	pub fn new(
		registry: Arc<FrozenSettingsRegistry>,
		store: Arc<dyn StoreAdapter>,
		cache_size: usize,
	) -> Self {
		Self { registry, cache: SettingsCache::new(cache_size), store }
	}

	pub fn registry(&self) -> &FrozenSettingsRegistry {
		&self.registry
	}

	/// Resolve a setting: cache, stored value, then default
	pub async fn get(&self, key: &str) -> PnResult<SettingValue> {
		if let Some(value) = self.cache.get(key) {
			return Ok(value);
		}

		let def = self
			.registry
			.get(key)
			.ok_or_else(|| Error::ConfigError(format!("Unknown setting: {}", key)))?;

		if def.scope == SettingScope::Global
			&& let Some(json_value) = self.store.read_setting(key).await?
		{
			let value = serde_json::from_value::<SettingValue>(json_value)
				.map_err(|e| Error::ConfigError(format!("Invalid value for '{}': {}", key, e)))?;
			self.cache.put(key.to_string(), value.clone());
			return Ok(value);
		}

		match &def.default {
			Some(default) => {
				self.cache.put(key.to_string(), default.clone());
				Ok(default.clone())
			}
			None => Err(Error::ConfigError(format!(
				"Setting '{}' has no default and must be configured",
				key
			))),
		}
	}

	/// Store a new value after type and validator checks
	pub async fn set(&self, key: &str, value: SettingValue) -> PnResult<()> {
		let def = self
			.registry
			.get(key)
			.ok_or_else(|| Error::ValidationError(format!("Unknown setting: {}", key)))?;

		if def.scope == SettingScope::System {
			warn!("Refusing to change system setting '{}'", key);
			return Err(Error::PermissionDenied);
		}

		if let Some(default) = &def.default
			&& !value.matches_type(default)
		{
			return Err(Error::ValidationError(format!(
				"Type mismatch for setting '{}': expected {}, got {}",
				key,
				default.type_name(),
				value.type_name()
			)));
		}

		if let Some(validator) = &def.validator {
			validator(&value)?;
		}

		let json_value = serde_json::to_value(&value)?;
		self.store.update_setting(key, Some(json_value)).await?;
		self.cache.invalidate(key);

		info!("Setting '{}' updated", key);
		Ok(())
	}

	/// Drop the stored value, falling back to the default
	pub async fn delete(&self, key: &str) -> PnResult<()> {
		self.store.update_setting(key, None).await?;
		self.cache.invalidate(key);
		info!("Setting '{}' reset to default", key);
		Ok(())
	}

	/// Every required setting (no default, not optional) must be stored
	pub async fn validate_required_settings(&self) -> PnResult<()> {
		for def in self.registry.list() {
			if def.optional || def.default.is_some() {
				continue;
			}
			if self.store.read_setting(&def.key).await?.is_none() {
				return Err(Error::ConfigError(format!(
					"Required setting '{}' is not configured",
					def.key
				)));
			}
		}
		Ok(())
	}

	pub async fn get_string(&self, key: &str) -> PnResult<String> {
		match self.get(key).await? {
			SettingValue::String(s) => Ok(s),
			v => Err(Error::ConfigError(format!(
				"Setting '{}' is not a string, got {}",
				key,
				v.type_name()
			))),
		}
	}

	pub async fn get_int(&self, key: &str) -> PnResult<i64> {
		match self.get(key).await? {
			SettingValue::Int(i) => Ok(i),
			v => Err(Error::ConfigError(format!(
				"Setting '{}' is not an integer, got {}",
				key,
				v.type_name()
			))),
		}
	}

	pub async fn get_bool(&self, key: &str) -> PnResult<bool> {
		match self.get(key).await? {
			SettingValue::Bool(b) => Ok(b),
			v => Err(Error::ConfigError(format!(
				"Setting '{}' is not a boolean, got {}",
				key,
				v.type_name()
			))),
		}
	}
}

// vim: ts=4
