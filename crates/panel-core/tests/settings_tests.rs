//! Settings service tests

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use panel_core::settings::service::SettingsService;
	use panel_core::settings::{SettingDefinition, SettingScope, SettingValue, SettingsRegistry};
	use panel_store_adapter_sqlite::StoreAdapterSqlite;
	use panel_types::prelude::*;
	use panel_types::store_adapter::StoreAdapter;
	use tempfile::TempDir;

	async fn create_test_service() -> (SettingsService, Arc<StoreAdapterSqlite>, TempDir) {
		let tmp_dir = TempDir::new().unwrap();
		let store = Arc::new(StoreAdapterSqlite::new(tmp_dir.path().join("panel.db")).await.unwrap());

		let mut registry = SettingsRegistry::new();
		registry
			.register(
				SettingDefinition::builder("auth.registration_enabled")
					.description("Allow self registration")
					.default(SettingValue::Bool(true))
					.build()
					.unwrap(),
			)
			.unwrap();
		registry
			.register(
				SettingDefinition::builder("auth.session_timeout")
					.description("Session lifetime in seconds")
					.default(SettingValue::Int(3600))
					.validator(|v| match v {
						SettingValue::Int(n) if *n > 0 => Ok(()),
						_ => Err(Error::ValidationError("must be positive".into())),
					})
					.build()
					.unwrap(),
			)
			.unwrap();
		registry
			.register(
				SettingDefinition::builder("server.version")
					.description("Build version")
					.scope(SettingScope::System)
					.default(SettingValue::String("0.3.0".into()))
					.build()
					.unwrap(),
			)
			.unwrap();
		registry
			.register(
				SettingDefinition::builder("email.smtp.host")
					.description("SMTP relay")
					.build()
					.unwrap(),
			)
			.unwrap();

		let service = SettingsService::new(Arc::new(registry.freeze()), store.clone(), 16);
		(service, store, tmp_dir)
	}

	#[tokio::test]
	async fn test_defaults_and_overrides() {
		let (settings, store, _tmp) = create_test_service().await;

		assert!(settings.get_bool("auth.registration_enabled").await.unwrap());

		settings.set("auth.registration_enabled", SettingValue::Bool(false)).await.unwrap();
		assert!(!settings.get_bool("auth.registration_enabled").await.unwrap());
		assert_eq!(
			store.read_setting("auth.registration_enabled").await.unwrap(),
			Some(serde_json::json!(false))
		);

		settings.delete("auth.registration_enabled").await.unwrap();
		assert!(settings.get_bool("auth.registration_enabled").await.unwrap());
	}

	#[tokio::test]
	async fn test_set_rejects_bad_values() {
		let (settings, _store, _tmp) = create_test_service().await;

		let res = settings.set("auth.session_timeout", SettingValue::Bool(true)).await;
		assert!(matches!(res, Err(Error::ValidationError(_))));

		let res = settings.set("auth.session_timeout", SettingValue::Int(-5)).await;
		assert!(matches!(res, Err(Error::ValidationError(_))));

		let res = settings.set("server.version", SettingValue::String("9".into())).await;
		assert!(matches!(res, Err(Error::PermissionDenied)));

		assert_eq!(settings.get_int("auth.session_timeout").await.unwrap(), 3600);
	}

	#[tokio::test]
	async fn test_required_settings() {
		let (settings, _store, _tmp) = create_test_service().await;

		assert!(matches!(settings.get("email.smtp.host").await, Err(Error::ConfigError(_))));
		assert!(settings.validate_required_settings().await.is_err());

		settings
			.set("email.smtp.host", SettingValue::String("smtp.example.com".into()))
			.await
			.unwrap();
		assert_eq!(settings.get_string("email.smtp.host").await.unwrap(), "smtp.example.com");
		assert!(settings.validate_required_settings().await.is_ok());
	}

	#[tokio::test]
	async fn test_unknown_setting() {
		let (settings, _store, _tmp) = create_test_service().await;
		assert!(settings.get("no.such.key").await.is_err());
	}
}

// vim: ts=4
