//! App builder - constructs and runs the panel

use std::sync::Arc;

use crate::prelude::*;
use crate::routes;
use crate::settings::service::SettingsService;
use crate::settings::{SettingValue, SettingsRegistry};
pub use panel_core::app::{App, AppBuilderOpts, AppState, VERSION};
use panel_core::PermService;
use panel_types::notify::Notifier;
use panel_types::store_adapter::StoreAdapter;
use panel_types::worker;

const SETTINGS_CACHE_SIZE: usize = 1000;

pub struct AppBuilder {
	opts: AppBuilderOpts,
	worker: Option<Arc<worker::WorkerPool>>,
	store: Option<Arc<dyn StoreAdapter>>,
	notifier: Option<Arc<dyn Notifier>>,
}

impl AppBuilder {
	pub fn new() -> Self {
		// A second builder in the same process keeps the first subscriber
		let _ignore = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.try_init();
		AppBuilder { opts: AppBuilderOpts::default(), worker: None, store: None, notifier: None }
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}

	pub fn registration_enabled(&mut self, enabled: bool) -> &mut Self {
		self.opts.registration_enabled = Some(enabled);
		self
	}

	pub fn worker(&mut self, worker: Arc<worker::WorkerPool>) -> &mut Self {
		self.worker = Some(worker);
		self
	}

	// Adapters
	pub fn store(&mut self, store: Arc<dyn StoreAdapter>) -> &mut Self {
		self.store = Some(store);
		self
	}

	/// Replaces the email notifier
	pub fn notifier(&mut self, notifier: Arc<dyn Notifier>) -> &mut Self {
		self.notifier = Some(notifier);
		self
	}

	/// Wire settings, sessions and notifications into the shared state
	pub async fn build(&self) -> PnResult<App> {
		let Some(store) = self.store.clone() else {
			error!("FATAL: No store adapter configured");
			return Err(Error::Internal("No store adapter configured".to_string()));
		};
		let Some(worker) = self.worker.clone() else {
			error!("FATAL: No worker pool defined");
			return Err(Error::Internal("No worker pool defined".to_string()));
		};

		let mut settings_registry = SettingsRegistry::new();
		panel_auth::register_settings(&mut settings_registry)?;
		panel_email::register_settings(&mut settings_registry)?;
		info!("Registered {} settings", settings_registry.len());

		let settings = Arc::new(SettingsService::new(
			Arc::new(settings_registry.freeze()),
			store.clone(),
			SETTINGS_CACHE_SIZE,
		));
		settings.validate_required_settings().await?;

		if let Some(enabled) = self.opts.registration_enabled {
			settings.set("auth.registration_enabled", SettingValue::Bool(enabled)).await?;
		}
		info!("Settings subsystem initialized and validated");

		let notifier: Arc<dyn Notifier> = match &self.notifier {
			Some(notifier) => notifier.clone(),
			None => Arc::new(panel_email::EmailNotifier::new(settings.clone())?),
		};
		let sessions =
			Arc::new(panel_auth::JwtSessionIssuer::new(&*store, settings.clone(), worker.clone()).await?);

		Ok(Arc::new(AppState {
			opts: self.opts.clone(),
			worker,
			perms: PermService::new(store.clone()),
			store,
			notifier,
			sessions,
			settings,
		}))
	}

	pub async fn run(self) -> PnResult<()> {
		info!(" ____                  _");
		info!("|  _ \\ __ _ _ __   ___| |");
		info!("| |_) / _` | '_ \\ / _ \\ |");
		info!("|  __/ (_| | | | |  __/ |");
		info!("|_|   \\__,_|_| |_|\\___|_|");
		info!("V{}", VERSION);
		info!("");

		let app = self.build().await?;
		let router = routes::init(app.clone());

		let listener = tokio::net::TcpListener::bind(app.opts.listen.as_ref()).await?;
		info!("Listening on {}", app.opts.listen);
		axum::serve(listener, router).await?;

		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
