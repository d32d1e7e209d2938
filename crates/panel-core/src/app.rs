//! App state type

use std::sync::Arc;

use panel_types::notify::Notifier;
use panel_types::session::SessionIssuer;
use panel_types::store_adapter::StoreAdapter;
use panel_types::worker;

use crate::perm::PermService;
use crate::settings::service::SettingsService;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct AppState {
	pub opts: AppBuilderOpts,
	pub worker: Arc<worker::WorkerPool>,

	pub store: Arc<dyn StoreAdapter>,
	pub perms: PermService,
	pub notifier: Arc<dyn Notifier>,
	pub sessions: Arc<dyn SessionIssuer>,

	// Settings subsystem
	pub settings: Arc<SettingsService>,
}

pub type App = Arc<AppState>;

#[derive(Debug, Clone)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	/// Overrides the stored `auth.registration_enabled` setting when set
	pub registration_enabled: Option<bool>,
}

impl Default for AppBuilderOpts {
	fn default() -> Self {
		Self { listen: "127.0.0.1:8080".into(), registration_enabled: None }
	}
}

// vim: ts=4
