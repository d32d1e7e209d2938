use std::{env, path, sync::Arc};

use panel::AppBuilder;
use panel::error::PnResult;
use panel::worker::WorkerPool;
use panel_store_adapter_sqlite::StoreAdapterSqlite;

pub struct Config {
	pub listen: String,
	pub db_dir: path::PathBuf,
	pub registration_enabled: Option<bool>,
}

fn parse_bool(value: &str) -> Option<bool> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Some(true),
		"0" | "false" | "no" | "off" => Some(false),
		_ => None,
	}
}

#[tokio::main]
async fn main() -> PnResult<()> {
	let config = Config {
		listen: env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
		db_dir: path::PathBuf::from(env::var("DB_DIR").unwrap_or_else(|_| "./data".to_string())),
		registration_enabled: env::var("REGISTRATION_ENABLED").ok().as_deref().and_then(parse_bool),
	};

	let mut builder = AppBuilder::new();
	let store = Arc::new(StoreAdapterSqlite::new(config.db_dir.join("panel.db")).await?);
	builder.listen(config.listen).worker(Arc::new(WorkerPool::new(1, 2))).store(store);
	if let Some(enabled) = config.registration_enabled {
		builder.registration_enabled(enabled);
	}

	builder.run().await
}

// vim: ts=4
