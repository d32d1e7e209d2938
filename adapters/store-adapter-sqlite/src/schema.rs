//! Database schema initialization and migrations

use sqlx::{Sqlite, SqlitePool, Transaction};

use panel_types::prelude::*;

/// Get the current database version from vars table
async fn get_db_version(tx: &mut Transaction<'_, Sqlite>) -> i64 {
	sqlx::query_scalar::<_, String>("SELECT value FROM vars WHERE key = 'db_version'")
		.fetch_optional(&mut **tx)
		.await
		.ok()
		.flatten()
		.and_then(|v| v.parse().ok())
		.unwrap_or(0)
}

/// Set the database version in vars table
async fn set_db_version(tx: &mut Transaction<'_, Sqlite>, version: i64) -> Result<(), sqlx::Error> {
	sqlx::query("INSERT OR REPLACE INTO vars (key, value) VALUES ('db_version', ?)")
		.bind(version.to_string())
		.execute(&mut **tx)
		.await?;
	Ok(())
}

// Current schema version - update this when adding new migrations
const CURRENT_DB_VERSION: i64 = 1;

/// Initialize the database schema and run migrations
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS vars (
		key text NOT NULL,
		value text NOT NULL,
		created_at INTEGER DEFAULT (unixepoch()),
		updated_at INTEGER DEFAULT (unixepoch()),
		PRIMARY KEY(key)
	)",
	)
	.execute(&mut *tx)
	.await?;

	let version = get_db_version(&mut tx).await;

	// Settings (JSON values)
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS settings (
			key text NOT NULL,
			value text NOT NULL,
			updated_at INTEGER DEFAULT (unixepoch()),
			PRIMARY KEY(key)
		)",
	)
	.execute(&mut *tx)
	.await?;

	// Accounts
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS users (
			user_id integer PRIMARY KEY AUTOINCREMENT,
			username text NOT NULL,
			email text NOT NULL COLLATE NOCASE,
			password text NOT NULL,
			created_at INTEGER DEFAULT (unixepoch()),
			updated_at INTEGER DEFAULT (unixepoch())
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_username ON users (username)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users (email)")
		.execute(&mut *tx)
		.await?;

	// Scope grants, one row per (subject, target). A NULL target is the global grant.
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS grants (
			grant_id integer PRIMARY KEY AUTOINCREMENT,
			user_id integer NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
			target text,
			scopes text NOT NULL DEFAULT '[]',
			created_at INTEGER DEFAULT (unixepoch()),
			updated_at INTEGER DEFAULT (unixepoch())
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE UNIQUE INDEX IF NOT EXISTS idx_grants_subject_target
			ON grants (user_id, ifnull(target, ''))",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_grants_target ON grants (target)")
		.execute(&mut *tx)
		.await?;

	// Locations
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS locations (
			location_id text NOT NULL,
			code text NOT NULL,
			name text NOT NULL,
			created_at INTEGER DEFAULT (unixepoch()),
			updated_at INTEGER DEFAULT (unixepoch()),
			PRIMARY KEY(location_id)
		)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_locations_code ON locations (code)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_locations_name ON locations (name)")
		.execute(&mut *tx)
		.await?;

	if version < CURRENT_DB_VERSION {
		info!("Store schema initialized (version {} -> {})", version, CURRENT_DB_VERSION);
		set_db_version(&mut tx, CURRENT_DB_VERSION).await?;
	}

	tx.commit().await?;
	Ok(())
}

// vim: ts=4
