//! Settings (JSON values) and internal variables

use sqlx::{Row, SqlitePool};

use crate::utils::*;
use panel_types::prelude::*;

pub(crate) async fn read_setting(
	db: &SqlitePool,
	key: &str,
) -> PnResult<Option<serde_json::Value>> {
	let row = sqlx::query("SELECT value FROM settings WHERE key = ?1")
		.bind(key)
		.fetch_optional(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	let Some(row) = row else {
		return Ok(None);
	};
	let value: &str = row.try_get("value").inspect_err(inspect).or(Err(Error::DbError))?;
	match serde_json::from_str(value) {
		Ok(value) => Ok(Some(value)),
		Err(err) => {
			warn!("Ignoring unparsable setting '{}': {}", key, err);
			Ok(None)
		}
	}
}

/// `None` removes the stored value
pub(crate) async fn update_setting(
	db: &SqlitePool,
	key: &str,
	value: Option<serde_json::Value>,
) -> PnResult<()> {
	if let Some(value) = value {
		sqlx::query(
			"INSERT INTO settings (key, value) VALUES (?1, ?2)
			ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = unixepoch()",
		)
		.bind(key)
		.bind(value.to_string())
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;
	} else {
		sqlx::query("DELETE FROM settings WHERE key = ?1")
			.bind(key)
			.execute(db)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;
	}
	Ok(())
}

pub(crate) async fn read_var(db: &SqlitePool, key: &str) -> PnResult<Box<str>> {
	let res = sqlx::query("SELECT value FROM vars WHERE key = ?1").bind(key).fetch_one(db).await;

	map_res(res, |row| row.try_get("value"))
}

pub(crate) async fn update_var(db: &SqlitePool, key: &str, value: &str) -> PnResult<()> {
	sqlx::query(
		"INSERT OR REPLACE INTO vars (key, value, updated_at) VALUES (?1, ?2, unixepoch())",
	)
	.bind(key)
	.bind(value)
	.execute(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;
	Ok(())
}

// vim: ts=4
