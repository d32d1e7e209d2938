//! Uniqueness counts for the validation aggregator

use async_trait::async_trait;
use sqlx::SqliteConnection;

use crate::utils::*;
use panel_types::prelude::*;
use panel_types::validate::{EntityKind, UniqueCounter};

/// Count statement for each unique field. Field names never reach the SQL text.
fn count_sql(entity: EntityKind, field: &str) -> PnResult<&'static str> {
	match (entity, field) {
		(EntityKind::Account, "username") => Ok("SELECT count(*) FROM users
			WHERE username = ?1 AND (?2 IS NULL OR user_id <> CAST(?2 AS INTEGER))"),
		(EntityKind::Account, "email") => Ok("SELECT count(*) FROM users
			WHERE email = ?1 AND (?2 IS NULL OR user_id <> CAST(?2 AS INTEGER))"),
		(EntityKind::Location, "code") => Ok("SELECT count(*) FROM locations
			WHERE code = ?1 AND (?2 IS NULL OR location_id <> ?2)"),
		(EntityKind::Location, "name") => Ok("SELECT count(*) FROM locations
			WHERE name = ?1 AND (?2 IS NULL OR location_id <> ?2)"),
		_ => Err(Error::InternalValidation(format!("no unique field {}.{}", entity, field))),
	}
}

pub(crate) async fn count(
	conn: &mut SqliteConnection,
	entity: EntityKind,
	field: &str,
	value: &str,
	exclude_id: Option<&str>,
) -> PnResult<u64> {
	let sql = count_sql(entity, field)?;
	let count: i64 = sqlx::query_scalar(sql)
		.bind(value)
		.bind(exclude_id)
		.fetch_one(conn)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;
	Ok(u64::try_from(count).unwrap_or_default())
}

/// Counter bound to an open write transaction
pub(crate) struct TxCounter<'a>(pub &'a mut SqliteConnection);

#[async_trait]
impl UniqueCounter for TxCounter<'_> {
	async fn count_unique(
		&mut self,
		entity: EntityKind,
		field: &str,
		value: &str,
		exclude_id: Option<&str>,
	) -> PnResult<u64> {
		count(&mut *self.0, entity, field, value, exclude_id).await
	}
}

// vim: ts=4
