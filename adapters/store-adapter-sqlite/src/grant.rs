//! Scope grant storage

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::utils::*;
use panel_types::prelude::*;
use panel_types::scope::ScopeSet;
use panel_types::store_adapter::ScopeGrant;

const SELECT_GRANT: &str = "SELECT grant_id, user_id, target, scopes FROM grants";

fn row_to_grant(row: &SqliteRow) -> Result<ScopeGrant, sqlx::Error> {
	let scopes: &str = row.try_get("scopes")?;
	Ok(ScopeGrant {
		grant_id: Some(row.try_get("grant_id")?),
		subject: UserId(row.try_get("user_id")?),
		target: row.try_get("target")?,
		scopes: serde_json::from_str(scopes).map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
	})
}

/// Scopes are stored as a JSON array of opaque strings
fn encode_scopes(scopes: &ScopeSet) -> PnResult<String> {
	Ok(serde_json::to_string(scopes)?)
}

/// An empty target would collide with the global grant in the unique index
fn check_target(target: Option<&str>) -> PnResult<()> {
	match target {
		Some(t) if t.trim().is_empty() => {
			Err(Error::ValidationError("grant target must not be empty".into()))
		}
		_ => Ok(()),
	}
}

pub(crate) async fn read_grant(
	db: &SqlitePool,
	subject: UserId,
	target: Option<&str>,
) -> PnResult<ScopeGrant> {
	let res = sqlx::query(&format!(
		"{} WHERE user_id = ?1 AND ifnull(target, '') = ifnull(?2, '')",
		SELECT_GRANT
	))
	.bind(subject.0)
	.bind(target)
	.fetch_one(db)
	.await;

	map_res(res, row_to_grant)
}

pub(crate) async fn read_grant_by_id(db: &SqlitePool, grant_id: i64) -> PnResult<ScopeGrant> {
	let res = sqlx::query(&format!("{} WHERE grant_id = ?1", SELECT_GRANT))
		.bind(grant_id)
		.fetch_one(db)
		.await;

	map_res(res, row_to_grant)
}

pub(crate) async fn list_grants(db: &SqlitePool, subject: UserId) -> PnResult<Vec<ScopeGrant>> {
	let rows = sqlx::query(&format!(
		"{} WHERE user_id = ?1 ORDER BY target IS NOT NULL, target",
		SELECT_GRANT
	))
	.bind(subject.0)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	collect_res(rows.iter().map(row_to_grant))
}

/// Single constrained insert; an existing (subject, target) pair is a conflict
pub(crate) async fn create_grant(
	db: &SqlitePool,
	subject: UserId,
	target: Option<&str>,
	scopes: &ScopeSet,
) -> PnResult<i64> {
	check_target(target)?;
	let grant_id: i64 = sqlx::query_scalar(
		"INSERT INTO grants (user_id, target, scopes) VALUES (?1, ?2, ?3) RETURNING grant_id",
	)
	.bind(subject.0)
	.bind(target)
	.bind(encode_scopes(scopes)?)
	.fetch_one(db)
	.await
	.map_err(map_write_err)?;

	debug!("Grant {} created for {} on {:?}", grant_id, subject, target);
	Ok(grant_id)
}

pub(crate) async fn update_grant_scopes(
	db: &SqlitePool,
	grant_id: i64,
	scopes: &ScopeSet,
) -> PnResult<()> {
	let res = sqlx::query(
		"UPDATE grants SET scopes = ?2, updated_at = unixepoch() WHERE grant_id = ?1",
	)
	.bind(grant_id)
	.bind(encode_scopes(scopes)?)
	.execute(db)
	.await
	.inspect_err(inspect)
	.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

/// Union `scopes` into the (subject, target) grant, creating it when missing.
///
/// Read and write share one `BEGIN IMMEDIATE` transaction, so concurrent
/// merges into the same grant never drop each other's scopes.
pub(crate) async fn merge_grant_scopes(
	db: &SqlitePool,
	subject: UserId,
	target: Option<&str>,
	scopes: &ScopeSet,
) -> PnResult<ScopeGrant> {
	check_target(target)?;
	let mut tx =
		db.begin_with("BEGIN IMMEDIATE").await.inspect_err(inspect).or(Err(Error::DbError))?;

	let res = sqlx::query(&format!(
		"{} WHERE user_id = ?1 AND ifnull(target, '') = ifnull(?2, '')",
		SELECT_GRANT
	))
	.bind(subject.0)
	.bind(target)
	.fetch_one(&mut *tx)
	.await;

	let grant = match map_res(res, row_to_grant) {
		Ok(mut grant) => {
			grant.scopes.extend(scopes.iter().cloned());
			sqlx::query(
				"UPDATE grants SET scopes = ?2, updated_at = unixepoch() WHERE grant_id = ?1",
			)
			.bind(grant.grant_id)
			.bind(encode_scopes(&grant.scopes)?)
			.execute(&mut *tx)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;
			grant
		}
		Err(Error::NotFound) => {
			let grant_id: i64 = sqlx::query_scalar(
				"INSERT INTO grants (user_id, target, scopes) VALUES (?1, ?2, ?3)
				RETURNING grant_id",
			)
			.bind(subject.0)
			.bind(target)
			.bind(encode_scopes(scopes)?)
			.fetch_one(&mut *tx)
			.await
			.map_err(map_write_err)?;
			ScopeGrant {
				grant_id: Some(grant_id),
				subject,
				target: target.map(Box::from),
				scopes: scopes.clone(),
			}
		}
		Err(err) => return Err(err),
	};

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
	Ok(grant)
}

pub(crate) async fn delete_grant(db: &SqlitePool, grant_id: i64) -> PnResult<()> {
	let res = sqlx::query("DELETE FROM grants WHERE grant_id = ?1")
		.bind(grant_id)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	Ok(())
}

pub(crate) async fn delete_grants_for_target(db: &SqlitePool, target: &str) -> PnResult<u64> {
	let res = sqlx::query("DELETE FROM grants WHERE target = ?1")
		.bind(target)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	Ok(res.rows_affected())
}

// vim: ts=4
