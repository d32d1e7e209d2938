//! Location management

use sqlx::{Row, SqliteConnection, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use crate::counter::TxCounter;
use crate::utils::*;
use panel_types::prelude::*;
use panel_types::store_adapter::{Location, LocationData};
use panel_types::validate::validate_entity;

const SELECT_LOCATION: &str =
	"SELECT location_id, code, name, created_at, updated_at FROM locations";

fn row_to_location(row: &SqliteRow) -> Result<Location, sqlx::Error> {
	let location_id: &str = row.try_get("location_id")?;
	Ok(Location {
		location_id: parse_uuid(location_id)?,
		code: row.try_get("code")?,
		name: row.try_get("name")?,
		created_at: Timestamp(row.try_get("created_at")?),
		updated_at: Timestamp(row.try_get("updated_at")?),
	})
}

async fn fetch_location(conn: &mut SqliteConnection, location_id: Uuid) -> PnResult<Location> {
	let res = sqlx::query(&format!("{} WHERE location_id = ?1", SELECT_LOCATION))
		.bind(location_id.to_string())
		.fetch_one(conn)
		.await;

	map_res(res, row_to_location)
}

pub(crate) async fn list_locations(db: &SqlitePool) -> PnResult<Vec<Location>> {
	let rows = sqlx::query(&format!("{} ORDER BY code", SELECT_LOCATION))
		.fetch_all(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	collect_res(rows.iter().map(row_to_location))
}

pub(crate) async fn read_location(db: &SqlitePool, location_id: Uuid) -> PnResult<Location> {
	let mut conn = db.acquire().await.inspect_err(inspect).or(Err(Error::DbError))?;
	fetch_location(&mut conn, location_id).await
}

pub(crate) async fn read_location_by_code(db: &SqlitePool, code: &str) -> PnResult<Location> {
	let res = sqlx::query(&format!("{} WHERE code = ?1", SELECT_LOCATION))
		.bind(code)
		.fetch_one(db)
		.await;

	map_res(res, row_to_location)
}

pub(crate) async fn create_location(
	db: &SqlitePool,
	data: &LocationData<'_>,
) -> PnResult<Location> {
	let mut tx =
		db.begin_with("BEGIN IMMEDIATE").await.inspect_err(inspect).or(Err(Error::DbError))?;

	let report = validate_entity(&mut TxCounter(&mut *tx), data).await?;
	report.into_result()?;

	sqlx::query("INSERT INTO locations (location_id, code, name) VALUES (?1, ?2, ?3)")
		.bind(data.location_id.to_string())
		.bind(data.code)
		.bind(data.name)
		.execute(&mut *tx)
		.await
		.map_err(map_write_err)?;
	let location = fetch_location(&mut tx, data.location_id).await?;

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
	info!("Location created: {} ({})", location.code, location.location_id);
	Ok(location)
}

/// Uniqueness checks exclude the location being updated
pub(crate) async fn update_location(
	db: &SqlitePool,
	data: &LocationData<'_>,
) -> PnResult<Location> {
	let mut tx =
		db.begin_with("BEGIN IMMEDIATE").await.inspect_err(inspect).or(Err(Error::DbError))?;

	let report = validate_entity(&mut TxCounter(&mut *tx), data).await?;
	report.into_result()?;

	let res = sqlx::query(
		"UPDATE locations SET code = ?2, name = ?3, updated_at = unixepoch()
		WHERE location_id = ?1",
	)
	.bind(data.location_id.to_string())
	.bind(data.code)
	.bind(data.name)
	.execute(&mut *tx)
	.await
	.map_err(map_write_err)?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	let location = fetch_location(&mut tx, data.location_id).await?;

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
	Ok(location)
}

/// Removes the location and every grant targeting it
pub(crate) async fn delete_location(db: &SqlitePool, location_id: Uuid) -> PnResult<()> {
	let mut tx = db.begin().await.inspect_err(inspect).or(Err(Error::DbError))?;
	let target = location_id.to_string();

	let revoked = sqlx::query("DELETE FROM grants WHERE target = ?1")
		.bind(&target)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?
		.rows_affected();

	let res = sqlx::query("DELETE FROM locations WHERE location_id = ?1")
		.bind(&target)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;
	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
	info!("Location deleted: {} ({} grants revoked)", location_id, revoked);
	Ok(())
}

// vim: ts=4
