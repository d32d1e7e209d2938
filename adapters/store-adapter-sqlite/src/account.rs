//! Account management

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use crate::counter::TxCounter;
use crate::utils::*;
use panel_types::prelude::*;
use panel_types::store_adapter::{Account, AccountField, CreateAccountData};
use panel_types::validate::validate_entity;

fn row_to_account(row: &SqliteRow) -> Result<Account, sqlx::Error> {
	Ok(Account {
		user_id: UserId(row.try_get("user_id")?),
		username: row.try_get("username")?,
		email: row.try_get("email")?,
		password_hash: row.try_get("password")?,
		created_at: Timestamp(row.try_get("created_at")?),
	})
}

/// Validate and insert in one immediate transaction
pub(crate) async fn create_account(
	db: &SqlitePool,
	data: &CreateAccountData<'_>,
) -> PnResult<Account> {
	let mut tx =
		db.begin_with("BEGIN IMMEDIATE").await.inspect_err(inspect).or(Err(Error::DbError))?;

	let report = validate_entity(&mut TxCounter(&mut *tx), data).await?;
	report.into_result()?;

	let res = sqlx::query(
		"INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3)
		RETURNING user_id, username, email, password, created_at",
	)
	.bind(data.username)
	.bind(data.email)
	.bind(data.password_hash)
	.fetch_one(&mut *tx)
	.await
	.map_err(map_write_err)?;
	let account = row_to_account(&res).inspect_err(inspect).or(Err(Error::DbError))?;

	tx.commit().await.inspect_err(inspect).or(Err(Error::DbError))?;
	info!("Account created: {} ({})", account.username, account.user_id);
	Ok(account)
}

pub(crate) async fn read_account(db: &SqlitePool, user_id: UserId) -> PnResult<Account> {
	let res = sqlx::query(
		"SELECT user_id, username, email, password, created_at FROM users WHERE user_id = ?1",
	)
	.bind(user_id.0)
	.fetch_one(db)
	.await;

	map_res(res, row_to_account)
}

pub(crate) async fn read_account_by(
	db: &SqlitePool,
	field: AccountField,
	value: &str,
) -> PnResult<Account> {
	let sql = match field {
		AccountField::Username => {
			"SELECT user_id, username, email, password, created_at FROM users WHERE username = ?1"
		}
		AccountField::Email => {
			"SELECT user_id, username, email, password, created_at FROM users WHERE email = ?1"
		}
	};
	let res = sqlx::query(sql).bind(value).fetch_one(db).await;

	map_res(res, row_to_account)
}

/// Grants go with the account through the foreign key cascade
pub(crate) async fn delete_account(db: &SqlitePool, user_id: UserId) -> PnResult<()> {
	let res = sqlx::query("DELETE FROM users WHERE user_id = ?1")
		.bind(user_id.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.or(Err(Error::DbError))?;

	if res.rows_affected() == 0 {
		return Err(Error::NotFound);
	}
	info!("Account deleted: {}", user_id);
	Ok(())
}

// vim: ts=4
