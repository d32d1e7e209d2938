//! SQLite store adapter.
//!
//! Accounts and locations are written inside `BEGIN IMMEDIATE` transactions
//! that run the validation aggregator before the insert, so two concurrent
//! registrations cannot both pass the uniqueness check. Unique indexes back
//! every rule; a violation that still reaches the driver becomes a conflict.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

mod account;
mod counter;
mod grant;
mod location;
mod schema;
mod setting;
mod utils;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use panel_types::prelude::*;
use panel_types::scope::ScopeSet;
use panel_types::store_adapter::{
	Account, AccountField, CreateAccountData, Location, LocationData, ScopeGrant, StoreAdapter,
};
use panel_types::validate::EntityKind;

use crate::utils::inspect;

#[derive(Debug)]
pub struct StoreAdapterSqlite {
	db: SqlitePool,
}

impl StoreAdapterSqlite {
	pub async fn new(path: impl AsRef<Path>) -> PnResult<Self> {
		let path = path.as_ref();
		if let Some(dir) = path.parent()
			&& !dir.as_os_str().is_empty()
		{
			tokio::fs::create_dir_all(dir).await?;
		}

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(path)
			.create_if_missing(true)
			.foreign_keys(true)
			.busy_timeout(Duration::from_secs(10))
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(inspect)
			.or(Err(Error::DbError))?;

		schema::init_db(&db).await.inspect_err(inspect).or(Err(Error::DbError))?;
		info!("Store opened: {}", path.display());

		Ok(Self { db })
	}
}

#[async_trait]
impl StoreAdapter for StoreAdapterSqlite {
	// Accounts
	//**********
	async fn create_account(&self, data: &CreateAccountData<'_>) -> PnResult<Account> {
		account::create_account(&self.db, data).await
	}

	async fn read_account(&self, user_id: UserId) -> PnResult<Account> {
		account::read_account(&self.db, user_id).await
	}

	async fn read_account_by(&self, field: AccountField, value: &str) -> PnResult<Account> {
		account::read_account_by(&self.db, field, value).await
	}

	async fn delete_account(&self, user_id: UserId) -> PnResult<()> {
		account::delete_account(&self.db, user_id).await
	}

	async fn count(
		&self,
		entity: EntityKind,
		field: &str,
		value: &str,
		exclude_id: Option<&str>,
	) -> PnResult<u64> {
		let mut conn = self.db.acquire().await.inspect_err(inspect).or(Err(Error::DbError))?;
		counter::count(&mut conn, entity, field, value, exclude_id).await
	}

	// Grants
	//********
	async fn read_grant(&self, subject: UserId, target: Option<&str>) -> PnResult<ScopeGrant> {
		grant::read_grant(&self.db, subject, target).await
	}

	async fn read_grant_by_id(&self, grant_id: i64) -> PnResult<ScopeGrant> {
		grant::read_grant_by_id(&self.db, grant_id).await
	}

	async fn list_grants(&self, subject: UserId) -> PnResult<Vec<ScopeGrant>> {
		grant::list_grants(&self.db, subject).await
	}

	async fn create_grant(
		&self,
		subject: UserId,
		target: Option<&str>,
		scopes: &ScopeSet,
	) -> PnResult<i64> {
		grant::create_grant(&self.db, subject, target, scopes).await
	}

	async fn update_grant_scopes(&self, grant_id: i64, scopes: &ScopeSet) -> PnResult<()> {
		grant::update_grant_scopes(&self.db, grant_id, scopes).await
	}

	async fn merge_grant_scopes(
		&self,
		subject: UserId,
		target: Option<&str>,
		scopes: &ScopeSet,
	) -> PnResult<ScopeGrant> {
		grant::merge_grant_scopes(&self.db, subject, target, scopes).await
	}

	async fn delete_grant(&self, grant_id: i64) -> PnResult<()> {
		grant::delete_grant(&self.db, grant_id).await
	}

	async fn delete_grants_for_target(&self, target: &str) -> PnResult<u64> {
		grant::delete_grants_for_target(&self.db, target).await
	}

	// Locations
	//***********
	async fn list_locations(&self) -> PnResult<Vec<Location>> {
		location::list_locations(&self.db).await
	}

	async fn read_location(&self, location_id: Uuid) -> PnResult<Location> {
		location::read_location(&self.db, location_id).await
	}

	async fn read_location_by_code(&self, code: &str) -> PnResult<Location> {
		location::read_location_by_code(&self.db, code).await
	}

	async fn create_location(&self, data: &LocationData<'_>) -> PnResult<Location> {
		location::create_location(&self.db, data).await
	}

	async fn update_location(&self, data: &LocationData<'_>) -> PnResult<Location> {
		location::update_location(&self.db, data).await
	}

	async fn delete_location(&self, location_id: Uuid) -> PnResult<()> {
		location::delete_location(&self.db, location_id).await
	}

	// Settings and internal variables
	//*********************************
	async fn read_setting(&self, key: &str) -> PnResult<Option<serde_json::Value>> {
		setting::read_setting(&self.db, key).await
	}

	async fn update_setting(&self, key: &str, value: Option<serde_json::Value>) -> PnResult<()> {
		setting::update_setting(&self.db, key, value).await
	}

	async fn read_var(&self, key: &str) -> PnResult<Box<str>> {
		setting::read_var(&self.db, key).await
	}

	async fn update_var(&self, key: &str, value: &str) -> PnResult<()> {
		setting::update_var(&self.db, key, value).await
	}
}

// vim: ts=4
