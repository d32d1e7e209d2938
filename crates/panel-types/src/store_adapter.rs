//! Adapter that persists accounts, scope grants, locations and settings.
//!
//! Save operations on entities with unique fields run the validation
//! aggregator inside the same write transaction as the insert, so the
//! uniqueness check and the write are atomic.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use uuid::Uuid;

use crate::prelude::*;
use crate::scope::{Scope, ScopeSet};
use crate::validate::{EntityKind, FieldRules, Rule, UniqueField, Validate};

pub const USERNAME_RULES: &[Rule] =
	&[Rule::Required, Rule::PrintableAscii, Rule::MinLen(5), Rule::MaxLen(100)];
pub const EMAIL_RULES: &[Rule] = &[Rule::Required, Rule::Email];
pub const PASSWORD_RULES: &[Rule] = &[Rule::Required];

// Accounts //
//**********//
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
	pub user_id: UserId,
	pub username: Box<str>,
	pub email: Box<str>,
	#[serde(skip)]
	pub password_hash: Box<str>,
	pub created_at: Timestamp,
}

impl Debug for Account {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Account")
			.field("user_id", &self.user_id)
			.field("username", &self.username)
			.field("email", &self.email)
			.field("created_at", &self.created_at)
			.finish_non_exhaustive()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountField {
	Username,
	Email,
}

#[derive(Debug)]
pub struct CreateAccountData<'a> {
	pub username: &'a str,
	pub email: &'a str,
	/// Already hashed
	pub password_hash: &'a str,
}

impl Validate for CreateAccountData<'_> {
	const ENTITY: EntityKind = EntityKind::Account;

	fn own_id(&self) -> Option<String> {
		None
	}

	fn field_rules(&self) -> Vec<FieldRules<'_>> {
		vec![
			FieldRules::new("username", self.username, USERNAME_RULES),
			FieldRules::new("email", self.email, EMAIL_RULES),
			FieldRules::new("password", self.password_hash, PASSWORD_RULES),
		]
	}

	fn unique_fields(&self) -> Vec<UniqueField<'_>> {
		vec![
			UniqueField { field: "username", value: self.username },
			UniqueField { field: "email", value: self.email },
		]
	}
}

// Grants //
//********//
/// Scopes a subject holds for one target. `target == None` is the global grant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeGrant {
	/// `None` until the grant has been persisted
	pub grant_id: Option<i64>,
	pub subject: UserId,
	pub target: Option<Box<str>>,
	pub scopes: ScopeSet,
}

impl ScopeGrant {
	/// In-memory grant with no scopes
	pub fn empty(subject: UserId, target: Option<&str>) -> Self {
		Self { grant_id: None, subject, target: target.map(Box::from), scopes: ScopeSet::new() }
	}

	pub fn is_global(&self) -> bool {
		self.target.is_none()
	}

	pub fn is_persisted(&self) -> bool {
		self.grant_id.is_some()
	}

	/// Direct membership, `admin` implies everything
	pub fn has(&self, scope: &Scope) -> bool {
		self.scopes.contains(scope) || self.scopes.contains(&Scope::ADMIN)
	}
}

// Locations //
//***********//
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
	pub location_id: Uuid,
	pub code: Box<str>,
	pub name: Box<str>,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

/// Create or update payload. The id is always known up front, so uniqueness
/// counts can always exclude it.
#[derive(Debug)]
pub struct LocationData<'a> {
	pub location_id: Uuid,
	pub code: &'a str,
	pub name: &'a str,
}

impl Validate for LocationData<'_> {
	const ENTITY: EntityKind = EntityKind::Location;

	fn own_id(&self) -> Option<String> {
		Some(self.location_id.to_string())
	}

	fn field_rules(&self) -> Vec<FieldRules<'_>> {
		let id = if self.location_id.is_nil() { String::new() } else { self.location_id.to_string() };
		vec![
			FieldRules::new("id", id, &[Rule::Required]),
			FieldRules::new("code", self.code, &[Rule::Required, Rule::MaxLen(100)]),
			FieldRules::new("name", self.name, &[Rule::Required, Rule::MaxLen(100)]),
		]
	}

	fn unique_fields(&self) -> Vec<UniqueField<'_>> {
		vec![
			UniqueField { field: "code", value: self.code },
			UniqueField { field: "name", value: self.name },
		]
	}
}

#[async_trait]
pub trait StoreAdapter: Debug + Send + Sync {
	// Accounts
	//**********

	/// Validate and insert an account atomically.
	/// Uniqueness failures return `Error::Conflict`, rule failures `Error::Validation`.
	async fn create_account(&self, data: &CreateAccountData<'_>) -> PnResult<Account>;
	async fn read_account(&self, user_id: UserId) -> PnResult<Account>;
	async fn read_account_by(&self, field: AccountField, value: &str) -> PnResult<Account>;
	/// Deletes the account together with all of its grants
	async fn delete_account(&self, user_id: UserId) -> PnResult<()>;

	/// Number of rows of `entity` whose `field` equals `value`, optionally
	/// excluding one row by id. Errors are store errors, never `NotFound`.
	async fn count(
		&self,
		entity: EntityKind,
		field: &str,
		value: &str,
		exclude_id: Option<&str>,
	) -> PnResult<u64>;

	// Grants
	//********
	async fn read_grant(&self, subject: UserId, target: Option<&str>) -> PnResult<ScopeGrant>;
	async fn read_grant_by_id(&self, grant_id: i64) -> PnResult<ScopeGrant>;
	async fn list_grants(&self, subject: UserId) -> PnResult<Vec<ScopeGrant>>;
	/// Insert a new grant. An existing (subject, target) pair returns `Error::Conflict`.
	async fn create_grant(
		&self,
		subject: UserId,
		target: Option<&str>,
		scopes: &ScopeSet,
	) -> PnResult<i64>;
	async fn update_grant_scopes(&self, grant_id: i64, scopes: &ScopeSet) -> PnResult<()>;
	/// Atomically add `scopes` to the (subject, target) grant, inserting it if missing
	async fn merge_grant_scopes(
		&self,
		subject: UserId,
		target: Option<&str>,
		scopes: &ScopeSet,
	) -> PnResult<ScopeGrant>;
	async fn delete_grant(&self, grant_id: i64) -> PnResult<()>;
	async fn delete_grants_for_target(&self, target: &str) -> PnResult<u64>;

	// Locations
	//***********
	async fn list_locations(&self) -> PnResult<Vec<Location>>;
	async fn read_location(&self, location_id: Uuid) -> PnResult<Location>;
	async fn read_location_by_code(&self, code: &str) -> PnResult<Location>;
	async fn create_location(&self, data: &LocationData<'_>) -> PnResult<Location>;
	async fn update_location(&self, data: &LocationData<'_>) -> PnResult<Location>;
	/// Deletes the location and every grant targeting it
	async fn delete_location(&self, location_id: Uuid) -> PnResult<()>;

	// Settings and internal variables
	//*********************************
	async fn read_setting(&self, key: &str) -> PnResult<Option<serde_json::Value>>;
	async fn update_setting(&self, key: &str, value: Option<serde_json::Value>) -> PnResult<()>;
	async fn read_var(&self, key: &str) -> PnResult<Box<str>>;
	async fn update_var(&self, key: &str, value: &str) -> PnResult<()>;
}


// vim: ts=4
