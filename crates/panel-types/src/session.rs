//! Session issuer interface

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;
use crate::store_adapter::Account;

/// An established session as handed back to the client
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
	pub token: Box<str>,
	pub expires_at: Timestamp,
}

/// Identity recovered from a session token
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
	pub user_id: UserId,
	pub username: Box<str>,
	pub expires_at: Timestamp,
}

#[async_trait]
pub trait SessionIssuer: Debug + Send + Sync {
	async fn create_session(&self, account: &Account) -> PnResult<Session>;

	/// Returns `Error::Unauthorized` for invalid or expired tokens
	async fn validate_session(&self, token: &str) -> PnResult<SessionClaims>;
}

// vim: ts=4
