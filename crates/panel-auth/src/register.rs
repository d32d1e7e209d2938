//! Account provisioning
//!
//! `Received → Validated → AccountCreated → GrantAssigned → Notified → SessionEstablished`
//!
//! Everything up to `AccountCreated` rolls back on failure. If the default
//! grant cannot be assigned the fresh account is deleted again and the
//! request fails with `Error::PartialProvisioning`. An account whose delete
//! also failed has no `login` scope, so the login path refuses it.

use axum::{
	Json,
	body::Bytes,
	extract::State,
	http::{StatusCode, header},
	response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use panel_core::PermService;
use panel_core::extract::SESSION_COOKIE;
use panel_core::settings::service::SettingsService;
use panel_types::notify::{Notifier, TEMPLATE_ACCOUNT_CREATION};
use panel_types::scope::{Scope, ScopeSet};
use panel_types::session::{Session, SessionIssuer};
use panel_types::store_adapter::{
	Account, CreateAccountData, EMAIL_RULES, PASSWORD_RULES, ScopeGrant, StoreAdapter,
	USERNAME_RULES,
};
use panel_types::types::ApiResponse;
use panel_types::validate::{FieldRules, check_structure};
use panel_types::worker::WorkerPool;

use crate::crypto;
use crate::prelude::*;

const DEFAULT_NOTIFY_TIMEOUT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
	Received,
	Validated,
	AccountCreated,
	GrantAssigned,
	Notified,
	SessionEstablished,
}

#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
	#[serde(default)]
	pub username: String,
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RegisterRequest")
			.field("username", &self.username)
			.field("email", &self.email)
			.finish_non_exhaustive()
	}
}

impl RegisterRequest {
	/// Structural checks on the raw input, every field reported
	pub fn validate(&self) -> PnResult<()> {
		check_structure(&[
			FieldRules::new("username", self.username.as_str(), USERNAME_RULES),
			FieldRules::new("email", self.email.as_str(), EMAIL_RULES),
			FieldRules::new("password", self.password.as_str(), PASSWORD_RULES),
		])?
		.into_result()
	}
}

#[derive(Debug)]
pub struct Provisioned {
	pub account: Account,
	pub grant: ScopeGrant,
	pub session: Session,
	/// Resolves once the notification was sent, failed or timed out
	pub notification: JoinHandle<()>,
}

pub struct Provisioner {
	store: Arc<dyn StoreAdapter>,
	perms: PermService,
	notifier: Arc<dyn Notifier>,
	sessions: Arc<dyn SessionIssuer>,
	settings: Arc<SettingsService>,
	worker: Arc<WorkerPool>,
}

impl Provisioner {
	pub fn new(
		store: Arc<dyn StoreAdapter>,
		notifier: Arc<dyn Notifier>,
		sessions: Arc<dyn SessionIssuer>,
		settings: Arc<SettingsService>,
		worker: Arc<WorkerPool>,
	) -> Self {
		let perms = PermService::new(store.clone());
		Self { store, perms, notifier, sessions, settings, worker }
	}

	pub fn from_app(app: &App) -> Self {
		Self {
			store: app.store.clone(),
			perms: app.perms.clone(),
			notifier: app.notifier.clone(),
			sessions: app.sessions.clone(),
			settings: app.settings.clone(),
			worker: app.worker.clone(),
		}
	}

	/// Minimal scope set of a new account
	pub fn default_scopes() -> ScopeSet {
		[Scope::LOGIN].into_iter().collect()
	}

	pub async fn provision(&self, req: RegisterRequest) -> PnResult<Provisioned> {
		let mut state = ProvisionState::Received;

		req.validate()?;
		advance(&mut state, ProvisionState::Validated, &req.username);

		let password_hash = crypto::generate_password_hash(&self.worker, req.password.into()).await?;
		let account = self
			.store
			.create_account(&CreateAccountData {
				username: &req.username,
				email: &req.email,
				password_hash: &password_hash,
			})
			.await?;
		advance(&mut state, ProvisionState::AccountCreated, &req.username);

		let grant = match self.assign_default_grant(&account).await {
			Ok(grant) => grant,
			Err(err) => {
				error!("Grant assignment failed for {}: {}", account.username, err);
				self.discard_account(&account).await;
				return Err(Error::PartialProvisioning);
			}
		};
		advance(&mut state, ProvisionState::GrantAssigned, &req.username);

		let notification = self.notify(&account).await;
		advance(&mut state, ProvisionState::Notified, &req.username);

		let session = self.sessions.create_session(&account).await?;
		advance(&mut state, ProvisionState::SessionEstablished, &req.username);

		info!("Account provisioned: {} ({})", account.username, account.user_id);
		Ok(Provisioned { account, grant, session, notification })
	}

	async fn assign_default_grant(&self, account: &Account) -> PnResult<ScopeGrant> {
		let mut grant = self.perms.get_or_create(account.user_id, None).await?;
		self.perms.set_scopes(&mut grant, Self::default_scopes()).await?;
		Ok(grant)
	}

	async fn discard_account(&self, account: &Account) {
		match self.store.delete_account(account.user_id).await {
			Ok(()) => warn!("Discarded ungranted account {}", account.username),
			Err(err) => error!(
				"Could not discard account {} ({}), it stays without login scope",
				account.username, err
			),
		}
	}

	/// Fire-and-forget, bounded by `auth.notify_timeout`
	async fn notify(&self, account: &Account) -> JoinHandle<()> {
		let secs = match self.settings.get_int("auth.notify_timeout").await {
			Ok(secs) => u64::try_from(secs).unwrap_or(DEFAULT_NOTIFY_TIMEOUT),
			Err(err) => {
				warn!("Falling back to default notify timeout: {}", err);
				DEFAULT_NOTIFY_TIMEOUT
			}
		};

		let notifier = self.notifier.clone();
		let recipient = account.email.to_string();
		let data = serde_json::json!({
			"username": account.username,
			"email": account.email,
		});

		tokio::spawn(async move {
			let send =
				notifier.send_notification(&recipient, TEMPLATE_ACCOUNT_CREATION, data, true);
			match tokio::time::timeout(Duration::from_secs(secs), send).await {
				Ok(Ok(())) => debug!("Account creation notice sent to {}", recipient),
				Ok(Err(err)) => warn!("Account creation notice to {} failed: {}", recipient, err),
				Err(_) => warn!("Account creation notice to {} timed out", recipient),
			}
		})
	}
}

fn advance(state: &mut ProvisionState, next: ProvisionState, username: &str) {
	debug!("Provisioning {}: {:?} -> {:?}", username, state, next);
	*state = next;
}

/// `Set-Cookie` value carrying the session token
pub fn session_cookie(session: &Session) -> String {
	let max_age = (session.expires_at.0 - Timestamp::now().0).max(0);
	format!(
		"{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
		SESSION_COOKIE, session.token, max_age
	)
}

/// # POST /api/auth/register
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRes {
	pub user_id: UserId,
	pub username: Box<str>,
	pub session: Session,
	pub scopes: ScopeSet,
}

pub async fn post_register(State(app): State<App>, body: Bytes) -> PnResult<impl IntoResponse> {
	if !app.settings.get_bool("auth.registration_enabled").await? {
		debug!("Registration attempt while registration is disabled");
		return Err(Error::NotFound);
	}

	let req: RegisterRequest = serde_json::from_slice(&body)?;
	let provisioned = Provisioner::from_app(&app).provision(req).await?;

	let cookie = session_cookie(&provisioned.session);
	let res = RegisterRes {
		user_id: provisioned.account.user_id,
		username: provisioned.account.username,
		session: provisioned.session,
		scopes: provisioned.grant.scopes,
	};
	Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(ApiResponse::new(res))))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
		RegisterRequest {
			username: username.into(),
			email: email.into(),
			password: password.into(),
		}
	}

	#[test]
	fn test_valid_request() {
		assert!(request("alice123", "alice@example.com", "hunter22").validate().is_ok());
	}

	#[test]
	fn test_whitespace_is_accepted_input() {
		assert!(request("alice123", "alice@example.com", "        ").validate().is_ok());
		assert!(request("     ", "alice@example.com", "hunter22").validate().is_ok());
	}

	#[test]
	fn test_every_bad_field_reported() {
		let Err(Error::Validation(report)) = request("ab", "nope", "").validate() else {
			panic!("expected validation error");
		};
		assert_eq!(report.len(), 3);
		assert!(report.contains("username"));
		assert!(report.contains("email"));
		assert!(report.contains("password"));
	}

	#[test]
	fn test_missing_fields_deserialize_as_empty() {
		let req: RegisterRequest = serde_json::from_str(r#"{"username":"alice123"}"#).unwrap();
		let Err(Error::Validation(report)) = req.validate() else {
			panic!("expected validation error");
		};
		assert_eq!(report.messages("email"), ["is required"]);
	}

	#[test]
	fn test_default_scopes_are_minimal() {
		let scopes = Provisioner::default_scopes();
		assert_eq!(scopes.len(), 1);
		assert!(scopes.contains(&Scope::LOGIN));
	}
}

// vim: ts=4
