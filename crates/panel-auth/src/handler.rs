//! Login and session handlers

use axum::{
	Json,
	extract::State,
	http::{StatusCode, header},
	response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::time::Duration;

use panel_core::Auth;
use panel_core::extract::SESSION_COOKIE;
use panel_types::scope::{Scope, ScopeSet};
use panel_types::session::Session;
use panel_types::store_adapter::{Account, AccountField, ScopeGrant};
use panel_types::types::ApiResponse;
use panel_types::validate::ValidationReport;

use crate::crypto;
use crate::prelude::*;
use crate::register::session_cookie;

const FAILED_LOGIN_DELAY: Duration = Duration::from_secs(1);

/// # POST /api/auth/login
#[derive(Deserialize)]
pub struct LoginReq {
	username: Option<String>,
	email: Option<String>,
	password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRes {
	pub user_id: UserId,
	pub username: Box<str>,
	pub session: Session,
	pub scopes: ScopeSet,
}

async fn authenticate(app: &App, login: LoginReq) -> PnResult<(Account, ScopeGrant)> {
	let lookup = match (&login.username, &login.email) {
		(Some(username), _) => app.store.read_account_by(AccountField::Username, username).await,
		(None, Some(email)) => app.store.read_account_by(AccountField::Email, email).await,
		(None, None) => {
			let mut report = ValidationReport::new();
			report.add("username", "is required");
			return Err(Error::Validation(report));
		}
	};
	let account = match lookup {
		Ok(account) => account,
		Err(Error::NotFound) => return Err(Error::Unauthorized),
		Err(err) => return Err(err),
	};

	crypto::check_password(&app.worker, login.password.into(), account.password_hash.clone())
		.await?;

	let grant = app.perms.get_or_create(account.user_id, None).await?;
	if !grant.has(&Scope::LOGIN) {
		warn!("Login refused for {}: no login scope", account.username);
		return Err(Error::Unauthorized);
	}

	Ok((account, grant))
}

pub async fn post_login(
	State(app): State<App>,
	Json(login): Json<LoginReq>,
) -> PnResult<impl IntoResponse> {
	let (account, grant) = match authenticate(&app, login).await {
		Ok(res) => res,
		Err(Error::Unauthorized) => {
			tokio::time::sleep(FAILED_LOGIN_DELAY).await;
			return Err(Error::Unauthorized);
		}
		Err(err) => return Err(err),
	};

	let session = app.sessions.create_session(&account).await?;
	info!("Login: {}", account.username);

	let cookie = session_cookie(&session);
	let res = LoginRes {
		user_id: account.user_id,
		username: account.username,
		session,
		scopes: grant.scopes,
	};
	Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(ApiResponse::new(res))))
}

/// # POST /api/auth/logout
pub async fn post_logout(Auth(auth): Auth) -> impl IntoResponse {
	info!("Logout: {}", auth.username);
	let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0", SESSION_COOKIE);
	(StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(ApiResponse::new(())))
}

/// # GET /api/auth/grants
#[skip_serializing_none]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRes {
	pub target: Option<Box<str>>,
	pub scopes: ScopeSet,
}

pub async fn get_grants(
	State(app): State<App>,
	Auth(auth): Auth,
) -> PnResult<(StatusCode, Json<ApiResponse<Vec<GrantRes>>>)> {
	let grants = app
		.perms
		.list(auth.user_id)
		.await?
		.into_iter()
		.map(|grant| GrantRes { target: grant.target, scopes: grant.scopes })
		.collect();

	Ok((StatusCode::OK, Json(ApiResponse::new(grants))))
}

// vim: ts=4
