//! JWT session tokens (HS256)
//!
//! The signing secret is generated on first start and kept in the store's
//! `vars` table, so sessions survive restarts.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use panel_core::settings::service::SettingsService;
use panel_types::session::{Session, SessionClaims, SessionIssuer};
use panel_types::store_adapter::{Account, StoreAdapter};
use panel_types::utils::random_string;
use panel_types::worker::WorkerPool;

use crate::prelude::*;

const JWT_SECRET_VAR: &str = "jwt_secret";
const JWT_SECRET_LENGTH: usize = 48;

#[derive(Debug, Serialize, Deserialize)]
struct AccessToken {
	sub: i64,
	name: Box<str>,
	exp: i64,
}

pub struct JwtSessionIssuer {
	settings: Arc<SettingsService>,
	worker: Arc<WorkerPool>,
	encoding_key: EncodingKey,
	decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtSessionIssuer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("JwtSessionIssuer").finish_non_exhaustive()
	}
}

impl JwtSessionIssuer {
	pub async fn new(
		store: &dyn StoreAdapter,
		settings: Arc<SettingsService>,
		worker: Arc<WorkerPool>,
	) -> PnResult<Self> {
		let secret = match store.read_var(JWT_SECRET_VAR).await {
			Ok(secret) => secret,
			Err(Error::NotFound) => {
				let secret: Box<str> = random_string(JWT_SECRET_LENGTH).into();
				store.update_var(JWT_SECRET_VAR, &secret).await?;
				info!("Generated new JWT secret");
				secret
			}
			Err(err) => return Err(err),
		};

		Ok(Self {
			settings,
			worker,
			encoding_key: EncodingKey::from_secret(secret.as_bytes()),
			decoding_key: DecodingKey::from_secret(secret.as_bytes()),
		})
	}
}

#[async_trait]
impl SessionIssuer for JwtSessionIssuer {
	async fn create_session(&self, account: &Account) -> PnResult<Session> {
		let timeout = self.settings.get_int("auth.session_timeout").await?;
		let expires_at = Timestamp::now().add_seconds(timeout);

		let claims =
			AccessToken { sub: account.user_id.0, name: account.username.clone(), exp: expires_at.0 };
		let key = self.encoding_key.clone();
		let token = self
			.worker
			.try_run_immed(move || {
				encode(&Header::new(Algorithm::HS256), &claims, &key)
					.map_err(|e| Error::Internal(format!("token signing failed: {}", e)))
			})
			.await?;

		debug!("Session issued for {}", account.username);
		Ok(Session { token: token.into(), expires_at })
	}

	async fn validate_session(&self, token: &str) -> PnResult<SessionClaims> {
		let data =
			decode::<AccessToken>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
				.map_err(|e| {
					debug!("Rejected session token: {}", e);
					Error::Unauthorized
				})?;

		Ok(SessionClaims {
			user_id: UserId(data.claims.sub),
			username: data.claims.name,
			expires_at: Timestamp(data.claims.exp),
		})
	}
}

// vim: ts=4
