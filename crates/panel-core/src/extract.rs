//! Request extractors

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use panel_types::session::SessionClaims;

use crate::prelude::*;

/// Cookie carrying the session token for browser clients
pub const SESSION_COOKIE: &str = "panel_auth";

// Auth //
//******//
/// Authenticated caller, from a bearer token or the session cookie
#[derive(Debug, Clone)]
pub struct Auth(pub SessionClaims);

impl FromRequestParts<App> for Auth {
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, state: &App) -> Result<Self, Self::Rejection> {
		if let Some(auth) = parts.extensions.get::<Auth>().cloned() {
			return Ok(auth);
		}

		let token = bearer_token(parts).or_else(|| cookie_token(parts)).ok_or(Error::Unauthorized)?;
		let claims = state.sessions.validate_session(&token).await?;

		let auth = Auth(claims);
		parts.extensions.insert(auth.clone());
		Ok(auth)
	}
}

fn bearer_token(parts: &Parts) -> Option<String> {
	let auth_header = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
	let token = auth_header.strip_prefix("Bearer ")?.trim();
	(!token.is_empty()).then(|| token.to_string())
}

fn cookie_token(parts: &Parts) -> Option<String> {
	parts
		.headers
		.get_all(header::COOKIE)
		.iter()
		.filter_map(|h| h.to_str().ok())
		.flat_map(|h| h.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
		.map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::Request;

	fn parts(name: header::HeaderName, value: &str) -> Parts {
		let (parts, ()) = Request::builder().header(name, value).body(()).unwrap().into_parts();
		parts
	}

	#[test]
	fn test_bearer_token() {
		let p = parts(header::AUTHORIZATION, "Bearer abc.def");
		assert_eq!(bearer_token(&p).as_deref(), Some("abc.def"));

		let p = parts(header::AUTHORIZATION, "Basic Zm9vOmJhcg==");
		assert_eq!(bearer_token(&p), None);
	}

	#[test]
	fn test_cookie_token() {
		let p = parts(header::COOKIE, "theme=dark; panel_auth=tok123; lang=en");
		assert_eq!(cookie_token(&p).as_deref(), Some("tok123"));

		let p = parts(header::COOKIE, "panel_auth=");
		assert_eq!(cookie_token(&p), None);
	}
}

// vim: ts=4
