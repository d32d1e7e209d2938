//! Error type shared by every panel crate.
//!
//! Field-level problems travel inside `Validation` and `Conflict` as a
//! [`ValidationReport`]. Everything the caller cannot fix collapses into an
//! opaque 500 response; the detail stays in the server log.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::validate::ValidationReport;

pub type PnResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	Unauthorized,
	DbError,
	Parse,

	/// Structural field errors (client input)
	Validation(ValidationReport),
	/// Uniqueness violations, keyed by the offending field
	Conflict(ValidationReport),
	/// Single message input error (settings, malformed parameters)
	ValidationError(String),
	/// The rule engine itself failed, not the input
	InternalValidation(String),
	/// Account exists but its grant could not be assigned
	PartialProvisioning,
	Notification(String),
	ConfigError(String),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	/// Stable machine-readable code used in response bodies
	pub fn code(&self) -> &'static str {
		match self {
			Error::NotFound => "E-CORE-NOTFOUND",
			Error::PermissionDenied => "E-AUTH-NOPERM",
			Error::Unauthorized => "E-AUTH-UNAUTH",
			Error::Parse => "E-VAL-PARSE",
			Error::Validation(_) | Error::ValidationError(_) => "E-VAL-INVALID",
			Error::Conflict(_) => "E-VAL-CONFLICT",
			Error::DbError
			| Error::InternalValidation(_)
			| Error::PartialProvisioning
			| Error::Notification(_)
			| Error::ConfigError(_)
			| Error::Internal(_)
			| Error::Io(_) => "E-CORE-INTERNAL",
		}
	}

	pub fn status(&self) -> StatusCode {
		match self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::PermissionDenied => StatusCode::FORBIDDEN,
			Error::Unauthorized => StatusCode::UNAUTHORIZED,
			Error::Parse | Error::Validation(_) | Error::ValidationError(_) => {
				StatusCode::BAD_REQUEST
			}
			Error::Conflict(_) => StatusCode::CONFLICT,
			Error::DbError
			| Error::InternalValidation(_)
			| Error::PartialProvisioning
			| Error::Notification(_)
			| Error::ConfigError(_)
			| Error::Internal(_)
			| Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Field report carried by the error, if any
	pub fn report(&self) -> Option<&ValidationReport> {
		match self {
			Error::Validation(report) | Error::Conflict(report) => Some(report),
			_ => None,
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		tracing::debug!("JSON error: {}", err);
		Self::Parse
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::Validation(report) => write!(f, "validation failed: {}", report),
			Error::Conflict(report) => write!(f, "conflict: {}", report),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::InternalValidation(msg) => write!(f, "internal validation failure: {}", msg),
			Error::PartialProvisioning => write!(f, "account created without permission grant"),
			Error::Notification(msg) => write!(f, "notification failed: {}", msg),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
			_ => write!(f, "{:?}", self),
		}
	}
}

impl std::error::Error for Error {}

#[skip_serializing_none]
#[derive(Serialize)]
struct ErrorBody<'a> {
	code: &'static str,
	message: String,
	fields: Option<&'a ValidationReport>,
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
	error: ErrorBody<'a>,
}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let status = self.status();
		let message = if status.is_server_error() {
			tracing::error!("Request failed: {}", self);
			"internal error".to_string()
		} else {
			match &self {
				Error::Validation(_) => "invalid input".to_string(),
				Error::Conflict(_) => "already in use".to_string(),
				Error::ValidationError(msg) => msg.clone(),
				Error::NotFound => "not found".to_string(),
				Error::Unauthorized => "authentication required".to_string(),
				Error::PermissionDenied => "permission denied".to_string(),
				_ => "bad request".to_string(),
			}
		};
		let body = ErrorResponse {
			error: ErrorBody { code: self.code(), message, fields: self.report() },
		};
		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_mapping() {
		let mut report = ValidationReport::new();
		report.add("username", "already in use");
		assert_eq!(Error::Conflict(report.clone()).status(), StatusCode::CONFLICT);
		assert_eq!(Error::Validation(report).status(), StatusCode::BAD_REQUEST);
		assert_eq!(Error::PartialProvisioning.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert_eq!(
			Error::InternalValidation("bad rule".into()).status(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
		assert_eq!(Error::NotFound.status(), StatusCode::NOT_FOUND);
	}

	#[test]
	fn test_internal_errors_share_opaque_code() {
		assert_eq!(Error::DbError.code(), "E-CORE-INTERNAL");
		assert_eq!(Error::Internal("x".into()).code(), "E-CORE-INTERNAL");
		assert_eq!(Error::Notification("smtp".into()).code(), "E-CORE-INTERNAL");
	}
}

// vim: ts=4
