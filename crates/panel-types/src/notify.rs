//! Outbound notification interface

use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

/// Sent once an account has been provisioned
pub const TEMPLATE_ACCOUNT_CREATION: &str = "accountCreation";

#[async_trait]
pub trait Notifier: Debug + Send + Sync {
	/// Render `template_key` with `data` and deliver it to `recipient`.
	///
	/// With `best_effort` set, a notifier that is not configured reports
	/// success instead of a configuration error.
	async fn send_notification(
		&self,
		recipient: &str,
		template_key: &str,
		data: serde_json::Value,
		best_effort: bool,
	) -> PnResult<()>;
}

// vim: ts=4
