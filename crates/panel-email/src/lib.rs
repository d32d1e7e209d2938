//! Email notifications
//!
//! - Template rendering with variable substitution (Handlebars)
//! - SMTP delivery with lettre
//! - Configuration via the settings registry

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod sender;
pub mod settings;
pub mod template;

mod prelude;

pub use sender::EmailSender;
pub use settings::register_settings;
pub use template::TemplateEngine;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use panel_core::settings::service::SettingsService;
use panel_types::notify::Notifier;

use crate::prelude::*;

/// Email message to be sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
	pub to: String,
	pub subject: String,
	pub text_body: String,
	pub html_body: Option<String>,
}

/// `Notifier` backed by rendered templates and SMTP
pub struct EmailNotifier {
	templates: TemplateEngine,
	sender: EmailSender,
}

impl std::fmt::Debug for EmailNotifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EmailNotifier").finish_non_exhaustive()
	}
}

impl EmailNotifier {
	pub fn new(settings: Arc<SettingsService>) -> PnResult<Self> {
		Ok(Self { templates: TemplateEngine::new()?, sender: EmailSender::new(settings) })
	}
}

#[async_trait]
impl Notifier for EmailNotifier {
	async fn send_notification(
		&self,
		recipient: &str,
		template_key: &str,
		data: serde_json::Value,
		best_effort: bool,
	) -> PnResult<()> {
		let Some(config) = self.sender.config().await? else {
			if best_effort {
				info!("Email not configured, skipping '{}' to {}", template_key, recipient);
				return Ok(());
			}
			return Err(Error::ConfigError("Email delivery is not configured".into()));
		};

		let rendered = self.templates.render(template_key, &data)?;
		let message = EmailMessage {
			to: recipient.to_string(),
			subject: rendered.subject,
			text_body: rendered.text_body,
			html_body: rendered.html_body,
		};
		self.sender.send(&config, message).await
	}
}

// vim: ts=4
