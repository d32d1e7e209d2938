//! SMTP delivery through the lettre async transport

use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;

use panel_core::settings::SettingValue;
use panel_core::settings::service::SettingsService;

use crate::EmailMessage;
use crate::prelude::*;

/// SMTP parameters resolved from the `email.*` settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
	pub host: String,
	pub port: u16,
	pub username: Option<String>,
	pub password: Option<String>,
	pub tls_mode: String,
	pub timeout: Duration,
	pub from: Mailbox,
}

pub struct EmailSender {
	settings: Arc<SettingsService>,
}

impl EmailSender {
	pub fn new(settings: Arc<SettingsService>) -> Self {
		Self { settings }
	}

	/// `None` when email is disabled or no SMTP host is set
	pub async fn config(&self) -> PnResult<Option<SmtpConfig>> {
		if !self.settings.get_bool("email.enabled").await? {
			return Ok(None);
		}
		let Some(host) = self.optional_string("email.smtp.host").await? else {
			return Ok(None);
		};

		let from_address = self
			.optional_string("email.from.address")
			.await?
			.ok_or_else(|| Error::ConfigError("email.from.address is not set".into()))?;
		let from_name = self.settings.get_string("email.from.name").await?;
		let from = Mailbox::new(
			Some(from_name),
			from_address
				.parse()
				.map_err(|_| Error::ConfigError("Invalid from email address".into()))?,
		);

		let port = u16::try_from(self.settings.get_int("email.smtp.port").await?)
			.map_err(|_| Error::ConfigError("Invalid SMTP port".into()))?;
		let timeout = u64::try_from(self.settings.get_int("email.smtp.timeout_seconds").await?)
			.map_err(|_| Error::ConfigError("Invalid SMTP timeout".into()))?;

		Ok(Some(SmtpConfig {
			host,
			port,
			username: self.optional_string("email.smtp.username").await?,
			password: self.optional_string("email.smtp.password").await?,
			tls_mode: self.settings.get_string("email.smtp.tls_mode").await?,
			timeout: Duration::from_secs(timeout),
			from,
		}))
	}

	pub async fn send(&self, config: &SmtpConfig, message: EmailMessage) -> PnResult<()> {
		debug!(
			"Sending email to {} via {}:{} with TLS mode: {}",
			message.to, config.host, config.port, config.tls_mode
		);

		let email = build_message(&config.from, message.clone())?;
		let mailer = build_transport(config)?;

		match mailer.send(email).await {
			Ok(response) => {
				info!("Email sent to {} (code {})", message.to, response.code());
				Ok(())
			}
			Err(e) => {
				warn!("Failed to send email to {}: {}", message.to, e);
				Err(Error::Notification(format!("SMTP send failed: {}", e)))
			}
		}
	}

	async fn optional_string(&self, key: &str) -> PnResult<Option<String>> {
		match self.settings.get(key).await {
			Ok(SettingValue::String(s)) if !s.is_empty() => Ok(Some(s)),
			Ok(_) | Err(Error::ConfigError(_)) => Ok(None),
			Err(err) => Err(err),
		}
	}
}

fn build_message(from: &Mailbox, message: EmailMessage) -> PnResult<Message> {
	let to: Mailbox = message
		.to
		.parse()
		.map_err(|_| Error::ValidationError("Invalid recipient email address".into()))?;
	let builder = Message::builder().from(from.clone()).to(to).subject(message.subject);

	let res = match message.html_body {
		Some(html_body) => builder.multipart(
			MultiPart::alternative()
				.singlepart(SinglePart::plain(message.text_body))
				.singlepart(SinglePart::html(html_body)),
		),
		None => builder.singlepart(SinglePart::plain(message.text_body)),
	};
	res.map_err(|e| Error::Notification(format!("Failed to build email: {}", e)))
}

fn build_transport(config: &SmtpConfig) -> PnResult<AsyncSmtpTransport<Tokio1Executor>> {
	let tls_params = || {
		TlsParameters::builder(config.host.clone())
			.build()
			.map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))
	};
	let tls = match config.tls_mode.as_str() {
		"tls" => Tls::Wrapper(tls_params()?),
		"starttls" => Tls::Opportunistic(tls_params()?),
		"none" => Tls::None,
		mode => {
			return Err(Error::ConfigError(format!(
				"Invalid TLS mode: {}. Must be 'none', 'starttls', or 'tls'",
				mode
			)));
		}
	};

	let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
		.port(config.port)
		.timeout(Some(config.timeout))
		.tls(tls);
	if let (Some(username), Some(password)) = (&config.username, &config.password) {
		builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
	}
	Ok(builder.build())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn from() -> Mailbox {
		Mailbox::new(Some("Panel".into()), "noreply@example.com".parse().unwrap())
	}

	#[test]
	fn test_build_multipart_message() {
		let message = EmailMessage {
			to: "alice@example.com".into(),
			subject: "Hello".into(),
			text_body: "Hi".into(),
			html_body: Some("<p>Hi</p>".into()),
		};
		let email = build_message(&from(), message).unwrap();
		let raw = String::from_utf8(email.formatted()).unwrap();
		assert!(raw.contains("To: alice@example.com"));
		assert!(raw.contains("multipart/alternative"));
	}

	#[test]
	fn test_invalid_recipient() {
		let message = EmailMessage {
			to: "not-an-address".into(),
			subject: "Hello".into(),
			text_body: "Hi".into(),
			html_body: None,
		};
		assert!(matches!(build_message(&from(), message), Err(Error::ValidationError(_))));
	}
}

// vim: ts=4
