//! Email template rendering with Handlebars
//!
//! Templates are compiled into the binary. Each notification has a plain
//! text variant carrying YAML frontmatter (the subject line) and an
//! optional HTML variant.

use handlebars::Handlebars;
use serde::Deserialize;
use std::collections::HashMap;

use crate::prelude::*;
use panel_types::notify::TEMPLATE_ACCOUNT_CREATION;

/// (key, text template, html template)
const BUILTIN_TEMPLATES: &[(&str, &str, Option<&str>)] = &[(
	TEMPLATE_ACCOUNT_CREATION,
	include_str!("../templates/accountCreation.txt.hbs"),
	Some(include_str!("../templates/accountCreation.html.hbs")),
)];

/// Metadata extracted from template frontmatter
#[derive(Debug, Default, Deserialize)]
pub struct TemplateMetadata {
	#[serde(default)]
	pub subject: Option<String>,
}

#[derive(Debug)]
pub struct RenderResult {
	pub subject: String,
	pub text_body: String,
	pub html_body: Option<String>,
}

pub struct TemplateEngine {
	handlebars: Handlebars<'static>,
	subjects: HashMap<String, String>,
}

impl TemplateEngine {
	pub fn new() -> PnResult<Self> {
		let mut handlebars = Handlebars::new();
		handlebars.set_strict_mode(true);

		let mut engine = Self { handlebars, subjects: HashMap::new() };
		for (key, text, html) in BUILTIN_TEMPLATES {
			engine.register(key, text, *html)?;
		}
		Ok(engine)
	}

	/// Register a template under `key`, replacing any previous one
	pub fn register(&mut self, key: &str, text: &str, html: Option<&str>) -> PnResult<()> {
		let (metadata, body) = Self::parse_frontmatter(text);
		let subject = metadata
			.subject
			.ok_or_else(|| Error::ConfigError(format!("Template '{}' has no subject", key)))?;

		self.handlebars
			.register_template_string(&format!("{}.txt", key), body)
			.map_err(|e| Error::ConfigError(format!("Invalid template '{}': {}", key, e)))?;
		if let Some(html) = html {
			self.handlebars
				.register_template_string(&format!("{}.html", key), html)
				.map_err(|e| Error::ConfigError(format!("Invalid template '{}': {}", key, e)))?;
		}
		self.subjects.insert(key.to_string(), subject);

		debug!("Registered email template: {}", key);
		Ok(())
	}

	/// Parse YAML frontmatter delimited by `---` lines.
	///
	/// Returns (metadata, content_without_frontmatter)
	fn parse_frontmatter(content: &str) -> (TemplateMetadata, &str) {
		let content = content.trim_start();
		let Some(after_first) = content.strip_prefix("---") else {
			return (TemplateMetadata::default(), content);
		};

		let Some(end_pos) = after_first.find("\n---") else {
			return (TemplateMetadata::default(), content);
		};
		let yaml_content = &after_first[..end_pos];
		let template_content = &after_first[end_pos + 4..];

		match serde_yaml::from_str(yaml_content) {
			Ok(metadata) => (metadata, template_content.trim_start_matches('\n')),
			Err(e) => {
				warn!("Failed to parse frontmatter YAML: {}", e);
				(TemplateMetadata::default(), content)
			}
		}
	}

	pub fn has_template(&self, key: &str) -> bool {
		self.subjects.contains_key(key)
	}

	pub fn render(&self, key: &str, vars: &serde_json::Value) -> PnResult<RenderResult> {
		let subject = self
			.subjects
			.get(key)
			.ok_or_else(|| Error::ConfigError(format!("Template not found: {}", key)))?;

		let render_err =
			|e: handlebars::RenderError| Error::Notification(format!("Rendering '{}': {}", key, e));

		let subject = self.handlebars.render_template(subject, vars).map_err(render_err)?;
		let text_body = self.handlebars.render(&format!("{}.txt", key), vars).map_err(render_err)?;
		let html_name = format!("{}.html", key);
		let html_body = if self.handlebars.has_template(&html_name) {
			Some(self.handlebars.render(&html_name, vars).map_err(render_err)?)
		} else {
			None
		};

		Ok(RenderResult { subject, text_body, html_body })
	}
}


// vim: ts=4
