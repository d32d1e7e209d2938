//! Validation aggregator
//!
//! An entity save runs two passes:
//! - a structural pass over declarative per-field [`Rule`]s
//! - a uniqueness pass that counts existing rows holding the same value
//!
//! Both passes always run and append [`FieldError`]s into one
//! [`ValidationReport`]. A report passes iff it has no field entries.

use async_trait::async_trait;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::prelude::*;

/// Message used for every uniqueness failure
pub const ALREADY_IN_USE: &str = "already in use";

/// Entities that carry unique fields
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
	Account,
	Location,
}

impl EntityKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			EntityKind::Account => "account",
			EntityKind::Location => "location",
		}
	}
}

impl std::fmt::Display for EntityKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

// FieldError //
//************//
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
	pub field: String,
	pub message: String,
}

impl FieldError {
	pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self { field: field.into(), message: message.into() }
	}
}

// ValidationReport //
//******************//
/// Field-keyed error messages collected during one save attempt
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
	errors: BTreeMap<String, Vec<String>>,
}

impl ValidationReport {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.errors.entry(field.into()).or_default().push(message.into());
	}

	pub fn push(&mut self, error: FieldError) {
		self.add(error.field, error.message);
	}

	pub fn merge(&mut self, other: ValidationReport) {
		for (field, messages) in other.errors {
			self.errors.entry(field).or_default().extend(messages);
		}
	}

	pub fn is_passing(&self) -> bool {
		self.errors.is_empty()
	}

	/// Number of fields with at least one error
	pub fn len(&self) -> usize {
		self.errors.len()
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn contains(&self, field: &str) -> bool {
		self.errors.contains_key(field)
	}

	pub fn messages(&self, field: &str) -> &[String] {
		self.errors.get(field).map_or(&[], Vec::as_slice)
	}

	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.errors.keys().map(String::as_str)
	}

	/// Reports made only of uniqueness failures are conflicts
	pub fn is_conflict_only(&self) -> bool {
		!self.errors.is_empty()
			&& self.errors.values().flatten().all(|message| message == ALREADY_IN_USE)
	}

	/// Turn a failing report into the matching error kind
	pub fn into_result(self) -> PnResult<()> {
		if self.is_passing() {
			Ok(())
		} else if self.is_conflict_only() {
			Err(Error::Conflict(self))
		} else {
			Err(Error::Validation(self))
		}
	}
}

impl From<FieldError> for ValidationReport {
	fn from(error: FieldError) -> Self {
		let mut report = Self::new();
		report.push(error);
		report
	}
}

impl std::fmt::Display for ValidationReport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut first = true;
		for (field, messages) in &self.errors {
			for message in messages {
				if !first {
					f.write_str("; ")?;
				}
				write!(f, "{}: {}", field, message)?;
				first = false;
			}
		}
		Ok(())
	}
}

// Rules //
//*******//
#[derive(Clone, Copy, Debug)]
pub enum Rule {
	Required,
	/// Only characters in the 0x20..=0x7e range
	PrintableAscii,
	/// Minimum length in characters
	MinLen(usize),
	/// Maximum length in characters
	MaxLen(usize),
	Email,
	/// Value must match the regular expression
	Pattern(&'static str),
}

impl Rule {
	/// Check one value. `Ok(Some(msg))` is a field error, `Err` is an engine failure.
	pub fn check(&self, value: &str) -> PnResult<Option<String>> {
		let failed = match self {
			Rule::Required => value.is_empty(),
			Rule::PrintableAscii => !value.chars().all(|c| (' '..='~').contains(&c)),
			Rule::MinLen(min) => value.chars().count() < *min,
			Rule::MaxLen(max) => value.chars().count() > *max,
			Rule::Email => value.parse::<lettre::Address>().is_err(),
			Rule::Pattern(pattern) => {
				let re = regex::Regex::new(pattern).map_err(|err| {
					Error::InternalValidation(format!("invalid pattern {:?}: {}", pattern, err))
				})?;
				!re.is_match(value)
			}
		};
		Ok(failed.then(|| self.message()))
	}

	fn message(&self) -> String {
		match self {
			Rule::Required => "is required".into(),
			Rule::PrintableAscii => "must contain only printable ASCII characters".into(),
			Rule::MinLen(min) => format!("must be at least {} characters", min),
			Rule::MaxLen(max) => format!("must be at most {} characters", max),
			Rule::Email => "must be a valid email address".into(),
			Rule::Pattern(_) => "has an invalid format".into(),
		}
	}
}

/// Rules declared for one field of an entity
#[derive(Debug)]
pub struct FieldRules<'a> {
	pub field: &'static str,
	pub value: Cow<'a, str>,
	pub rules: &'static [Rule],
}

impl<'a> FieldRules<'a> {
	pub fn new(field: &'static str, value: impl Into<Cow<'a, str>>, rules: &'static [Rule]) -> Self {
		Self { field, value: value.into(), rules }
	}
}

/// A field whose value must not appear on any other row
#[derive(Debug)]
pub struct UniqueField<'a> {
	pub field: &'static str,
	pub value: &'a str,
}

/// Entities that can be checked by the aggregator
pub trait Validate: Send + Sync {
	const ENTITY: EntityKind;

	/// Identifier of an already stored entity, excluded from uniqueness counts
	fn own_id(&self) -> Option<String>;

	fn field_rules(&self) -> Vec<FieldRules<'_>>;

	fn unique_fields(&self) -> Vec<UniqueField<'_>>;
}

/// Source of uniqueness counts. Store adapters implement it over an open transaction.
#[async_trait]
pub trait UniqueCounter: Send {
	async fn count_unique(
		&mut self,
		entity: EntityKind,
		field: &str,
		value: &str,
		exclude_id: Option<&str>,
	) -> PnResult<u64>;
}

/// Structural pass. An empty value only reports the `Required` rule.
pub fn check_structure(fields: &[FieldRules<'_>]) -> PnResult<ValidationReport> {
	let mut report = ValidationReport::new();
	for field in fields {
		let empty = field.value.is_empty();
		for rule in field.rules {
			if empty && !matches!(rule, Rule::Required) {
				continue;
			}
			if let Some(message) = rule.check(&field.value)? {
				report.push(FieldError::new(field.field, message));
			}
		}
	}
	Ok(report)
}

/// Run both passes over an entity and return the merged report
pub async fn validate_entity<E, C>(counter: &mut C, entity: &E) -> PnResult<ValidationReport>
where
	E: Validate,
	C: UniqueCounter + ?Sized,
{
	let mut report = check_structure(&entity.field_rules())?;

	let own_id = entity.own_id();
	for unique in entity.unique_fields() {
		let count = counter
			.count_unique(E::ENTITY, unique.field, unique.value, own_id.as_deref())
			.await?;
		if count > 0 {
			report.push(FieldError::new(unique.field, ALREADY_IN_USE));
		}
	}

	if !report.is_passing() {
		debug!("{} validation failed: {}", E::ENTITY, report);
	}
	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Widget {
		id: Option<String>,
		code: String,
		name: String,
	}

	impl Validate for Widget {
		const ENTITY: EntityKind = EntityKind::Location;

		fn own_id(&self) -> Option<String> {
			self.id.clone()
		}

		fn field_rules(&self) -> Vec<FieldRules<'_>> {
			vec![
				FieldRules::new("code", self.code.as_str(), &[Rule::Required]),
				FieldRules::new("name", self.name.as_str(), &[Rule::Required, Rule::MaxLen(8)]),
			]
		}

		fn unique_fields(&self) -> Vec<UniqueField<'_>> {
			vec![
				UniqueField { field: "code", value: &self.code },
				UniqueField { field: "name", value: &self.name },
			]
		}
	}

	/// Counter reporting a fixed number of existing rows for every query
	struct FixedCounter {
		count: u64,
		seen_excludes: Vec<Option<String>>,
	}

	#[async_trait]
	impl UniqueCounter for FixedCounter {
		async fn count_unique(
			&mut self,
			_entity: EntityKind,
			_field: &str,
			_value: &str,
			exclude_id: Option<&str>,
		) -> PnResult<u64> {
			self.seen_excludes.push(exclude_id.map(str::to_string));
			Ok(self.count)
		}
	}

	#[test]
	fn test_rules() {
		assert!(Rule::Required.check("").unwrap().is_some());
		assert!(Rule::Required.check("   ").unwrap().is_none());
		assert!(Rule::Required.check("x").unwrap().is_none());

		assert!(Rule::PrintableAscii.check("alice123").unwrap().is_none());
		assert!(Rule::PrintableAscii.check("alice\n").unwrap().is_some());
		assert!(Rule::PrintableAscii.check("álice").unwrap().is_some());

		assert!(Rule::MinLen(5).check("ab").unwrap().is_some());
		assert!(Rule::MinLen(5).check("abcde").unwrap().is_none());
		assert!(Rule::MaxLen(3).check("abcd").unwrap().is_some());

		assert!(Rule::Email.check("alice@example.com").unwrap().is_none());
		assert!(Rule::Email.check("alice.example.com").unwrap().is_some());
		assert!(Rule::Email.check("alice@").unwrap().is_some());

		assert!(Rule::Pattern("^[a-z]+$").check("abc").unwrap().is_none());
		assert!(Rule::Pattern("^[a-z]+$").check("ABC").unwrap().is_some());
	}

	#[test]
	fn test_broken_pattern_is_internal_failure() {
		let res = Rule::Pattern("([a-z").check("abc");
		assert!(matches!(res, Err(Error::InternalValidation(_))));
	}

	#[test]
	fn test_empty_value_reports_required_only() {
		let report =
			check_structure(&[FieldRules::new("username", "", &[Rule::Required, Rule::MinLen(5)])])
				.unwrap();
		assert_eq!(report.messages("username"), ["is required"]);
	}

	#[tokio::test]
	async fn test_both_unique_fields_reported() {
		let widget = Widget { id: None, code: "de-1".into(), name: "Berlin".into() };
		let mut counter = FixedCounter { count: 1, seen_excludes: Vec::new() };

		let report = validate_entity(&mut counter, &widget).await.unwrap();
		assert_eq!(report.len(), 2);
		assert_eq!(report.messages("code"), [ALREADY_IN_USE]);
		assert_eq!(report.messages("name"), [ALREADY_IN_USE]);
		assert!(report.is_conflict_only());
		assert!(matches!(report.into_result(), Err(Error::Conflict(_))));
	}

	#[tokio::test]
	async fn test_uniqueness_runs_after_structural_failure() {
		let widget = Widget { id: None, code: String::new(), name: "Far too long".into() };
		let mut counter = FixedCounter { count: 1, seen_excludes: Vec::new() };

		let report = validate_entity(&mut counter, &widget).await.unwrap();
		assert_eq!(report.messages("code"), ["is required", ALREADY_IN_USE]);
		assert_eq!(report.messages("name"), ["must be at most 8 characters", ALREADY_IN_USE]);
		assert_eq!(counter.seen_excludes.len(), 2);
		assert!(matches!(report.into_result(), Err(Error::Validation(_))));
	}

	#[tokio::test]
	async fn test_update_excludes_own_id() {
		let widget = Widget { id: Some("w-1".into()), code: "de-1".into(), name: "Berlin".into() };
		let mut counter = FixedCounter { count: 0, seen_excludes: Vec::new() };

		let report = validate_entity(&mut counter, &widget).await.unwrap();
		assert!(report.is_passing());
		assert!(report.into_result().is_ok());
		assert!(counter.seen_excludes.iter().all(|id| id.as_deref() == Some("w-1")));
	}

	#[test]
	fn test_merge_keeps_all_messages() {
		let mut a = ValidationReport::from(FieldError::new("email", "is required"));
		let mut b = ValidationReport::new();
		b.add("email", ALREADY_IN_USE);
		b.add("username", ALREADY_IN_USE);
		a.merge(b);
		assert_eq!(a.len(), 2);
		assert_eq!(a.messages("email").len(), 2);
		assert_eq!(a.to_string(), "email: is required; email: already in use; username: already in use");
	}
}

// vim: ts=4
