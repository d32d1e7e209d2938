//! Scopes: opaque capability tokens held through grants

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scope(Cow<'static, str>);

/// Deduplicated, order-independent set of scopes
pub type ScopeSet = BTreeSet<Scope>;

impl Scope {
	/// Allows establishing a session
	pub const LOGIN: Scope = Scope(Cow::Borrowed("login"));
	/// Implies every other scope
	pub const ADMIN: Scope = Scope(Cow::Borrowed("admin"));
	pub const LOCATIONS_VIEW: Scope = Scope(Cow::Borrowed("locations.view"));
	pub const LOCATIONS_EDIT: Scope = Scope(Cow::Borrowed("locations.edit"));

	pub fn new(scope: impl Into<String>) -> Self {
		Scope(Cow::Owned(scope.into()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for Scope {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Scope {
	fn from(scope: &str) -> Self {
		Scope::new(scope)
	}
}

impl Serialize for Scope {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for Scope {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Ok(Scope::new(String::deserialize(deserializer)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_set_serializes_sorted() {
		let scopes: ScopeSet =
			[Scope::LOCATIONS_VIEW, Scope::LOGIN, Scope::LOGIN].into_iter().collect();
		assert_eq!(serde_json::to_string(&scopes).unwrap(), r#"["locations.view","login"]"#);
	}

	#[test]
	fn test_scope_is_opaque() {
		let scopes: ScopeSet = [Scope::new("locations.view,admin")].into_iter().collect();
		let json = serde_json::to_string(&scopes).unwrap();
		let read: ScopeSet = serde_json::from_str(&json).unwrap();
		assert_eq!(read, scopes);
		assert!(!read.contains(&Scope::ADMIN));
	}

	#[test]
	fn test_owned_and_borrowed_are_equal() {
		assert_eq!(Scope::new("login"), Scope::LOGIN);
	}
}

// vim: ts=4
