//! Account storage integration tests
//!
//! - atomic validate-and-insert with field-keyed reports
//! - concurrent registrations racing for one username
//! - lookups and cascading delete

#[cfg(test)]
mod tests {
	use panel_store_adapter_sqlite::StoreAdapterSqlite;
	use panel_types::prelude::*;
	use panel_types::scope::{Scope, ScopeSet};
	use panel_types::store_adapter::{AccountField, CreateAccountData, StoreAdapter};
	use panel_types::validate::{ALREADY_IN_USE, EntityKind};
	use std::sync::Arc;
	use tempfile::TempDir;

	/// Helper to create a test store with temporary database
	async fn create_test_adapter() -> PnResult<(StoreAdapterSqlite, TempDir)> {
		let tmp_dir = TempDir::new().unwrap();
		let adapter = StoreAdapterSqlite::new(tmp_dir.path().join("panel.db")).await?;
		Ok((adapter, tmp_dir))
	}

	fn account<'a>(username: &'a str, email: &'a str) -> CreateAccountData<'a> {
		CreateAccountData { username, email, password_hash: "$2b$10$hash" }
	}

	#[tokio::test]
	async fn test_create_and_read_account() {
		let (adapter, _tmp) = create_test_adapter().await.expect("Failed to create adapter");

		let created = adapter
			.create_account(&account("alice123", "alice@example.com"))
			.await
			.expect("Failed to create account");
		assert_eq!(created.username.as_ref(), "alice123");
		assert_eq!(created.password_hash.as_ref(), "$2b$10$hash");

		let by_id = adapter.read_account(created.user_id).await.unwrap();
		assert_eq!(by_id.email.as_ref(), "alice@example.com");

		let by_name = adapter.read_account_by(AccountField::Username, "alice123").await.unwrap();
		assert_eq!(by_name.user_id, created.user_id);

		let by_email =
			adapter.read_account_by(AccountField::Email, "ALICE@example.com").await.unwrap();
		assert_eq!(by_email.user_id, created.user_id);
		println!("✅ Account created and found by id, username and email");
	}

	#[tokio::test]
	async fn test_missing_account_is_not_found() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();

		assert!(matches!(adapter.read_account(UserId(42)).await, Err(Error::NotFound)));
		assert!(matches!(
			adapter.read_account_by(AccountField::Username, "nobody").await,
			Err(Error::NotFound)
		));
		assert!(matches!(adapter.delete_account(UserId(42)).await, Err(Error::NotFound)));
	}

	#[tokio::test]
	async fn test_duplicate_fields_reported_together() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		adapter.create_account(&account("alice123", "alice@example.com")).await.unwrap();

		let err = adapter
			.create_account(&account("alice123", "alice@example.com"))
			.await
			.expect_err("Duplicate account must be rejected");
		let Error::Conflict(report) = err else {
			panic!("Expected conflict, got {:?}", err);
		};
		assert_eq!(report.len(), 2);
		assert_eq!(report.messages("username"), [ALREADY_IN_USE]);
		assert_eq!(report.messages("email"), [ALREADY_IN_USE]);
		println!("✅ Both unique fields reported in one report");
	}

	#[tokio::test]
	async fn test_structural_and_unique_errors_merge() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		adapter.create_account(&account("alice123", "alice@example.com")).await.unwrap();

		let err = adapter.create_account(&account("alice123", "not-an-email")).await.unwrap_err();
		let Error::Validation(report) = err else {
			panic!("Expected validation error, got {:?}", err);
		};
		assert_eq!(report.messages("username"), [ALREADY_IN_USE]);
		assert_eq!(report.messages("email"), ["must be a valid email address"]);

		let count = adapter.count(EntityKind::Account, "username", "alice123", None).await.unwrap();
		assert_eq!(count, 1, "Failed save must not write");
	}

	#[tokio::test]
	async fn test_count_excludes_own_id() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		let alice = adapter.create_account(&account("alice123", "alice@example.com")).await.unwrap();
		let own_id = alice.user_id.to_string();

		let seen = adapter.count(EntityKind::Account, "email", "alice@example.com", None).await;
		assert_eq!(seen.unwrap(), 1);
		let excluded = adapter
			.count(EntityKind::Account, "email", "alice@example.com", Some(&own_id))
			.await;
		assert_eq!(excluded.unwrap(), 0);

		let unknown = adapter.count(EntityKind::Account, "password", "x", None).await;
		assert!(matches!(unknown, Err(Error::InternalValidation(_))));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_concurrent_registrations_single_winner() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		let adapter = Arc::new(adapter);

		let mut handles = Vec::new();
		for i in 0..8 {
			let adapter = Arc::clone(&adapter);
			handles.push(tokio::spawn(async move {
				let email = format!("racer{}@example.com", i);
				adapter.create_account(&account("racer01", &email)).await
			}));
		}

		let mut created = 0;
		let mut conflicts = 0;
		for handle in handles {
			match handle.await.unwrap() {
				Ok(_) => created += 1,
				Err(Error::Conflict(report)) => {
					assert_eq!(report.messages("username"), [ALREADY_IN_USE]);
					conflicts += 1;
				}
				Err(err) => panic!("Unexpected error: {:?}", err),
			}
		}
		assert_eq!(created, 1);
		assert_eq!(conflicts, 7);

		let count = adapter.count(EntityKind::Account, "username", "racer01", None).await.unwrap();
		assert_eq!(count, 1);
		println!("✅ Exactly one of 8 concurrent registrations persisted");
	}

	#[tokio::test]
	async fn test_delete_account_cascades_grants() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		let alice = adapter.create_account(&account("alice123", "alice@example.com")).await.unwrap();
		let scopes: ScopeSet = [Scope::LOGIN].into_iter().collect();
		let grant_id = adapter.create_grant(alice.user_id, None, &scopes).await.unwrap();

		adapter.delete_account(alice.user_id).await.unwrap();

		assert!(matches!(adapter.read_grant_by_id(grant_id).await, Err(Error::NotFound)));
		assert!(adapter.list_grants(alice.user_id).await.unwrap().is_empty());
		println!("✅ Deleting the account removed its grants");
	}
}

// vim: ts=4
