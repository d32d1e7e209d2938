//! Scope grant storage integration tests

#[cfg(test)]
mod tests {
	use panel_store_adapter_sqlite::StoreAdapterSqlite;
	use panel_types::prelude::*;
	use panel_types::scope::{Scope, ScopeSet};
	use panel_types::store_adapter::{Account, CreateAccountData, StoreAdapter};
	use tempfile::TempDir;

	async fn create_test_adapter() -> PnResult<(StoreAdapterSqlite, TempDir)> {
		let tmp_dir = TempDir::new().unwrap();
		let adapter = StoreAdapterSqlite::new(tmp_dir.path().join("panel.db")).await?;
		Ok((adapter, tmp_dir))
	}

	async fn create_user(adapter: &StoreAdapterSqlite, username: &str) -> Account {
		let email = format!("{}@example.com", username);
		adapter
			.create_account(&CreateAccountData {
				username,
				email: &email,
				password_hash: "$2b$10$hash",
			})
			.await
			.expect("Failed to create account")
	}

	fn scopes(list: &[Scope]) -> ScopeSet {
		list.iter().cloned().collect()
	}

	#[tokio::test]
	async fn test_global_and_target_grants_are_distinct() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		let user = create_user(&adapter, "gina01").await;

		let global = adapter.create_grant(user.user_id, None, &scopes(&[Scope::LOGIN])).await;
		let target = adapter
			.create_grant(user.user_id, Some("server-1"), &scopes(&[Scope::LOCATIONS_VIEW]))
			.await;
		assert!(global.is_ok());
		assert!(target.is_ok());

		let read = adapter.read_grant(user.user_id, None).await.unwrap();
		assert!(read.is_global());
		assert_eq!(read.scopes, scopes(&[Scope::LOGIN]));

		let read = adapter.read_grant(user.user_id, Some("server-1")).await.unwrap();
		assert_eq!(read.target.as_deref(), Some("server-1"));
		assert_eq!(read.scopes, scopes(&[Scope::LOCATIONS_VIEW]));

		let all = adapter.list_grants(user.user_id).await.unwrap();
		assert_eq!(all.len(), 2);
		assert!(all[0].is_global());
	}

	#[tokio::test]
	async fn test_second_global_grant_conflicts() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		let user = create_user(&adapter, "gina01").await;

		adapter.create_grant(user.user_id, None, &scopes(&[Scope::LOGIN])).await.unwrap();
		let res = adapter.create_grant(user.user_id, None, &ScopeSet::new()).await;
		let Err(Error::Conflict(report)) = res else {
			panic!("Expected conflict, got {:?}", res);
		};
		assert!(report.contains("target"));

		adapter.create_grant(user.user_id, Some("server-1"), &ScopeSet::new()).await.unwrap();
		let res = adapter.create_grant(user.user_id, Some("server-1"), &ScopeSet::new()).await;
		assert!(matches!(res, Err(Error::Conflict(_))));
		println!("✅ One grant per (subject, target), global included");
	}

	#[tokio::test]
	async fn test_empty_target_rejected() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		let user = create_user(&adapter, "gina01").await;

		let res = adapter.create_grant(user.user_id, Some(""), &ScopeSet::new()).await;
		assert!(matches!(res, Err(Error::ValidationError(_))));
	}

	#[tokio::test]
	async fn test_update_and_delete_grant() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		let user = create_user(&adapter, "gina01").await;
		let grant_id =
			adapter.create_grant(user.user_id, None, &scopes(&[Scope::LOGIN])).await.unwrap();

		let wider = scopes(&[Scope::LOGIN, Scope::LOCATIONS_VIEW]);
		adapter.update_grant_scopes(grant_id, &wider).await.unwrap();
		assert_eq!(adapter.read_grant_by_id(grant_id).await.unwrap().scopes, wider);

		adapter.delete_grant(grant_id).await.unwrap();
		assert!(matches!(adapter.read_grant(user.user_id, None).await, Err(Error::NotFound)));
		assert!(matches!(adapter.delete_grant(grant_id).await, Err(Error::NotFound)));
		assert!(matches!(
			adapter.update_grant_scopes(grant_id, &wider).await,
			Err(Error::NotFound)
		));
	}

	#[tokio::test]
	async fn test_scopes_keep_their_exact_text() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		let user = create_user(&adapter, "gina01").await;
		let odd = scopes(&[Scope::new("locations.view,admin"), Scope::new(" spaced ")]);

		let grant_id = adapter.create_grant(user.user_id, None, &odd).await.unwrap();
		let read = adapter.read_grant_by_id(grant_id).await.unwrap();
		assert_eq!(read.scopes, odd);
		assert!(!read.has(&Scope::LOCATIONS_EDIT));
	}

	#[tokio::test]
	async fn test_merge_creates_then_extends() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		let user = create_user(&adapter, "gina01").await;

		let grant = adapter
			.merge_grant_scopes(user.user_id, Some("loc-1"), &scopes(&[Scope::LOCATIONS_VIEW]))
			.await
			.unwrap();
		assert!(grant.is_persisted());

		let merged = adapter
			.merge_grant_scopes(user.user_id, Some("loc-1"), &scopes(&[Scope::LOCATIONS_EDIT]))
			.await
			.unwrap();
		assert_eq!(merged.grant_id, grant.grant_id);
		assert_eq!(merged.scopes, scopes(&[Scope::LOCATIONS_VIEW, Scope::LOCATIONS_EDIT]));

		let read = adapter.read_grant(user.user_id, Some("loc-1")).await.unwrap();
		assert_eq!(read.scopes, merged.scopes);
		assert!(matches!(
			adapter.merge_grant_scopes(user.user_id, Some(" "), &ScopeSet::new()).await,
			Err(Error::ValidationError(_))
		));
	}

	#[tokio::test]
	async fn test_delete_grants_for_target_keeps_others() {
		let (adapter, _tmp) = create_test_adapter().await.unwrap();
		let a = create_user(&adapter, "alpha01").await;
		let b = create_user(&adapter, "bravo01").await;

		for user in [&a, &b] {
			adapter.create_grant(user.user_id, None, &scopes(&[Scope::LOGIN])).await.unwrap();
			adapter
				.create_grant(user.user_id, Some("server-1"), &scopes(&[Scope::LOCATIONS_VIEW]))
				.await
				.unwrap();
		}

		assert_eq!(adapter.delete_grants_for_target("server-1").await.unwrap(), 2);
		assert_eq!(adapter.list_grants(a.user_id).await.unwrap().len(), 1);
		assert_eq!(adapter.list_grants(b.user_id).await.unwrap().len(), 1);
		assert!(adapter.read_account(a.user_id).await.is_ok());
	}
}

// vim: ts=4
