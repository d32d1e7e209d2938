//! Scope grants
//!
//! A grant binds a subject to a set of scopes, either globally (no target)
//! or for a single target such as a location. Grants are created lazily:
//! `get_or_create` hands out an unsaved empty grant and only `set_scopes`
//! writes it.

use std::fmt::Debug;
use std::sync::Arc;

use panel_types::scope::{Scope, ScopeSet};
use panel_types::store_adapter::{ScopeGrant, StoreAdapter};

use crate::prelude::*;

#[derive(Clone)]
pub struct PermService {
	store: Arc<dyn StoreAdapter>,
}

impl Debug for PermService {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PermService").finish_non_exhaustive()
	}
}

impl PermService {
	pub fn new(store: Arc<dyn StoreAdapter>) -> Self {
		Self { store }
	}

	/// Stored grant for (subject, target), or an unsaved empty one
	pub async fn get_or_create(&self, subject: UserId, target: Option<&str>) -> PnResult<ScopeGrant> {
		match self.store.read_grant(subject, target).await {
			Ok(grant) => Ok(grant),
			Err(Error::NotFound) => Ok(ScopeGrant::empty(subject, target)),
			Err(err) => Err(err),
		}
	}

	/// Replace the scope set of `grant` and persist it.
	///
	/// An unsaved grant is inserted; if another writer inserted the same
	/// (subject, target) pair first, the stored row is re-read and updated.
	pub async fn set_scopes(
		&self,
		grant: &mut ScopeGrant,
		scopes: impl IntoIterator<Item = Scope>,
	) -> PnResult<()> {
		let scopes: ScopeSet = scopes.into_iter().collect();
		let target = grant.target.as_deref();

		let grant_id = match grant.grant_id {
			Some(grant_id) => {
				self.store.update_grant_scopes(grant_id, &scopes).await?;
				grant_id
			}
			None => match self.store.create_grant(grant.subject, target, &scopes).await {
				Ok(grant_id) => grant_id,
				Err(Error::Conflict(_)) => {
					debug!("Grant for {} already exists, updating stored row", grant.subject);
					let existing = self.store.read_grant(grant.subject, target).await?;
					let grant_id = existing.grant_id.ok_or(Error::NotFound)?;
					self.store.update_grant_scopes(grant_id, &scopes).await?;
					grant_id
				}
				Err(err) => return Err(err),
			},
		};

		grant.grant_id = Some(grant_id);
		grant.scopes = scopes;
		Ok(())
	}

	/// Add scopes to the (subject, target) grant.
	///
	/// The union happens inside the store, so concurrent grants to the same
	/// pair all survive.
	pub async fn grant(
		&self,
		subject: UserId,
		target: Option<&str>,
		scopes: impl IntoIterator<Item = Scope>,
	) -> PnResult<ScopeGrant> {
		let added: ScopeSet = scopes.into_iter().collect();
		let grant = self.store.merge_grant_scopes(subject, target, &added).await?;
		info!("Granted {:?} to {}", added, subject);
		Ok(grant)
	}

	/// Remove scopes; a grant left empty is deleted
	pub async fn revoke(
		&self,
		subject: UserId,
		target: Option<&str>,
		scopes: impl IntoIterator<Item = Scope>,
	) -> PnResult<ScopeGrant> {
		let mut grant = self.get_or_create(subject, target).await?;
		let Some(grant_id) = grant.grant_id else {
			return Ok(grant);
		};

		let removed: ScopeSet = scopes.into_iter().collect();
		let remaining: Vec<Scope> = grant.scopes.difference(&removed).cloned().collect();
		if remaining.is_empty() {
			self.store.delete_grant(grant_id).await?;
			return Ok(ScopeGrant::empty(subject, target));
		}

		self.set_scopes(&mut grant, remaining).await?;
		Ok(grant)
	}

	/// Target grant first, then the global one. `admin` implies every scope.
	pub async fn check(
		&self,
		subject: UserId,
		scope: &Scope,
		target: Option<&str>,
	) -> PnResult<bool> {
		if target.is_some() {
			match self.store.read_grant(subject, target).await {
				Ok(grant) if grant.has(scope) => return Ok(true),
				Ok(_) | Err(Error::NotFound) => (),
				Err(err) => return Err(err),
			}
		}

		match self.store.read_grant(subject, None).await {
			Ok(grant) => Ok(grant.has(scope)),
			Err(Error::NotFound) => Ok(false),
			Err(err) => Err(err),
		}
	}

	pub async fn require(
		&self,
		subject: UserId,
		scope: &Scope,
		target: Option<&str>,
	) -> PnResult<()> {
		if self.check(subject, scope, target).await? {
			Ok(())
		} else {
			debug!("{} lacks scope '{}'", subject, scope);
			Err(Error::PermissionDenied)
		}
	}

	pub async fn list(&self, subject: UserId) -> PnResult<Vec<ScopeGrant>> {
		self.store.list_grants(subject).await
	}

	/// Drop every grant pointing at `target`
	pub async fn revoke_target(&self, target: &str) -> PnResult<u64> {
		self.store.delete_grants_for_target(target).await
	}
}

// vim: ts=4
