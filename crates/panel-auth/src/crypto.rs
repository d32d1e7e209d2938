//! Password hashing, run on the worker pool

use panel_types::worker::WorkerPool;

use crate::prelude::*;

const BCRYPT_COST: u32 = 10;

fn generate_password_hash_sync(password: Box<str>) -> PnResult<Box<str>> {
	let hash = bcrypt::hash(password.as_ref(), BCRYPT_COST)
		.map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))?;

	Ok(hash.into())
}

pub async fn generate_password_hash(worker: &WorkerPool, password: Box<str>) -> PnResult<Box<str>> {
	worker.try_run_immed(move || generate_password_hash_sync(password)).await
}

fn check_password_sync(password: Box<str>, password_hash: Box<str>) -> PnResult<()> {
	let res = bcrypt::verify(password.as_ref(), &password_hash).map_err(|_| Error::Unauthorized)?;
	if res { Ok(()) } else { Err(Error::Unauthorized) }
}

/// `Error::Unauthorized` unless `password` matches
pub async fn check_password(
	worker: &WorkerPool,
	password: Box<str>,
	password_hash: Box<str>,
) -> PnResult<()> {
	worker.try_run_immed(move || check_password_sync(password, password_hash)).await
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_hash_and_check() {
		let worker = WorkerPool::new(1, 1);
		let hash = generate_password_hash(&worker, "hunter22".into()).await.unwrap();
		assert!(hash.starts_with("$2"));

		assert!(check_password(&worker, "hunter22".into(), hash.clone()).await.is_ok());
		let res = check_password(&worker, "hunter23".into(), hash).await;
		assert!(matches!(res, Err(Error::Unauthorized)));
	}

	#[tokio::test]
	async fn test_malformed_hash_is_unauthorized() {
		let worker = WorkerPool::new(1, 0);
		let res = check_password(&worker, "hunter22".into(), "not-a-hash".into()).await;
		assert!(matches!(res, Err(Error::Unauthorized)));
	}
}

// vim: ts=4
