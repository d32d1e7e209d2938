//! Utility functions for database operations

use sqlx::sqlite::SqliteRow;

use panel_types::prelude::*;
use panel_types::validate::{ALREADY_IN_USE, ValidationReport};

/// Log database errors
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a query result to a value using a closure
pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> PnResult<T>
where
	F: FnOnce(&SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(ref row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

/// Collect result iterator into a vector
pub(crate) fn collect_res<T>(
	iter: impl Iterator<Item = Result<T, sqlx::Error>> + Unpin,
) -> PnResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

/// Map a write error. Unique constraint violations become field conflicts.
pub(crate) fn map_write_err(err: sqlx::Error) -> Error {
	if let sqlx::Error::Database(ref db_err) = err
		&& db_err.is_unique_violation()
	{
		let field = conflict_field(db_err.message());
		debug!("DB: unique constraint hit on {}", field);
		let mut report = ValidationReport::new();
		report.add(field, ALREADY_IN_USE);
		return Error::Conflict(report);
	}
	inspect(&err);
	Error::DbError
}

/// Field named by a SQLite unique constraint message.
///
/// Column constraints read `UNIQUE constraint failed: users.username`,
/// expression indexes read `UNIQUE constraint failed: index 'idx_name'`.
fn conflict_field(message: &str) -> &str {
	let detail = message.rsplit(": ").next().unwrap_or(message);
	if let Some(index) = detail.strip_prefix("index ") {
		return match index.trim_matches('\'') {
			"idx_grants_subject_target" => "target",
			other => other,
		};
	}
	let column = detail.split(", ").next().unwrap_or(detail);
	column.rsplit('.').next().unwrap_or(column)
}

/// Decode a text column holding a UUID
pub(crate) fn parse_uuid(s: &str) -> Result<uuid::Uuid, sqlx::Error> {
	uuid::Uuid::parse_str(s).map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_conflict_field() {
		assert_eq!(conflict_field("UNIQUE constraint failed: users.username"), "username");
		assert_eq!(conflict_field("UNIQUE constraint failed: locations.code"), "code");
		assert_eq!(
			conflict_field("UNIQUE constraint failed: index 'idx_grants_subject_target'"),
			"target"
		);
	}
}

// vim: ts=4
