//! JSON documents addressed by `(collection, doc_id)`.

use serde_json::Value;
use sqlx::PgExecutor;

use crate::{Error, Result};

pub async fn insert_document<'e, E>(
	executor: E,
	collection: &str,
	doc_id: &str,
	body: &Value,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"\
INSERT INTO documents (collection, doc_id, body)
VALUES ($1, $2, $3)
ON CONFLICT (collection, doc_id) DO NOTHING",
	)
	.bind(collection)
	.bind(doc_id)
	.bind(body)
	.execute(executor)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::Conflict(format!("{collection}/{doc_id} already exists.")));
	}

	Ok(())
}

pub async fn get_document<'e, E>(
	executor: E,
	collection: &str,
	doc_id: &str,
) -> Result<Option<Value>>
where
	E: PgExecutor<'e>,
{
	let body = sqlx::query_scalar::<_, Value>(
		"SELECT body FROM documents WHERE collection = $1 AND doc_id = $2 LIMIT 1",
	)
	.bind(collection)
	.bind(doc_id)
	.fetch_optional(executor)
	.await?;

	Ok(body)
}

/// Same as [`get_document`] but holds a row lock until the surrounding transaction ends.
pub async fn lock_document<'e, E>(
	executor: E,
	collection: &str,
	doc_id: &str,
) -> Result<Option<Value>>
where
	E: PgExecutor<'e>,
{
	let body = sqlx::query_scalar::<_, Value>(
		"SELECT body FROM documents WHERE collection = $1 AND doc_id = $2 FOR UPDATE",
	)
	.bind(collection)
	.bind(doc_id)
	.fetch_optional(executor)
	.await?;

	Ok(body)
}

/// Shallow merge: top-level keys of `patch` overwrite those of the stored body.
pub async fn merge_document<'e, E>(
	executor: E,
	collection: &str,
	doc_id: &str,
	patch: &Value,
) -> Result<Option<Value>>
where
	E: PgExecutor<'e>,
{
	let body = sqlx::query_scalar::<_, Value>(
		"\
UPDATE documents
SET body = body || $3, updated_at = now()
WHERE collection = $1 AND doc_id = $2
RETURNING body",
	)
	.bind(collection)
	.bind(doc_id)
	.bind(patch)
	.fetch_optional(executor)
	.await?;

	Ok(body)
}

pub async fn replace_document<'e, E>(
	executor: E,
	collection: &str,
	doc_id: &str,
	body: &Value,
) -> Result<()>
where
	E: PgExecutor<'e>,
{
	sqlx::query(
		"\
UPDATE documents
SET body = $3, updated_at = now()
WHERE collection = $1 AND doc_id = $2",
	)
	.bind(collection)
	.bind(doc_id)
	.bind(body)
	.execute(executor)
	.await?;

	Ok(())
}

/// Documents whose top-level `field` equals `value`, oldest first.
pub async fn find_by_field<'e, E>(
	executor: E,
	collection: &str,
	field: &str,
	value: &Value,
) -> Result<Vec<Value>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_scalar::<_, Value>(
		"\
SELECT body
FROM documents
WHERE collection = $1 AND body -> $2 = $3
ORDER BY created_at ASC, doc_id ASC",
	)
	.bind(collection)
	.bind(field)
	.bind(value)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn list_documents<'e, E>(executor: E, collection: &str) -> Result<Vec<Value>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_scalar::<_, Value>(
		"\
SELECT body
FROM documents
WHERE collection = $1
ORDER BY created_at ASC, doc_id ASC",
	)
	.bind(collection)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
