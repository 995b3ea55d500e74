use serde_json::Value;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, documents, schema};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &relay_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let lock_id: i64 = 5_310_771;
		// Advisory locks are held per connection. Use a single transaction so the lock is scoped to
		// one connection and automatically released when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in schema::statements(schema::render_schema()) {
			sqlx::query(statement).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}

	/// Reads a document under a row lock, lets `apply` edit it and writes it back when `apply`
	/// reports a change. Returns the resulting body, or `None` when the document does not exist.
	pub async fn modify_document<F>(
		&self,
		collection: &str,
		doc_id: &str,
		apply: F,
	) -> Result<Option<Value>>
	where
		F: FnOnce(&mut Value) -> bool,
	{
		let mut tx = self.pool.begin().await?;
		let Some(mut body) = documents::lock_document(&mut *tx, collection, doc_id).await? else {
			tx.rollback().await?;

			return Ok(None);
		};

		if apply(&mut body) {
			documents::replace_document(&mut *tx, collection, doc_id, &body).await?;
		}

		tx.commit().await?;

		Ok(Some(body))
	}

	/// Same as [`Db::modify_document`], but `apply` also receives every document of `related`,
	/// read after the row lock is taken. Callers that serialize on one document therefore always
	/// aggregate state at least as fresh as the previous holder saw.
	pub async fn modify_document_with_related<F>(
		&self,
		collection: &str,
		doc_id: &str,
		related: &str,
		apply: F,
	) -> Result<Option<Value>>
	where
		F: FnOnce(&mut Value, &[Value]) -> bool,
	{
		let mut tx = self.pool.begin().await?;
		let Some(mut body) = documents::lock_document(&mut *tx, collection, doc_id).await? else {
			tx.rollback().await?;

			return Ok(None);
		};
		let related = documents::list_documents(&mut *tx, related).await?;

		if apply(&mut body, &related) {
			documents::replace_document(&mut *tx, collection, doc_id, &body).await?;
		}

		tx.commit().await?;

		Ok(Some(body))
	}
}
