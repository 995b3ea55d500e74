use serde_json::json;
use tokio::runtime::Runtime;

use relay_config::Postgres;
use relay_storage::{Error, db::Db, documents};
use relay_testkit::TestDatabase;

#[test]
#[ignore = "Requires external Postgres. Set RELAY_PG_DSN to run."]
fn documents_support_merge_modify_and_lookup() {
	let Some(dsn) = relay_testkit::env_dsn() else {
		eprintln!("Skipping documents_support_merge_modify_and_lookup; set RELAY_PG_DSN to run this test.");

		return;
	};
	let rt = Runtime::new().expect("Failed to build runtime.");

	rt.block_on(async {
		let test_db = TestDatabase::new(&dsn).await.expect("Failed to create test database.");
		let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
		let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

		db.ensure_schema().await.expect("Failed to ensure schema.");
		db.ensure_schema().await.expect("Schema bootstrap must be repeatable.");

		let body = json!({ "id": "run_1", "leadsetId": "L1", "status": "running" });

		documents::insert_document(&db.pool, "leadsetRuns", "run_1", &body)
			.await
			.expect("Failed to insert document.");

		let duplicate = documents::insert_document(&db.pool, "leadsetRuns", "run_1", &body).await;

		assert!(matches!(duplicate, Err(Error::Conflict(_))));

		let merged = documents::merge_document(
			&db.pool,
			"leadsetRuns",
			"run_1",
			&json!({ "status": "idle", "counters": { "found": 3 } }),
		)
		.await
		.expect("Failed to merge document.")
		.expect("Document must exist.");

		assert_eq!(merged["status"], "idle");
		assert_eq!(merged["leadsetId"], "L1");

		let modified = db
			.modify_document("leadsetRuns", "run_1", |body| {
				body["counters"]["found"] = json!(4);

				true
			})
			.await
			.expect("Failed to modify document.")
			.expect("Document must exist.");

		assert_eq!(modified["counters"]["found"], 4);

		let missing = db
			.modify_document("leadsetRuns", "run_missing", |_| true)
			.await
			.expect("Failed to modify document.");

		assert!(missing.is_none());

		let found = documents::find_by_field(&db.pool, "leadsetRuns", "leadsetId", &json!("L1"))
			.await
			.expect("Failed to query documents.");

		assert_eq!(found.len(), 1);
		assert_eq!(found[0]["counters"]["found"], 4);

		let listed = documents::list_documents(&db.pool, "leadsetRuns/run_1/items")
			.await
			.expect("Failed to list documents.");

		assert!(listed.is_empty());

		for (item_id, email) in [("I1", Some("a@b.com")), ("I2", None)] {
			documents::insert_document(
				&db.pool,
				"leadsetRuns/run_1/items",
				item_id,
				&json!({ "itemId": item_id, "email": email }),
			)
			.await
			.expect("Failed to insert item.");
		}

		let recounted = db
			.modify_document_with_related(
				"leadsetRuns",
				"run_1",
				"leadsetRuns/run_1/items",
				|body, items| {
					let with_email = items.iter().filter(|item| item["email"].is_string()).count();

					body["counters"]["enriched"] = json!(with_email);

					true
				},
			)
			.await
			.expect("Failed to modify document.")
			.expect("Document must exist.");

		assert_eq!(recounted["counters"]["enriched"], 1);

		db.pool.close().await;
		test_db.cleanup().await.expect("Failed to clean up test database.");
	});
}
