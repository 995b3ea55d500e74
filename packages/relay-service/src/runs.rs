//! Run lifecycle: launching a search, ingesting its results and reading runs back.

use serde::Serialize;
use serde_json::{Value, json};
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use relay_domain::model::{Item, LEADSETS, Leadset, RUNS, Run, RunStatus, items_collection};

use crate::{Error, Launched, RelayService, Result, mapper, now, to_document};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRunResponse {
	pub run_id: String,
	pub status: &'static str,
	pub webset_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunListResponse {
	pub runs: Vec<Run>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunDetailResponse {
	pub run: Run,
	pub items: Vec<Item>,
}

struct Ingestion {
	run_id: String,
	leadset_id: String,
	webset_id: String,
}
impl Ingestion {
	fn ids(&self) -> (&str, &str, &str) {
		(&self.run_id, &self.leadset_id, &self.webset_id)
	}
}

impl RelayService {
	pub async fn start_run(&self, leadset_id: &str) -> Result<Launched<StartRunResponse>> {
		let leadset = self.load_leadset(leadset_id).await?;
		let Some(prompt) = leadset.prompt.as_deref().map(str::trim).filter(|p| !p.is_empty())
		else {
			return Err(Error::InvalidRequest {
				message: format!("Leadset {leadset_id} has no prompt."),
			});
		};
		let webset = self.search.create_webset(prompt).await?;
		let run_id = new_run_id();
		let run = Run::started(run_id.clone(), leadset_id.to_string(), webset.id.clone(), now());

		self.documents.create(RUNS, &run_id, to_document(&run)?).await?;
		self.documents
			.update(LEADSETS, leadset_id, json!({ "status": "running", "lastRunId": run_id }))
			.await?;

		tracing::info!(leadset_id, run_id = %run_id, webset_id = %webset.id, "Run started.");

		let ingestion = Ingestion {
			run_id: run_id.clone(),
			leadset_id: leadset_id.to_string(),
			webset_id: webset.id.clone(),
		};
		let service = self.clone();
		let task = tokio::spawn(async move { service.ingest(ingestion).await });

		Ok(Launched {
			response: StartRunResponse { run_id, status: "started", webset_id: webset.id },
			task,
		})
	}

	/// Runs of a leadset, newest first.
	pub async fn list_runs(&self, leadset_id: &str) -> Result<RunListResponse> {
		let mut runs = Vec::new();

		for body in self.documents.find_by_field(RUNS, "leadsetId", json!(leadset_id)).await? {
			match serde_json::from_value::<Run>(body) {
				Ok(run) => runs.push(run),
				Err(err) => tracing::warn!(leadset_id, error = %err, "Skipping malformed run."),
			}
		}

		runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));

		Ok(RunListResponse { runs })
	}

	pub async fn get_run(&self, leadset_id: &str, run_id: &str) -> Result<RunDetailResponse> {
		let run = self.load_run(run_id).await?;

		if run.leadset_id != leadset_id {
			return Err(run_not_found(run_id));
		}

		let items = self.load_items(run_id).await?;

		Ok(RunDetailResponse { run, items })
	}

	pub(crate) async fn load_leadset(&self, leadset_id: &str) -> Result<Leadset> {
		let mut leadset: Leadset = self.load(LEADSETS, leadset_id).await?.ok_or_else(|| {
			Error::NotFound { message: format!("Leadset {leadset_id} does not exist.") }
		})?;

		if leadset.id.is_empty() {
			leadset.id = leadset_id.to_string();
		}

		Ok(leadset)
	}

	pub(crate) async fn load_run(&self, run_id: &str) -> Result<Run> {
		self.load(RUNS, run_id).await?.ok_or_else(|| run_not_found(run_id))
	}

	/// Items of a run in creation order. Malformed documents are skipped.
	pub(crate) async fn load_items(&self, run_id: &str) -> Result<Vec<Item>> {
		let mut items = Vec::new();

		for body in self.documents.list(&items_collection(run_id)).await? {
			match serde_json::from_value::<Item>(body) {
				Ok(item) => items.push(item),
				Err(err) => tracing::warn!(run_id, error = %err, "Skipping malformed item."),
			}
		}

		Ok(items)
	}

	pub(crate) async fn set_leadset_status(&self, leadset_id: &str, status: RunStatus) {
		if let Err(err) =
			self.documents.update(LEADSETS, leadset_id, json!({ "status": status.as_str() })).await
		{
			tracing::error!(leadset_id, error = %err, "Failed to update leadset status.");
		}
	}

	async fn ingest(&self, ingestion: Ingestion) {
		let (run_id, leadset_id, webset_id) = ingestion.ids();

		match self.try_ingest(&ingestion).await {
			Ok(found) => {
				tracing::info!(run_id, leadset_id, webset_id, found, "Run ingestion completed.");

				self.set_leadset_status(leadset_id, RunStatus::Idle).await;
			},
			Err(err) => {
				tracing::error!(run_id, webset_id, error = %err, "Run ingestion failed.");

				let patch = json!({
					"status": RunStatus::Failed.as_str(),
					"lastError": err.reason(),
					"completedAt": timestamp(),
				});

				if let Err(err) = self.documents.update(RUNS, run_id, patch).await {
					tracing::error!(run_id, error = %err, "Failed to mark run as failed.");
				}

				self.set_leadset_status(leadset_id, RunStatus::Failed).await;
			},
		}
	}

	async fn try_ingest(&self, ingestion: &Ingestion) -> Result<usize> {
		let (run_id, leadset_id, webset_id) = ingestion.ids();

		self.search.wait_until_idle(webset_id).await?;

		let listed = self.search.list_items(webset_id).await?;
		let collection = items_collection(run_id);
		let ingested_at = now();
		let mut item_ids = Vec::with_capacity(listed.len());

		for webset_item in &listed {
			let item = mapper::map_item(webset_item, run_id, leadset_id, ingested_at);
			let stored = match to_document(&item) {
				Ok(body) => self.documents.create(&collection, &item.item_id, body).await,
				Err(err) => Err(err),
			};

			match stored {
				Ok(()) => item_ids.push(item.item_id),
				Err(err) => tracing::warn!(
					run_id,
					item_id = %webset_item.id,
					error = %err,
					"Failed to store item. Skipping."
				),
			}
		}

		let found = item_ids.len();
		let patch = json!({
			"status": RunStatus::Idle.as_str(),
			"counters": { "found": found, "enriched": 0, "selected": 0 },
			"itemIds": item_ids,
			"lastError": Value::Null,
			"completedAt": timestamp(),
		});

		self.documents.update(RUNS, run_id, patch).await?;

		Ok(found)
	}
}

pub(crate) fn run_not_found(run_id: &str) -> Error {
	Error::NotFound { message: format!("Run {run_id} does not exist.") }
}

pub(crate) fn timestamp() -> Value {
	now().format(&Rfc3339).map(Value::String).unwrap_or(Value::Null)
}

fn new_run_id() -> String {
	let simple = Uuid::new_v4().simple().to_string();

	format!("run_{}", &simple[..8])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn run_ids_have_eight_hex_digits() {
		let id = new_run_id();

		assert!(id.starts_with("run_"));
		assert_eq!(id.len(), 12);
		assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
	}
}
