//! Enrichment requests and the poll that collects their results.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use relay_domain::model::{RUNS, RunStatus, items_collection};
use relay_providers::exa::types::{CreateEnrichmentParameters, EnrichmentFormat};

use crate::{
	Error, Launched, RelayService, Result,
	reconcile::{self, extract_contacts},
	runs::{run_not_found, timestamp},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentType {
	Email,
	Phone,
	LinkedinUrl,
}
impl EnrichmentType {
	pub const ALL: [Self; 3] = [Self::Email, Self::Phone, Self::LinkedinUrl];

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"email" => Some(Self::Email),
			"phone" => Some(Self::Phone),
			"linkedin_url" => Some(Self::LinkedinUrl),
			_ => None,
		}
	}

	pub fn parameters(self) -> CreateEnrichmentParameters {
		let (description, format) = match self {
			Self::Email => ("Find the contact email address", EnrichmentFormat::Email),
			Self::Phone => ("Find the phone number", EnrichmentFormat::Phone),
			Self::LinkedinUrl => ("Find the LinkedIn profile URL", EnrichmentFormat::Url),
		};

		CreateEnrichmentParameters { description: description.to_string(), format }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichRequest {
	#[serde(rename = "itemIds")]
	pub item_ids: Vec<String>,
	/// Defaults to every type when absent.
	#[serde(default)]
	pub enrichment_types: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichResponse {
	pub status: &'static str,
	pub triggered_enrichments: usize,
}

struct EnrichmentPoll {
	run_id: String,
	webset_id: String,
	item_ids: Vec<String>,
}

impl RelayService {
	pub async fn enrich(
		&self,
		leadset_id: &str,
		run_id: &str,
		request: EnrichRequest,
	) -> Result<Launched<EnrichResponse>> {
		let run = self.load_run(run_id).await?;

		if run.leadset_id != leadset_id {
			return Err(run_not_found(run_id));
		}

		let Some(webset_id) = run.webset_id.filter(|id| !id.is_empty()) else {
			return Err(Error::NotFound { message: format!("Run {run_id} has no webset.") });
		};

		if request.item_ids.is_empty() {
			return Err(Error::InvalidRequest { message: "itemIds must be non-empty.".to_string() });
		}

		let types = requested_types(request.enrichment_types.as_deref())?;

		self.documents
			.update(RUNS, run_id, json!({ "status": RunStatus::Enriching.as_str() }))
			.await?;

		let mut triggered = 0;

		for kind in types {
			match self.search.create_enrichment(&webset_id, &kind.parameters()).await {
				Ok(enrichment) => {
					triggered += 1;

					tracing::info!(
						run_id,
						webset_id = %webset_id,
						enrichment_id = %enrichment.id,
						?kind,
						"Enrichment created."
					);
				},
				Err(err) => tracing::warn!(
					run_id,
					webset_id = %webset_id,
					?kind,
					error = %err,
					"Failed to create enrichment. Skipping."
				),
			}
		}

		if triggered == 0 {
			self.reset_enriching_run(run_id).await;

			return Err(Error::Upstream { message: "No enrichment could be created.".to_string() });
		}
		if let Err(err) = self.select_items(run_id, &request.item_ids).await {
			self.reset_enriching_run(run_id).await;

			return Err(err);
		}

		let poll = EnrichmentPoll {
			run_id: run_id.to_string(),
			webset_id,
			item_ids: request.item_ids,
		};
		let service = self.clone();
		let task = tokio::spawn(async move { service.poll_enrichments(poll).await });

		Ok(Launched {
			response: EnrichResponse { status: "success", triggered_enrichments: triggered },
			task,
		})
	}

	/// Marks the requested items as selected and queued, then recounts the run.
	async fn select_items(&self, run_id: &str, item_ids: &[String]) -> Result<()> {
		let collection = items_collection(run_id);

		for item_id in item_ids {
			let selected = self
				.documents
				.modify(&collection, item_id, Box::new(select_for_enrichment))
				.await?;

			if selected.is_none() {
				tracing::warn!(run_id, item_id = %item_id, "Requested item does not exist. Skipping.");
			}
		}

		self.refresh_counters(run_id).await?;

		Ok(())
	}

	/// Returns a run left in `enriching` by a failed request to `idle`.
	async fn reset_enriching_run(&self, run_id: &str) {
		if let Err(err) =
			self.documents.update(RUNS, run_id, json!({ "status": RunStatus::Idle.as_str() })).await
		{
			tracing::error!(run_id, error = %err, "Failed to reset run after enrichment request.");
		}
	}

	async fn poll_enrichments(&self, poll: EnrichmentPoll) {
		let run_id = poll.run_id.as_str();
		// Either way the run returns to idle so enrichment can be retried.
		let last_error = match self.try_poll_enrichments(&poll).await {
			Ok(updated) => {
				tracing::info!(run_id, updated, "Enrichment polling finished.");

				Value::Null
			},
			Err(err) => {
				tracing::error!(run_id, error = %err, "Enrichment polling failed.");

				Value::String(err.reason())
			},
		};
		let patch = json!({
			"status": RunStatus::Idle.as_str(),
			"lastError": last_error,
			"completedAt": timestamp(),
		});

		if let Err(err) = self.documents.update(RUNS, run_id, patch).await {
			tracing::error!(run_id, error = %err, "Failed to reset run after enrichment.");
		}
	}

	async fn try_poll_enrichments(&self, poll: &EnrichmentPoll) -> Result<usize> {
		let run_id = poll.run_id.as_str();
		let requested: HashSet<&str> = poll.item_ids.iter().map(String::as_str).collect();

		self.search.wait_until_idle(&poll.webset_id).await?;

		let mut updated = 0;

		for item in self.search.list_items(&poll.webset_id).await? {
			if !requested.contains(item.id.as_str()) {
				continue;
			}

			let fields = extract_contacts(item.enrichment_results(), Some(&item.properties));

			if fields.is_empty() {
				continue;
			}

			match self.reconcile_item(run_id, &item.id, &fields).await {
				Ok(Some(outcome)) if outcome.contributed_any() => updated += 1,
				Ok(Some(_)) => {},
				Ok(None) =>
					tracing::warn!(run_id, item_id = %item.id, "Polled item is not stored. Skipping."),
				Err(err) => tracing::warn!(
					run_id,
					item_id = %item.id,
					error = %err,
					"Failed to reconcile polled item. Skipping."
				),
			}
		}

		self.refresh_counters(run_id).await?;

		Ok(updated)
	}
}

fn requested_types(raw: Option<&[String]>) -> Result<Vec<EnrichmentType>> {
	let Some(raw) = raw else {
		return Ok(EnrichmentType::ALL.to_vec());
	};
	let mut types = Vec::with_capacity(raw.len());

	for value in raw {
		let kind = EnrichmentType::parse(value).ok_or_else(|| Error::InvalidRequest {
			message: format!("Unknown enrichment type: {value}."),
		})?;

		if !types.contains(&kind) {
			types.push(kind);
		}
	}

	if types.is_empty() {
		return Err(Error::InvalidRequest {
			message: "enrichment_types must be non-empty when provided.".to_string(),
		});
	}

	Ok(types)
}

/// Marks an item as selected and queued without touching collected contact fields.
fn select_for_enrichment(body: &mut Value) -> bool {
	let Some(mut enrichment) = reconcile::read_enrichment(body) else {
		return false;
	};
	let queued = enrichment.queue();
	let already_selected = body.get("selected").and_then(Value::as_bool).unwrap_or(false);
	let mut changed = false;

	if queued {
		changed |= reconcile::write_field(body, "enrichment", &enrichment);
	}
	if !already_selected {
		changed |= reconcile::write_field(body, "selected", &true);
	}

	changed
}
