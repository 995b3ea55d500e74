//! Documents persisted by the relay. Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const LEADSETS: &str = "leadsets";
pub const RUNS: &str = "leadsetRuns";
pub const CREATED_BY_SYSTEM: &str = "system";
pub const PLATFORM_WEB: &str = "Web";

/// Collection path holding the items of one run.
pub fn items_collection(run_id: &str) -> String {
	format!("{RUNS}/{run_id}/items")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
	Running,
	Enriching,
	Idle,
	Failed,
}
impl RunStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Running => "running",
			Self::Enriching => "enriching",
			Self::Idle => "idle",
			Self::Failed => "failed",
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStatus {
	#[default]
	None,
	Queued,
	Done,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
	#[serde(default)]
	pub found: u64,
	#[serde(default)]
	pub enriched: u64,
	#[serde(default)]
	pub selected: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cost {
	#[serde(default)]
	pub estimate: f64,
	#[serde(default)]
	pub spent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leadset {
	#[serde(default)]
	pub id: String,
	pub prompt: Option<String>,
	pub status: Option<String>,
	pub last_run_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
	pub id: String,
	pub leadset_id: String,
	pub webset_id: Option<String>,
	pub status: RunStatus,
	#[serde(default)]
	pub counters: Counters,
	#[serde(default)]
	pub cost: Cost,
	#[serde(with = "time::serde::rfc3339")]
	pub started_at: OffsetDateTime,
	#[serde(default)]
	pub created_by: String,
	#[serde(default)]
	pub item_ids: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_error: Option<String>,
	#[serde(default, with = "time::serde::rfc3339::option", skip_serializing_if = "Option::is_none")]
	pub completed_at: Option<OffsetDateTime>,
}
impl Run {
	pub fn started(
		id: String,
		leadset_id: String,
		webset_id: String,
		started_at: OffsetDateTime,
	) -> Self {
		Self {
			id,
			leadset_id,
			webset_id: Some(webset_id),
			status: RunStatus::Running,
			counters: Counters::default(),
			cost: Cost::default(),
			started_at,
			created_by: CREATED_BY_SYSTEM.to_string(),
			item_ids: Vec::new(),
			last_error: None,
			completed_at: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
	pub company: String,
	pub domain: String,
}

/// Contact data gathered for an item, plus where the enrichment stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrichment {
	#[serde(default)]
	pub status: EnrichmentStatus,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub linkedin_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
	pub item_id: String,
	pub run_id: String,
	pub leadset_id: String,
	pub entity: Entity,
	#[serde(default)]
	pub snippet: String,
	pub source_url: Option<String>,
	#[serde(default)]
	pub platform: String,
	#[serde(with = "time::serde::rfc3339")]
	pub recency: OffsetDateTime,
	#[serde(default)]
	pub score: f64,
	#[serde(default)]
	pub enrichment: Enrichment,
	#[serde(default)]
	pub selected: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn item_serializes_with_camel_case_keys() {
		let item = Item {
			item_id: "I1".to_string(),
			run_id: "run_1".to_string(),
			leadset_id: "L1".to_string(),
			entity: Entity { company: "Acme".to_string(), domain: "acme.com".to_string() },
			snippet: String::new(),
			source_url: Some("https://acme.com".to_string()),
			platform: PLATFORM_WEB.to_string(),
			recency: OffsetDateTime::UNIX_EPOCH,
			score: 0.0,
			enrichment: Enrichment::default(),
			selected: false,
		};
		let value = serde_json::to_value(&item).expect("Item must serialize.");

		assert_eq!(value["itemId"], "I1");
		assert_eq!(value["sourceUrl"], "https://acme.com");
		assert_eq!(value["recency"], "1970-01-01T00:00:00Z");
		assert_eq!(value["enrichment"], serde_json::json!({ "status": "none" }));
	}

	#[test]
	fn run_tolerates_missing_optional_fields() {
		let run: Run = serde_json::from_value(serde_json::json!({
			"id": "run_1",
			"leadsetId": "L1",
			"websetId": "ws_1",
			"status": "enriching",
			"startedAt": "2025-01-01T00:00:00Z"
		}))
		.expect("Run must deserialize.");

		assert_eq!(run.status, RunStatus::Enriching);
		assert_eq!(run.counters, Counters::default());
		assert!(run.item_ids.is_empty());
		assert!(run.completed_at.is_none());
	}

	#[test]
	fn items_collection_nests_under_run() {
		assert_eq!(items_collection("run_ab12cd34"), "leadsetRuns/run_ab12cd34/items");
	}
}
