//! Wire types of the Exa Websets API, decoded once at the boundary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebsetStatus {
	Idle,
	Pending,
	Running,
	Paused,
	#[serde(other)]
	Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webset {
	pub id: String,
	pub status: WebsetStatus,
	#[serde(default)]
	pub external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchParameters {
	pub query: String,
	pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebsetParameters {
	pub search: SearchParameters,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub external_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentFormat {
	Text,
	Date,
	Number,
	Options,
	Email,
	Phone,
	Url,
	#[serde(other)]
	Other,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateEnrichmentParameters {
	pub description: String,
	pub format: EnrichmentFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebsetEnrichment {
	pub id: String,
	#[serde(default)]
	pub status: Option<String>,
	#[serde(default)]
	pub format: Option<EnrichmentFormat>,
}

/// One enrichment value set attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResult {
	pub format: EnrichmentFormat,
	#[serde(default)]
	pub result: Option<Vec<String>>,
	#[serde(default)]
	pub enrichment_id: Option<String>,
}
impl EnrichmentResult {
	pub fn first_value(&self) -> Option<&str> {
		self.result
			.as_deref()
			.unwrap_or_default()
			.iter()
			.map(|value| value.trim())
			.find(|value| !value.is_empty())
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
	Company,
	Person,
	Article,
	ResearchPaper,
	Custom,
	#[default]
	#[serde(other)]
	Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyProperties {
	pub name: Option<String>,
	pub location: Option<String>,
	pub industry: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonProperties {
	pub name: Option<String>,
	pub position: Option<String>,
}

/// Item properties. Contact fields appear here when the provider merges enrichment output into
/// the entity instead of listing structured results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebsetItemProperties {
	#[serde(rename = "type", default)]
	pub kind: ItemKind,
	pub url: Option<String>,
	pub description: Option<String>,
	pub title: Option<String>,
	pub name: Option<String>,
	pub company: Option<CompanyProperties>,
	pub person: Option<PersonProperties>,
	pub email: Option<String>,
	pub phone: Option<String>,
	pub linkedin_url: Option<String>,
	pub linkedin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsetItem {
	pub id: String,
	#[serde(default)]
	pub webset_id: Option<String>,
	#[serde(default)]
	pub properties: WebsetItemProperties,
	#[serde(default)]
	pub enrichments: Option<Vec<EnrichmentResult>>,
}
impl WebsetItem {
	pub fn enrichment_results(&self) -> &[EnrichmentResult] {
		self.enrichments.as_deref().unwrap_or_default()
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPage {
	/// Raw entries. The client decodes them one at a time.
	pub data: Vec<serde_json::Value>,
	#[serde(default)]
	pub has_more: bool,
	#[serde(default)]
	pub next_cursor: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_company_item_with_enrichments() {
		let item: WebsetItem = serde_json::from_value(serde_json::json!({
			"id": "witem_1",
			"object": "webset_item",
			"websetId": "ws_1",
			"properties": {
				"type": "company",
				"url": "https://acme.com/",
				"description": "Makes anvils",
				"company": { "name": "Acme", "logoUrl": null }
			},
			"enrichments": [
				{ "object": "enrichment_result", "format": "email", "result": ["a@acme.com"] },
				{ "format": "options", "result": null },
				{ "format": "brand_new_format", "result": ["x"] }
			]
		}))
		.expect("Item must decode.");

		assert_eq!(item.properties.kind, ItemKind::Company);
		assert_eq!(
			item.properties.company.as_ref().and_then(|company| company.name.as_deref()),
			Some("Acme")
		);
		assert_eq!(item.enrichments.as_ref().map(Vec::len), Some(3));
		assert_eq!(item.enrichment_results()[2].format, EnrichmentFormat::Other);
		assert_eq!(item.enrichment_results()[1].first_value(), None);
	}

	#[test]
	fn decodes_item_without_properties_or_enrichments() {
		let item: WebsetItem = serde_json::from_value(serde_json::json!({
			"id": "witem_2",
			"enrichments": null
		}))
		.expect("Item must decode.");

		assert_eq!(item.properties.kind, ItemKind::Other);
		assert!(item.enrichment_results().is_empty());
	}

	#[test]
	fn first_value_skips_blank_entries() {
		let result = EnrichmentResult {
			format: EnrichmentFormat::Phone,
			result: Some(vec![" ".to_string(), "555".to_string()]),
			enrichment_id: None,
		};

		assert_eq!(result.first_value(), Some("555"));
	}

	#[test]
	fn unknown_webset_status_decodes_as_other() {
		let webset: Webset = serde_json::from_value(serde_json::json!({
			"id": "ws_1",
			"status": "archived"
		}))
		.expect("Webset must decode.");

		assert_eq!(webset.status, WebsetStatus::Other);
	}
}
