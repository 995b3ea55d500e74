//! Webhook envelopes sent by Exa.

use serde::Deserialize;
use serde_json::Value;

use crate::{
	Error, Result,
	exa::types::{EnrichmentResult, WebsetItemProperties},
};

pub const ITEM_ENRICHED: &str = "webset.item.enriched";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEnvelope {
	#[serde(rename = "type", default)]
	pub kind: String,
	#[serde(default)]
	pub webset_id: Option<String>,
	#[serde(default)]
	pub data: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichedItem {
	/// `itemId` in the documented payload; full item objects carry `id` instead.
	#[serde(rename = "itemId", alias = "id", default)]
	pub item_id: Option<String>,
	#[serde(default)]
	pub enrichments: Option<Vec<EnrichmentResult>>,
	#[serde(default)]
	pub properties: Option<WebsetItemProperties>,
}
impl EnrichedItem {
	pub fn enrichment_results(&self) -> &[EnrichmentResult] {
		self.enrichments.as_deref().unwrap_or_default()
	}
}

#[derive(Debug, Clone)]
pub enum WebhookEvent {
	ItemEnriched(EnrichedItem),
	Other { kind: String },
}

impl WebhookEnvelope {
	pub fn from_slice(body: &[u8]) -> Result<Self> {
		Ok(serde_json::from_slice(body)?)
	}

	/// Decodes `data` according to `type`.
	pub fn event(&self) -> Result<WebhookEvent> {
		match self.kind.as_str() {
			ITEM_ENRICHED => {
				let item: EnrichedItem = serde_json::from_value(self.data.clone())?;

				if item.item_id.as_deref().map(str::is_empty).unwrap_or(true) {
					return Err(Error::InvalidResponse {
						message: "Enriched item event is missing data.itemId.".to_string(),
					});
				}

				Ok(WebhookEvent::ItemEnriched(item))
			},
			kind => Ok(WebhookEvent::Other { kind: kind.to_string() }),
		}
	}
}
