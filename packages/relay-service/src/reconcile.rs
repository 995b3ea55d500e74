//! Applies enrichment results to stored items, whichever channel delivers them.

use serde::Deserialize;
use serde_json::{Value, json};

use relay_domain::{
	enrichment::{ContactFields, MergeOutcome},
	model::{Counters, Enrichment, Item, RUNS, items_collection},
};
use relay_providers::exa::types::{EnrichmentFormat, EnrichmentResult, WebsetItemProperties};

use crate::{RelayService, Result};

const LINKEDIN_HOST: &str = "linkedin.com";

/// Structured results first, then contact fields merged onto the item's properties.
pub fn extract_contacts(
	results: &[EnrichmentResult],
	properties: Option<&WebsetItemProperties>,
) -> ContactFields {
	let mut fields = ContactFields::default();

	for result in results {
		let Some(value) = result.first_value() else {
			continue;
		};
		let slot = match result.format {
			EnrichmentFormat::Email => &mut fields.email,
			EnrichmentFormat::Phone => &mut fields.phone,
			EnrichmentFormat::Url if value.contains(LINKEDIN_HOST) => &mut fields.linkedin_url,
			_ => continue,
		};

		if slot.is_none() {
			*slot = Some(value.to_string());
		}
	}

	if let Some(properties) = properties {
		fields.fill_missing(ContactFields {
			email: non_empty(properties.email.as_deref()),
			phone: non_empty(properties.phone.as_deref()),
			linkedin_url: non_empty(properties.linkedin_url.as_deref())
				.or_else(|| non_empty(properties.linkedin.as_deref())),
		});
	}

	fields
}

fn non_empty(value: Option<&str>) -> Option<String> {
	value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

impl RelayService {
	/// Merges `fields` into one item's enrichment. `None` when the item does not exist.
	pub async fn reconcile_item(
		&self,
		run_id: &str,
		item_id: &str,
		fields: &ContactFields,
	) -> Result<Option<MergeOutcome>> {
		let collection = items_collection(run_id);
		let mut outcome = MergeOutcome::default();
		let updated = self
			.documents
			.modify(
				&collection,
				item_id,
				Box::new(|body: &mut Value| {
					let Some(mut enrichment) = read_enrichment(body) else {
						tracing::warn!(run_id, item_id, "Stored enrichment is malformed. Skipping merge.");

						return false;
					};

					outcome = enrichment.merge(fields);

					outcome.changed && write_field(body, "enrichment", &enrichment)
				}),
			)
			.await?;

		if updated.is_none() {
			return Ok(None);
		}

		tracing::debug!(
			run_id,
			item_id,
			contributed = outcome.contributed,
			changed = outcome.changed,
			"Enrichment merged."
		);

		Ok(Some(outcome))
	}

	/// Recomputes `enriched` and `selected` from item state; `found` is left as stored.
	///
	/// Items are counted while the run document is held, so concurrent refreshes never leave an
	/// older count behind.
	pub async fn refresh_counters(&self, run_id: &str) -> Result<Option<Counters>> {
		let collection = items_collection(run_id);
		let updated = self
			.documents
			.modify_with_related(
				RUNS,
				run_id,
				&collection,
				Box::new(move |body: &mut Value, items: &[Value]| {
					let (enriched, selected) = count_items(run_id, items);
					let Some(object) = body.as_object_mut() else {
						return false;
					};
					let counters = object.entry("counters").or_insert_with(|| json!({}));

					if !counters.is_object() {
						*counters = json!({});
					}

					let before = counters.clone();

					counters["enriched"] = json!(enriched);
					counters["selected"] = json!(selected);

					if counters.get("found").is_none() {
						counters["found"] = json!(0);
					}

					*counters != before
				}),
			)
			.await?;
		let Some(run) = updated else {
			return Ok(None);
		};

		Ok(Some(serde_json::from_value(run.get("counters").cloned().unwrap_or_default())?))
	}
}

/// `(enriched, selected)` over the stored items of a run.
fn count_items(run_id: &str, items: &[Value]) -> (u64, u64) {
	let mut enriched = 0_u64;
	let mut selected = 0_u64;

	for body in items {
		let item: Item = match Item::deserialize(body) {
			Ok(item) => item,
			Err(err) => {
				tracing::warn!(run_id, error = %err, "Skipping malformed item while counting.");

				continue;
			},
		};

		if item.enrichment.has_contact() {
			enriched += 1;
		}
		if item.selected {
			selected += 1;
		}
	}

	(enriched, selected)
}

pub(crate) fn read_enrichment(body: &Value) -> Option<Enrichment> {
	match body.get("enrichment") {
		None | Some(Value::Null) => Some(Enrichment::default()),
		Some(value) => serde_json::from_value(value.clone()).ok(),
	}
}

/// Replaces one top-level field of a document object.
pub(crate) fn write_field<T>(body: &mut Value, key: &str, value: &T) -> bool
where
	T: serde::Serialize,
{
	let (Some(object), Ok(value)) = (body.as_object_mut(), serde_json::to_value(value)) else {
		return false;
	};

	object.insert(key.to_string(), value);

	true
}
