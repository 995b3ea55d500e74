//! Provider items to stored items.

use time::OffsetDateTime;

use relay_domain::{
	mapping,
	model::{Enrichment, Entity, Item, PLATFORM_WEB},
};
use relay_providers::exa::types::WebsetItem;

pub fn map_item(item: &WebsetItem, run_id: &str, leadset_id: &str, now: OffsetDateTime) -> Item {
	let properties = &item.properties;
	let source_url =
		properties.url.as_deref().map(str::trim).filter(|url| !url.is_empty()).map(str::to_string);
	let company = mapping::resolve_company_name(
		properties.company.as_ref().and_then(|company| company.name.as_deref()),
		properties.title.as_deref(),
		properties.name.as_deref(),
	);

	Item {
		item_id: item.id.clone(),
		run_id: run_id.to_string(),
		leadset_id: leadset_id.to_string(),
		entity: Entity { company, domain: mapping::extract_domain(source_url.as_deref()) },
		snippet: mapping::snippet(properties.description.as_deref()),
		source_url,
		platform: PLATFORM_WEB.to_string(),
		recency: now,
		score: 0.0,
		enrichment: Enrichment::default(),
		selected: false,
	}
}
