pub mod types;
pub mod webhook;

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::{Error, Result};
use types::{
	CreateEnrichmentParameters, CreateWebsetParameters, ItemPage, SearchParameters, Webset,
	WebsetEnrichment, WebsetItem, WebsetStatus,
};

const WEBSETS_PATH: &str = "/websets/v0/websets";

#[derive(Debug, Clone)]
pub struct ExaClient {
	http: Client,
	api_base: String,
	search_count: u32,
	list_limit: u32,
	poll_interval: Duration,
	idle_timeout: Duration,
}
impl ExaClient {
	pub fn new(cfg: &relay_config::Exa) -> Result<Self> {
		let http = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.default_headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.build()?;

		Ok(Self {
			http,
			api_base: cfg.api_base.clone(),
			search_count: cfg.search_count,
			list_limit: cfg.list_limit,
			poll_interval: Duration::from_millis(cfg.poll_interval_ms),
			idle_timeout: Duration::from_millis(cfg.idle_timeout_ms),
		})
	}

	pub async fn create_webset(&self, query: &str) -> Result<Webset> {
		let body = CreateWebsetParameters {
			search: SearchParameters { query: query.to_string(), count: self.search_count },
			external_id: None,
		};

		send_json(self.http.post(self.url(WEBSETS_PATH)).json(&body)).await
	}

	pub async fn get_webset(&self, webset_id: &str) -> Result<Webset> {
		send_json(self.http.get(self.webset_url(webset_id, ""))).await
	}

	/// Polls the webset until it reports `idle`, bounded by the configured idle timeout.
	pub async fn wait_until_idle(&self, webset_id: &str) -> Result<Webset> {
		let poll = async {
			loop {
				let webset = self.get_webset(webset_id).await?;

				if webset.status == WebsetStatus::Idle {
					return Ok(webset);
				}

				tracing::debug!(webset_id, status = ?webset.status, "Webset is not idle yet.");

				tokio::time::sleep(self.poll_interval).await;
			}
		};

		match tokio::time::timeout(self.idle_timeout, poll).await {
			Ok(result) => result,
			Err(_) => Err(Error::TimedOut {
				webset_id: webset_id.to_string(),
				waited_ms: self.idle_timeout.as_millis() as u64,
			}),
		}
	}

	/// Lists up to `list_limit` items of the webset, following pagination cursors.
	///
	/// Entries that do not decode as items are logged and skipped; they still count toward the
	/// limit.
	pub async fn list_items(&self, webset_id: &str) -> Result<Vec<WebsetItem>> {
		let limit = self.list_limit as usize;
		let mut items = Vec::new();
		let mut listed = 0_usize;
		let mut cursor: Option<String> = None;

		while listed < limit {
			let remaining = (limit - listed).to_string();
			let mut query = vec![("limit", remaining.as_str())];

			if let Some(cursor) = cursor.as_deref() {
				query.push(("cursor", cursor));
			}

			let page: ItemPage =
				send_json(self.http.get(self.webset_url(webset_id, "/items")).query(&query)).await?;

			for entry in page.data.into_iter().take(limit - listed) {
				listed += 1;

				match serde_json::from_value::<WebsetItem>(entry) {
					Ok(item) => items.push(item),
					Err(err) => tracing::warn!(
						webset_id,
						error = %err,
						"Listed item did not match the expected shape. Skipping."
					),
				}
			}

			match (page.has_more, page.next_cursor) {
				(true, Some(next)) if !next.is_empty() && cursor.as_deref() != Some(next.as_str()) =>
					cursor = Some(next),
				(true, _) => {
					tracing::warn!(
						webset_id,
						"Item listing reported more pages without a usable cursor."
					);

					break;
				},
				(false, _) => break,
			}
		}

		Ok(items)
	}

	pub async fn create_enrichment(
		&self,
		webset_id: &str,
		params: &CreateEnrichmentParameters,
	) -> Result<WebsetEnrichment> {
		send_json(self.http.post(self.webset_url(webset_id, "/enrichments")).json(params)).await
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.api_base, path)
	}

	fn webset_url(&self, webset_id: &str, suffix: &str) -> String {
		format!("{}{WEBSETS_PATH}/{webset_id}{suffix}", self.api_base)
	}
}

async fn send_json<T>(request: RequestBuilder) -> Result<T>
where
	T: DeserializeOwned,
{
	let res = request.send().await?;
	let status = res.status();

	if !status.is_success() {
		let message = res.text().await.unwrap_or_default();

		return Err(Error::Api { status: status.as_u16(), message });
	}

	let bytes = res.bytes().await?;

	serde_json::from_slice(&bytes).map_err(|err| Error::InvalidResponse {
		message: format!("Exa response did not match the expected shape: {err}."),
	})
}
