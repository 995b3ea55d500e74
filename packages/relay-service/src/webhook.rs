//! Inbound provider webhooks.

use serde::Serialize;
use serde_json::json;

use relay_domain::{model::RUNS, signature};
use relay_providers::exa::webhook::{WebhookEnvelope, WebhookEvent};

use crate::{Error, RelayService, Result, now, reconcile::extract_contacts};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
	pub status: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<&'static str>,
}
impl WebhookResponse {
	pub fn processed() -> Self {
		Self { status: "processed", reason: None }
	}

	pub fn ignored(reason: &'static str) -> Self {
		Self { status: "ignored", reason: Some(reason) }
	}
}

impl RelayService {
	/// Verifies, decodes and applies one webhook delivery. `body` must be the raw request bytes.
	pub async fn handle_webhook(
		&self,
		signature_header: Option<&str>,
		body: &[u8],
	) -> Result<WebhookResponse> {
		self.verify_webhook(signature_header, body)?;

		let envelope = WebhookEnvelope::from_slice(body).map_err(|err| Error::InvalidRequest {
			message: format!("Webhook body is not valid JSON: {err}"),
		})?;
		let Some(webset_id) = envelope.webset_id.as_deref().filter(|id| !id.is_empty()) else {
			return Ok(WebhookResponse::ignored("missing_webset_id"));
		};
		let runs = self.documents.find_by_field(RUNS, "websetId", json!(webset_id)).await?;
		let Some(run_id) =
			runs.iter().find_map(|run| run.get("id").and_then(|id| id.as_str())).map(str::to_string)
		else {
			tracing::info!(webset_id, kind = %envelope.kind, "Webhook for unknown webset ignored.");

			return Ok(WebhookResponse::ignored("run_not_found"));
		};
		let event = envelope
			.event()
			.map_err(|err| Error::InvalidRequest { message: err.to_string() })?;

		match event {
			WebhookEvent::ItemEnriched(item) => {
				let item_id = item.item_id.as_deref().unwrap_or_default();
				let fields = extract_contacts(item.enrichment_results(), item.properties.as_ref());
				let Some(outcome) = self.reconcile_item(&run_id, item_id, &fields).await? else {
					tracing::warn!(run_id = %run_id, item_id, "Webhook for unknown item ignored.");

					return Ok(WebhookResponse::ignored("item_not_found"));
				};

				if outcome.changed {
					self.refresh_counters(&run_id).await?;
				}

				tracing::info!(
					run_id = %run_id,
					item_id,
					contributed = outcome.contributed,
					"Webhook enrichment applied."
				);
			},
			WebhookEvent::Other { kind } => {
				tracing::debug!(run_id = %run_id, kind = %kind, "Webhook event acknowledged.");
			},
		}

		Ok(WebhookResponse::processed())
	}

	fn verify_webhook(&self, signature_header: Option<&str>, body: &[u8]) -> Result<()> {
		let cfg = &self.cfg.webhook;
		let Some(secret) = cfg.secret.as_deref() else {
			if cfg.require_signature {
				return Err(unauthorized("Webhook signing secret is not configured."));
			}

			tracing::warn!("Accepting webhook without signature verification.");

			return Ok(());
		};
		let header = signature_header.ok_or_else(|| unauthorized("Missing webhook signature."))?;
		let parsed = signature::parse_header(header)
			.ok_or_else(|| unauthorized("Malformed webhook signature."))?;

		if !signature::verify_parts(&parsed, body, secret) {
			return Err(unauthorized("Invalid webhook signature."));
		}
		if let Some(tolerance) = cfg.tolerance_seconds
			&& !signature::timestamp_within(parsed.timestamp, now().unix_timestamp(), tolerance)
		{
			return Err(unauthorized("Webhook signature timestamp is outside the tolerance."));
		}

		Ok(())
	}
}

fn unauthorized(message: &str) -> Error {
	Error::Unauthorized { message: message.to_string() }
}
