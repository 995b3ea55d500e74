use serde::Serialize;

use relay_domain::export::{self, CSV_CONTENT_TYPE, EXPORT_FOLDER};

use crate::{RelayService, Result, now};

#[derive(Debug, Clone, Serialize)]
pub struct ExportResponse {
	pub url: String,
}

impl RelayService {
	/// Writes the run's items as CSV to blob storage and returns where to fetch it.
	pub async fn export(&self, leadset_id: &str, run_id: &str) -> Result<ExportResponse> {
		self.load_run(run_id).await?;

		let items = self.load_items(run_id).await?;
		let csv = export::items_to_csv(&items)?;
		let key =
			format!("{EXPORT_FOLDER}/{}", export::export_file_name(run_id, now().unix_timestamp()));
		let url = self.blobs.upload(&key, csv, CSV_CONTENT_TYPE).await?;

		tracing::info!(leadset_id, run_id, key = %key, rows = items.len(), "Run exported.");

		Ok(ExportResponse { url })
	}
}
