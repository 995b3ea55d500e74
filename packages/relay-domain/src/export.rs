use crate::{Error, Result, model::Item};

pub const EXPORT_FOLDER: &str = "exports";
pub const CSV_CONTENT_TYPE: &str = "text/csv";
pub const CSV_HEADER: [&str; 7] =
	["Company", "Domain", "Score", "Snippet", "Email", "LinkedIn", "Phone"];

pub fn export_file_name(run_id: &str, unix_seconds: i64) -> String {
	format!("{run_id}_{unix_seconds}.csv")
}

/// Renders one row per item; missing contact fields become empty cells.
pub fn items_to_csv(items: &[Item]) -> Result<Vec<u8>> {
	let mut writer = csv::Writer::from_writer(Vec::new());

	writer.write_record(CSV_HEADER)?;

	for item in items {
		let score = item.score.to_string();
		let enrichment = &item.enrichment;

		writer.write_record([
			item.entity.company.as_str(),
			item.entity.domain.as_str(),
			score.as_str(),
			item.snippet.as_str(),
			enrichment.email.as_deref().unwrap_or_default(),
			enrichment.linkedin_url.as_deref().unwrap_or_default(),
			enrichment.phone.as_deref().unwrap_or_default(),
		])?;
	}

	writer.into_inner().map_err(|err| Error::CsvFlush { message: err.error().to_string() })
}
