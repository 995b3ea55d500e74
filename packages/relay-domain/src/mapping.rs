//! Normalization rules applied when a provider result becomes an item.

pub const UNKNOWN_DOMAIN: &str = "unknown";
pub const UNKNOWN_COMPANY: &str = "Unknown";
pub const SNIPPET_MAX_CHARS: usize = 200;

/// Host part of `url`: the text after the last `//`, up to the first `/`.
pub fn extract_domain(url: Option<&str>) -> String {
	let Some(url) = url.map(str::trim).filter(|url| !url.is_empty()) else {
		return UNKNOWN_DOMAIN.to_string();
	};
	let tail = url.rsplit("//").next().unwrap_or(url);
	let host = tail.split('/').next().unwrap_or_default();

	if host.is_empty() { UNKNOWN_DOMAIN.to_string() } else { host.to_string() }
}

/// First non-empty of nested company name, title, generic name.
pub fn resolve_company_name(
	company_name: Option<&str>,
	title: Option<&str>,
	name: Option<&str>,
) -> String {
	[company_name, title, name]
		.into_iter()
		.flatten()
		.map(str::trim)
		.find(|value| !value.is_empty())
		.unwrap_or(UNKNOWN_COMPANY)
		.to_string()
}

pub fn snippet(description: Option<&str>) -> String {
	description.unwrap_or_default().chars().take(SNIPPET_MAX_CHARS).collect()
}
