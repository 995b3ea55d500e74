pub mod exa;

mod error;

pub use error::{Error, Result};

use reqwest::header::{HeaderMap, HeaderName};
use serde_json::{Map, Value};

pub const API_KEY_HEADER: &str = "x-api-key";

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key.parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}
