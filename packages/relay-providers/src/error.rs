pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("Exa returned HTTP {status}: {message}")]
	Api { status: u16, message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Webset {webset_id} did not become idle within {waited_ms} ms.")]
	TimedOut { webset_id: String, waited_ms: u64 },
}
