pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Unauthorized: {message}")]
	Unauthorized { message: String },
	#[error("Upstream error: {message}")]
	Upstream { message: String },
	#[error("Timed out: {message}")]
	TimedOut { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	/// Short reason recorded as a run's `lastError`.
	pub fn reason(&self) -> String {
		match self {
			Self::TimedOut { .. } => "timed_out".to_string(),
			other => other.to_string(),
		}
	}
}

impl From<relay_providers::Error> for Error {
	fn from(err: relay_providers::Error) -> Self {
		match err {
			relay_providers::Error::TimedOut { .. } => Self::TimedOut { message: err.to_string() },
			other => Self::Upstream { message: other.to_string() },
		}
	}
}

impl From<relay_storage::Error> for Error {
	fn from(err: relay_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<relay_domain::Error> for Error {
	fn from(err: relay_domain::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::Storage { message: format!("Document has an unexpected shape: {err}") }
	}
}
