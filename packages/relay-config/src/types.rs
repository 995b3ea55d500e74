use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub exa: Exa,
	#[serde(default)]
	pub webhook: Webhook,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	Postgres,
	/// Process-local documents and blobs. Everything is lost on restart.
	Memory,
}
impl StorageBackend {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Postgres => "postgres",
			Self::Memory => "memory",
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub backend: StorageBackend,
	pub postgres: Option<Postgres>,
	pub blob: Option<Blob>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Blob {
	pub bucket: String,
	pub region: String,
	/// Optional. Custom S3 endpoint, e.g. a local MinIO.
	pub endpoint: Option<String>,
	pub access_key: String,
	pub secret_key: String,
	#[serde(default)]
	pub path_style: bool,
	#[serde(default = "default_url_ttl_seconds")]
	pub url_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Exa {
	#[serde(default = "default_exa_api_base")]
	pub api_base: String,
	pub api_key: String,
	pub timeout_ms: u64,
	/// Number of results requested when a webset search is created.
	pub search_count: u32,
	/// Maximum number of items read from a webset.
	pub list_limit: u32,
	pub poll_interval_ms: u64,
	/// Upper bound for a single wait on a webset to become idle.
	pub idle_timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Webhook {
	pub secret: Option<String>,
	/// When false and no secret is configured, webhooks are accepted unverified.
	#[serde(default = "default_require_signature")]
	pub require_signature: bool,
	/// Optional. Maximum allowed distance between the signed timestamp and now.
	pub tolerance_seconds: Option<u64>,
}
impl Default for Webhook {
	fn default() -> Self {
		Self { secret: None, require_signature: default_require_signature(), tolerance_seconds: None }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_url_ttl_seconds() -> u64 {
	3_600
}

fn default_exa_api_base() -> String {
	"https://api.exa.ai".to_string()
}

fn default_require_signature() -> bool {
	true
}
