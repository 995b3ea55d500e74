mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Blob, Config, Exa, Postgres, Service, Storage, StorageBackend, Webhook};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } =>
			Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

/// Parses, normalizes and validates a config held in memory.
pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	match cfg.storage.backend {
		StorageBackend::Postgres => {
			let Some(postgres) = cfg.storage.postgres.as_ref() else {
				return Err(Error::Validation {
					message: "storage.postgres is required when storage.backend is postgres."
						.to_string(),
				});
			};

			if postgres.dsn.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.postgres.dsn must be non-empty.".to_string(),
				});
			}
			if postgres.pool_max_conns == 0 {
				return Err(Error::Validation {
					message: "storage.postgres.pool_max_conns must be greater than zero."
						.to_string(),
				});
			}
			if cfg.storage.blob.is_none() {
				return Err(Error::Validation {
					message: "storage.blob is required when storage.backend is postgres."
						.to_string(),
				});
			}
		},
		StorageBackend::Memory => {},
	}

	if let Some(blob) = cfg.storage.blob.as_ref() {
		for (label, value) in [
			("storage.blob.bucket", &blob.bucket),
			("storage.blob.region", &blob.region),
			("storage.blob.access_key", &blob.access_key),
			("storage.blob.secret_key", &blob.secret_key),
		] {
			if value.trim().is_empty() {
				return Err(Error::Validation { message: format!("{label} must be non-empty.") });
			}
		}

		if blob.url_ttl_seconds == 0 {
			return Err(Error::Validation {
				message: "storage.blob.url_ttl_seconds must be greater than zero.".to_string(),
			});
		}
	}

	if cfg.exa.api_key.trim().is_empty() {
		return Err(Error::Validation { message: "exa.api_key must be non-empty.".to_string() });
	}
	if !cfg.exa.api_base.starts_with("http://") && !cfg.exa.api_base.starts_with("https://") {
		return Err(Error::Validation {
			message: "exa.api_base must be an http or https URL.".to_string(),
		});
	}

	for (label, value) in [
		("exa.timeout_ms", cfg.exa.timeout_ms),
		("exa.search_count", u64::from(cfg.exa.search_count)),
		("exa.list_limit", u64::from(cfg.exa.list_limit)),
		("exa.poll_interval_ms", cfg.exa.poll_interval_ms),
		("exa.idle_timeout_ms", cfg.exa.idle_timeout_ms),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.exa.poll_interval_ms > cfg.exa.idle_timeout_ms {
		return Err(Error::Validation {
			message: "exa.poll_interval_ms must not exceed exa.idle_timeout_ms.".to_string(),
		});
	}
	if cfg.exa.default_headers.values().any(|value| !value.is_string()) {
		return Err(Error::Validation {
			message: "exa.default_headers values must be strings.".to_string(),
		});
	}
	if cfg.webhook.require_signature && cfg.webhook.secret.is_none() {
		return Err(Error::Validation {
			message: "webhook.secret is required when webhook.require_signature is true."
				.to_string(),
		});
	}
	if cfg.webhook.tolerance_seconds == Some(0) {
		return Err(Error::Validation {
			message: "webhook.tolerance_seconds must be greater than zero when set.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.webhook.secret.as_deref().map(|secret| secret.trim().is_empty()).unwrap_or(false) {
		cfg.webhook.secret = None;
	}
	if let Some(blob) = cfg.storage.blob.as_mut()
		&& blob.endpoint.as_deref().map(|endpoint| endpoint.trim().is_empty()).unwrap_or(false)
	{
		blob.endpoint = None;
	}

	let trimmed = cfg.exa.api_base.trim().trim_end_matches('/').to_string();

	cfg.exa.api_base = trimmed;
}
