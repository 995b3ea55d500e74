//! S3-compatible object storage for exported files.

use std::time::Duration;

use aws_sdk_s3::{
	Client,
	config::{Credentials, Region},
	error::DisplayErrorContext,
	presigning::PresigningConfig,
	primitives::ByteStream,
};

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct ObjectStore {
	client: Client,
	bucket: String,
	url_ttl: Duration,
}
impl ObjectStore {
	pub fn new(cfg: &relay_config::Blob) -> Self {
		let credentials =
			Credentials::new(&cfg.access_key, &cfg.secret_key, None, None, "relay-storage");
		let mut builder = aws_sdk_s3::Config::builder()
			.credentials_provider(credentials)
			.region(Region::new(cfg.region.clone()))
			.force_path_style(cfg.path_style);

		if let Some(endpoint) = cfg.endpoint.as_deref() {
			builder = builder.endpoint_url(endpoint);
		}

		tracing::info!(bucket = %cfg.bucket, "Object store client initialized.");

		Self {
			client: Client::from_conf(builder.build()),
			bucket: cfg.bucket.clone(),
			url_ttl: Duration::from_secs(cfg.url_ttl_seconds),
		}
	}

	pub async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
		let size = data.len();

		self.client
			.put_object()
			.bucket(&self.bucket)
			.key(key)
			.content_type(content_type)
			.body(ByteStream::from(data))
			.send()
			.await
			.map_err(|err| Error::Blob { message: DisplayErrorContext(&err).to_string() })?;

		tracing::info!(bucket = %self.bucket, key, size, "Object uploaded.");

		Ok(())
	}

	/// Time-limited GET URL for `key`.
	pub async fn presigned_url(&self, key: &str) -> Result<String> {
		let presigning = PresigningConfig::expires_in(self.url_ttl)
			.map_err(|err| Error::Blob { message: err.to_string() })?;
		let request = self
			.client
			.get_object()
			.bucket(&self.bucket)
			.key(key)
			.presigned(presigning)
			.await
			.map_err(|err| Error::Blob { message: DisplayErrorContext(&err).to_string() })?;

		Ok(request.uri().to_string())
	}
}
