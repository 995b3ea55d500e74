pub mod backends;
pub mod enrich;
pub mod export;
pub mod mapper;
pub mod memory;
pub mod reconcile;
pub mod runs;
pub mod webhook;

mod error;

pub use enrich::{EnrichRequest, EnrichResponse, EnrichmentType};
pub use error::{Error, Result};
pub use export::ExportResponse;
pub use runs::{RunDetailResponse, RunListResponse, StartRunResponse};
pub use webhook::WebhookResponse;

use std::{future::Future, pin::Pin, sync::Arc};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::task::JoinHandle;

use relay_config::Config;
use relay_providers::exa::types::{
	CreateEnrichmentParameters, Webset, WebsetEnrichment, WebsetItem,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Edits a document in place and reports whether anything changed.
pub type Modifier<'a> = Box<dyn FnOnce(&mut Value) -> bool + Send + 'a>;

/// Edits a document given the documents of a related collection, and reports whether anything
/// changed.
pub type Aggregator<'a> = Box<dyn FnOnce(&mut Value, &[Value]) -> bool + Send + 'a>;

/// JSON documents grouped in collections.
pub trait DocumentStore
where
	Self: Send + Sync,
{
	/// Fails when a document with the same id already exists.
	fn create<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		body: Value,
	) -> BoxFuture<'a, Result<()>>;

	fn get<'a>(&'a self, collection: &'a str, id: &'a str) -> BoxFuture<'a, Result<Option<Value>>>;

	/// Shallow merge of `patch` into the stored document. `None` when the document is missing.
	fn update<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		patch: Value,
	) -> BoxFuture<'a, Result<Option<Value>>>;

	/// Atomic read-modify-write. Concurrent calls on one document are serialized.
	fn modify<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		apply: Modifier<'a>,
	) -> BoxFuture<'a, Result<Option<Value>>>;

	/// Atomic read-modify-write that also reads the documents of `related` while the document is
	/// held. Concurrent calls on one document see every related change committed before them.
	fn modify_with_related<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		related: &'a str,
		apply: Aggregator<'a>,
	) -> BoxFuture<'a, Result<Option<Value>>>;

	fn find_by_field<'a>(
		&'a self,
		collection: &'a str,
		field: &'a str,
		value: Value,
	) -> BoxFuture<'a, Result<Vec<Value>>>;

	/// All documents of a collection in creation order.
	fn list<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Value>>>;
}

pub trait SearchProvider
where
	Self: Send + Sync,
{
	fn create_webset<'a>(&'a self, query: &'a str) -> BoxFuture<'a, relay_providers::Result<Webset>>;

	fn wait_until_idle<'a>(
		&'a self,
		webset_id: &'a str,
	) -> BoxFuture<'a, relay_providers::Result<Webset>>;

	fn list_items<'a>(
		&'a self,
		webset_id: &'a str,
	) -> BoxFuture<'a, relay_providers::Result<Vec<WebsetItem>>>;

	fn create_enrichment<'a>(
		&'a self,
		webset_id: &'a str,
		params: &'a CreateEnrichmentParameters,
	) -> BoxFuture<'a, relay_providers::Result<WebsetEnrichment>>;
}

pub trait BlobStore
where
	Self: Send + Sync,
{
	/// Stores `data` under `key` and returns a URL the object can be fetched from.
	fn upload<'a>(
		&'a self,
		key: &'a str,
		data: Vec<u8>,
		content_type: &'a str,
	) -> BoxFuture<'a, Result<String>>;
}

/// A response plus the background task it started.
pub struct Launched<T> {
	pub response: T,
	pub task: JoinHandle<()>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub sdk_initialized: bool,
	pub storage: &'static str,
}

#[derive(Clone)]
pub struct RelayService {
	pub cfg: Arc<Config>,
	pub documents: Arc<dyn DocumentStore>,
	pub search: Arc<dyn SearchProvider>,
	pub blobs: Arc<dyn BlobStore>,
}
impl RelayService {
	pub fn new(
		cfg: Config,
		documents: Arc<dyn DocumentStore>,
		search: Arc<dyn SearchProvider>,
		blobs: Arc<dyn BlobStore>,
	) -> Self {
		Self { cfg: Arc::new(cfg), documents, search, blobs }
	}

	pub fn health(&self) -> HealthResponse {
		HealthResponse {
			status: "ok",
			sdk_initialized: true,
			storage: self.cfg.storage.backend.as_str(),
		}
	}

	pub(crate) async fn load<T>(&self, collection: &str, id: &str) -> Result<Option<T>>
	where
		T: DeserializeOwned,
	{
		match self.documents.get(collection, id).await? {
			Some(body) => Ok(Some(serde_json::from_value(body)?)),
			None => Ok(None),
		}
	}
}

pub(crate) fn to_document<T>(value: &T) -> Result<Value>
where
	T: Serialize,
{
	Ok(serde_json::to_value(value)?)
}

pub(crate) fn now() -> time::OffsetDateTime {
	time::OffsetDateTime::now_utc()
}
