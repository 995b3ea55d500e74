use std::sync::Arc;

use color_eyre::eyre;

use relay_config::{Config, StorageBackend};
use relay_providers::exa::ExaClient;
use relay_service::{
	BlobStore, DocumentStore, RelayService,
	memory::{MemoryBlobStore, MemoryDocumentStore},
};
use relay_storage::{blob::ObjectStore, db::Db};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RelayService>,
}
impl AppState {
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let search = Arc::new(ExaClient::new(&config.exa)?);
		let blobs: Arc<dyn BlobStore> = match config.storage.blob.as_ref() {
			Some(blob) => Arc::new(ObjectStore::new(blob)),
			None => {
				tracing::warn!("No blob storage configured. Exports are kept in memory.");

				Arc::new(MemoryBlobStore::new())
			},
		};
		let documents: Arc<dyn DocumentStore> = match config.storage.backend {
			StorageBackend::Postgres => {
				let postgres = config.storage.postgres.as_ref().ok_or_else(|| {
					eyre::eyre!("storage.postgres is required when storage.backend is postgres.")
				})?;
				let db = Db::connect(postgres).await?;

				db.ensure_schema().await?;

				Arc::new(db)
			},
			StorageBackend::Memory => {
				tracing::warn!("Using in-memory document storage. Data is lost on restart.");

				Arc::new(MemoryDocumentStore::new())
			},
		};

		tracing::info!(storage = config.storage.backend.as_str(), "Storage initialized.");

		Ok(Self::from_service(RelayService::new(config, documents, search, blobs)))
	}

	pub fn from_service(service: RelayService) -> Self {
		Self { service: Arc::new(service) }
	}
}
