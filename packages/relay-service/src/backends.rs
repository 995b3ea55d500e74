//! Production implementations of the service seams.

use serde_json::Value;

use relay_providers::{
	Result as ProviderResult,
	exa::{
		ExaClient,
		types::{CreateEnrichmentParameters, Webset, WebsetEnrichment, WebsetItem},
	},
};
use relay_storage::{blob::ObjectStore, db::Db, documents};

use crate::{
	Aggregator, BlobStore, BoxFuture, DocumentStore, Modifier, Result, SearchProvider,
};

impl DocumentStore for Db {
	fn create<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		body: Value,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			documents::insert_document(&self.pool, collection, id, &body).await?;

			Ok(())
		})
	}

	fn get<'a>(&'a self, collection: &'a str, id: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move { Ok(documents::get_document(&self.pool, collection, id).await?) })
	}

	fn update<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		patch: Value,
	) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move {
			Ok(documents::merge_document(&self.pool, collection, id, &patch).await?)
		})
	}

	fn modify<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		apply: Modifier<'a>,
	) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move { Ok(self.modify_document(collection, id, apply).await?) })
	}

	fn modify_with_related<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		related: &'a str,
		apply: Aggregator<'a>,
	) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move {
			Ok(self.modify_document_with_related(collection, id, related, apply).await?)
		})
	}

	fn find_by_field<'a>(
		&'a self,
		collection: &'a str,
		field: &'a str,
		value: Value,
	) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move {
			Ok(documents::find_by_field(&self.pool, collection, field, &value).await?)
		})
	}

	fn list<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(documents::list_documents(&self.pool, collection).await?) })
	}
}

impl SearchProvider for ExaClient {
	fn create_webset<'a>(&'a self, query: &'a str) -> BoxFuture<'a, ProviderResult<Webset>> {
		Box::pin(ExaClient::create_webset(self, query))
	}

	fn wait_until_idle<'a>(&'a self, webset_id: &'a str) -> BoxFuture<'a, ProviderResult<Webset>> {
		Box::pin(ExaClient::wait_until_idle(self, webset_id))
	}

	fn list_items<'a>(
		&'a self,
		webset_id: &'a str,
	) -> BoxFuture<'a, ProviderResult<Vec<WebsetItem>>> {
		Box::pin(ExaClient::list_items(self, webset_id))
	}

	fn create_enrichment<'a>(
		&'a self,
		webset_id: &'a str,
		params: &'a CreateEnrichmentParameters,
	) -> BoxFuture<'a, ProviderResult<WebsetEnrichment>> {
		Box::pin(ExaClient::create_enrichment(self, webset_id, params))
	}
}

impl BlobStore for ObjectStore {
	fn upload<'a>(
		&'a self,
		key: &'a str,
		data: Vec<u8>,
		content_type: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move {
			self.put(key, data, content_type).await?;

			Ok(self.presigned_url(key).await?)
		})
	}
}
