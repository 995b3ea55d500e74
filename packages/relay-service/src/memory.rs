//! Process-local backends for `storage.backend = "memory"` and for tests.

use std::{
	collections::HashMap,
	sync::{Mutex, MutexGuard},
};

use serde_json::Value;

use crate::{Aggregator, BlobStore, BoxFuture, DocumentStore, Error, Modifier, Result};

#[derive(Debug, Default)]
struct Collection {
	order: Vec<String>,
	docs: HashMap<String, Value>,
}
impl Collection {
	fn ordered(&self) -> impl Iterator<Item = &Value> {
		self.order.iter().filter_map(|id| self.docs.get(id))
	}
}

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
	collections: Mutex<HashMap<String, Collection>>,
}
impl MemoryDocumentStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<String, Collection>> {
		self.collections.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn create_sync(&self, collection: &str, id: &str, body: Value) -> Result<()> {
		let mut collections = self.lock();
		let entry = collections.entry(collection.to_string()).or_default();

		if entry.docs.contains_key(id) {
			return Err(Error::Storage { message: format!("{collection}/{id} already exists.") });
		}

		entry.order.push(id.to_string());
		entry.docs.insert(id.to_string(), body);

		Ok(())
	}

	fn get_sync(&self, collection: &str, id: &str) -> Option<Value> {
		self.lock().get(collection).and_then(|entry| entry.docs.get(id)).cloned()
	}

	fn update_sync(&self, collection: &str, id: &str, patch: Value) -> Result<Option<Value>> {
		let Value::Object(patch) = patch else {
			return Err(Error::Storage { message: "Update patch must be a JSON object.".to_string() });
		};
		let mut collections = self.lock();
		let Some(doc) = collections.get_mut(collection).and_then(|entry| entry.docs.get_mut(id))
		else {
			return Ok(None);
		};
		let Some(object) = doc.as_object_mut() else {
			return Err(Error::Storage { message: format!("{collection}/{id} is not an object.") });
		};

		object.extend(patch);

		Ok(Some(doc.clone()))
	}

	fn modify_sync(&self, collection: &str, id: &str, apply: Modifier<'_>) -> Option<Value> {
		let mut collections = self.lock();
		let doc = collections.get_mut(collection).and_then(|entry| entry.docs.get_mut(id))?;
		let mut draft = doc.clone();

		if apply(&mut draft) {
			*doc = draft.clone();
		}

		Some(draft)
	}

	fn modify_with_related_sync(
		&self,
		collection: &str,
		id: &str,
		related: &str,
		apply: Aggregator<'_>,
	) -> Option<Value> {
		let mut collections = self.lock();
		let related: Vec<Value> = collections
			.get(related)
			.map(|entry| entry.ordered().cloned().collect())
			.unwrap_or_default();
		let doc = collections.get_mut(collection).and_then(|entry| entry.docs.get_mut(id))?;
		let mut draft = doc.clone();

		if apply(&mut draft, &related) {
			*doc = draft.clone();
		}

		Some(draft)
	}

	fn find_sync(&self, collection: &str, field: &str, value: &Value) -> Vec<Value> {
		self.lock()
			.get(collection)
			.map(|entry| {
				entry.ordered().filter(|doc| doc.get(field) == Some(value)).cloned().collect()
			})
			.unwrap_or_default()
	}

	fn list_sync(&self, collection: &str) -> Vec<Value> {
		self.lock()
			.get(collection)
			.map(|entry| entry.ordered().cloned().collect())
			.unwrap_or_default()
	}
}

impl DocumentStore for MemoryDocumentStore {
	fn create<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		body: Value,
	) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move { self.create_sync(collection, id, body) })
	}

	fn get<'a>(&'a self, collection: &'a str, id: &'a str) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move { Ok(self.get_sync(collection, id)) })
	}

	fn update<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		patch: Value,
	) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move { self.update_sync(collection, id, patch) })
	}

	fn modify<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		apply: Modifier<'a>,
	) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move { Ok(self.modify_sync(collection, id, apply)) })
	}

	fn modify_with_related<'a>(
		&'a self,
		collection: &'a str,
		id: &'a str,
		related: &'a str,
		apply: Aggregator<'a>,
	) -> BoxFuture<'a, Result<Option<Value>>> {
		Box::pin(async move { Ok(self.modify_with_related_sync(collection, id, related, apply)) })
	}

	fn find_by_field<'a>(
		&'a self,
		collection: &'a str,
		field: &'a str,
		value: Value,
	) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(self.find_sync(collection, field, &value)) })
	}

	fn list<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Value>>> {
		Box::pin(async move { Ok(self.list_sync(collection)) })
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
	pub content_type: String,
	pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct MemoryBlobStore {
	blobs: Mutex<HashMap<String, StoredBlob>>,
}
impl MemoryBlobStore {
	pub const URL_SCHEME: &'static str = "memory://";

	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &str) -> Option<StoredBlob> {
		self.blobs.lock().unwrap_or_else(|err| err.into_inner()).get(key).cloned()
	}

	/// Resolves a URL returned by [`BlobStore::upload`] back to the stored object.
	pub fn get_by_url(&self, url: &str) -> Option<StoredBlob> {
		self.get(url.strip_prefix(Self::URL_SCHEME)?)
	}
}

impl BlobStore for MemoryBlobStore {
	fn upload<'a>(
		&'a self,
		key: &'a str,
		data: Vec<u8>,
		content_type: &'a str,
	) -> BoxFuture<'a, Result<String>> {
		Box::pin(async move {
			self.blobs
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.insert(key.to_string(), StoredBlob { content_type: content_type.to_string(), data });

			Ok(format!("{}{key}", Self::URL_SCHEME))
		})
	}
}
