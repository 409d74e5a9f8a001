//! In-memory implementation of StorageSession for testing and development

use crate::ordering::OrderSpec;
use crate::registry::collections::CollectionDescriptor;
use crate::storage::{Document, DocumentCursor, Filter, StorageError, StorageSession};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory document store session
///
/// Useful for testing and development. Uses RwLock for thread-safe access;
/// cursors operate on a snapshot cloned under the read lock, so a request
/// sees a consistent view even while other tasks insert.
#[derive(Clone)]
pub struct InMemorySession {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl InMemorySession {
    /// Create a new empty session
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a document into a collection
    pub fn insert(&self, collection: &str, document: Document) -> Result<(), StorageError> {
        let mut collections = self.collections.write().map_err(|e| StorageError::Lock {
            message: e.to_string(),
        })?;

        collections
            .entry(collection.to_string())
            .or_default()
            .push(document);

        Ok(())
    }

    /// Insert many documents into a collection
    pub fn insert_many(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = Document>,
    ) -> Result<(), StorageError> {
        let mut collections = self.collections.write().map_err(|e| StorageError::Lock {
            message: e.to_string(),
        })?;

        collections
            .entry(collection.to_string())
            .or_default()
            .extend(documents);

        Ok(())
    }
}

impl Default for InMemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageSession for InMemorySession {
    fn query(
        &self,
        collection: &CollectionDescriptor,
    ) -> Result<Box<dyn DocumentCursor>, StorageError> {
        let collections = self.collections.read().map_err(|e| StorageError::Lock {
            message: e.to_string(),
        })?;

        let documents = collections
            .get(&collection.collection)
            .cloned()
            .unwrap_or_default();

        Ok(Box::new(InMemoryCursor { documents }))
    }
}

/// Cursor over a snapshot of one collection; every operation applies eagerly
struct InMemoryCursor {
    documents: Vec<Document>,
}

#[async_trait]
impl DocumentCursor for InMemoryCursor {
    fn filter(mut self: Box<Self>, filter: Filter) -> Box<dyn DocumentCursor> {
        self.documents.retain(|document| filter.matches(document));
        self
    }

    fn order(mut self: Box<Self>, spec: &OrderSpec) -> Box<dyn DocumentCursor> {
        spec.apply(&mut self.documents);
        self
    }

    fn skip(mut self: Box<Self>, n: u64) -> Box<dyn DocumentCursor> {
        let n = usize::try_from(n).unwrap_or(usize::MAX);
        if n >= self.documents.len() {
            self.documents.clear();
        } else {
            self.documents.drain(..n);
        }
        self
    }

    fn take(mut self: Box<Self>, n: u64) -> Box<dyn DocumentCursor> {
        let n = usize::try_from(n).unwrap_or(usize::MAX);
        self.documents.truncate(n);
        self
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.documents.len() as u64)
    }

    async fn collect(self: Box<Self>) -> Result<Vec<Document>, StorageError> {
        Ok(self.documents)
    }
}
