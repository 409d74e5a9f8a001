//! Storage collaborator interfaces
//!
//! The dispatch core never touches a storage engine directly: handlers
//! receive a [`StorageSession`] owned by the caller for the lifetime of one
//! request, open a cursor on the resolved collection, compose filters, and
//! let the backend count/order/page/materialize. Real backends live outside
//! this crate; the `in-memory` feature (default) provides the dev/test
//! implementation.

use crate::ordering::OrderSpec;
use crate::registry::collections::CollectionDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[cfg(feature = "in-memory")]
pub mod in_memory;

#[cfg(feature = "in-memory")]
pub use in_memory::InMemorySession;

/// An opaque stored record
pub type Document = Value;

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to {backend}: {message}")]
    Connection { backend: String, message: String },

    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    #[error("failed to acquire store lock: {message}")]
    Lock { message: String },

    #[error("storage backend '{backend}' is unavailable")]
    Unavailable { backend: String },
}

/// One predicate over a document field
///
/// Handlers compose these as a conjunction: every filter added to a cursor
/// must match. There is deliberately no OR/grouping: each query shape is a
/// fixed set of independent predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals value (numeric comparison is width-insensitive)
    Eq { field: String, value: Value },
    /// Field does not equal value
    Ne { field: String, value: Value },
    Gt { field: String, value: Value },
    Gte { field: String, value: Value },
    Lt { field: String, value: Value },
    Lte { field: String, value: Value },
    /// Case-insensitive substring match on a string field
    Contains { field: String, value: String },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lte {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Contains {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Evaluate this predicate against a document
    ///
    /// Backends that push filters down to a query engine translate the enum
    /// instead; the in-memory backend evaluates it directly.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::Eq { field, value } => {
                values_equal(document.get(field).unwrap_or(&Value::Null), value)
            }
            Filter::Ne { field, value } => {
                !values_equal(document.get(field).unwrap_or(&Value::Null), value)
            }
            Filter::Gt { field, value } => compare_field(document, field, value)
                .is_some_and(|ordering| ordering == std::cmp::Ordering::Greater),
            Filter::Gte { field, value } => compare_field(document, field, value)
                .is_some_and(|ordering| ordering != std::cmp::Ordering::Less),
            Filter::Lt { field, value } => compare_field(document, field, value)
                .is_some_and(|ordering| ordering == std::cmp::Ordering::Less),
            Filter::Lte { field, value } => compare_field(document, field, value)
                .is_some_and(|ordering| ordering != std::cmp::Ordering::Greater),
            Filter::Contains { field, value } => document
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.to_lowercase().contains(&value.to_lowercase())),
        }
    }
}

/// Width-insensitive equality: `7` equals `7.0`
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Compare a document field against a filter value when both are comparable
fn compare_field(document: &Document, field: &str, value: &Value) -> Option<std::cmp::Ordering> {
    let actual = document.get(field)?;
    match (actual, value) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.as_str().cmp(y.as_str())),
        _ => None,
    }
}

/// A session against the document store, owned by the caller for one request
///
/// Must not be shared across concurrent requests; the engine only borrows it
/// for the duration of a single `execute` call.
pub trait StorageSession: Send + Sync {
    /// Open a cursor over the given collection
    fn query(&self, collection: &CollectionDescriptor)
    -> Result<Box<dyn DocumentCursor>, StorageError>;
}

/// A composable cursor over one collection
///
/// Combinators are synchronous builders; `count` and `collect` are the only
/// suspension points, where the backend actually runs the query.
#[async_trait]
pub trait DocumentCursor: Send + Sync {
    /// Add one predicate (AND semantics)
    fn filter(self: Box<Self>, filter: Filter) -> Box<dyn DocumentCursor>;

    /// Apply an ordering spec
    fn order(self: Box<Self>, spec: &OrderSpec) -> Box<dyn DocumentCursor>;

    /// Skip the first `n` records
    fn skip(self: Box<Self>, n: u64) -> Box<dyn DocumentCursor>;

    /// Keep at most `n` records
    fn take(self: Box<Self>, n: u64) -> Box<dyn DocumentCursor>;

    /// Count records matching the cursor so far
    async fn count(&self) -> Result<u64, StorageError>;

    /// Materialize the cursor into a concrete sequence
    async fn collect(self: Box<Self>) -> Result<Vec<Document>, StorageError>;
}
