//! Query type registry
//!
//! Maps discriminator strings to shape descriptors. Built eagerly at startup
//! from the descriptors the feature modules supply; immutable afterwards, so
//! concurrent request tasks read it without locking.

use crate::core::error::{QueryError, QueryResult};
use crate::core::shape::ShapeDescriptor;
use indexmap::IndexMap;

/// Registry mapping discriminators to query shape descriptors
#[derive(Debug)]
pub struct QueryTypeRegistry {
    /// Lowercased discriminator -> descriptor, in registration order
    shapes: IndexMap<String, ShapeDescriptor>,
}

impl QueryTypeRegistry {
    /// Build the registry from shape descriptors
    ///
    /// Fails fast with [`QueryError::DuplicateDiscriminator`] when two
    /// descriptors share a discriminator case-insensitively; this is a
    /// configuration error that must never reach request time.
    pub fn build(descriptors: impl IntoIterator<Item = ShapeDescriptor>) -> QueryResult<Self> {
        let mut shapes = IndexMap::new();

        for descriptor in descriptors {
            let key = descriptor.discriminator().to_ascii_lowercase();
            if shapes.insert(key, descriptor.clone()).is_some() {
                return Err(QueryError::DuplicateDiscriminator {
                    discriminator: descriptor.discriminator().to_string(),
                });
            }
        }

        Ok(Self { shapes })
    }

    /// Resolve a discriminator to its shape descriptor
    ///
    /// Case-insensitive, to tolerate client casing variance.
    pub fn resolve(&self, discriminator: &str) -> QueryResult<&ShapeDescriptor> {
        self.shapes
            .get(&discriminator.to_ascii_lowercase())
            .ok_or_else(|| QueryError::UnknownQueryType {
                query_type: discriminator.to_string(),
                known: self.discriminators().map(String::from).collect(),
            })
    }

    /// Registered discriminators in their original casing, registration order
    pub fn discriminators(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.shapes.values().map(ShapeDescriptor::discriminator)
    }

    /// Number of registered shapes
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
