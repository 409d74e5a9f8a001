//! Configuration loading and management
//!
//! Collection descriptors can be registered in code or loaded from a YAML
//! table per deployed feature module:
//!
//! ```yaml
//! collections:
//!   - data_type: SuperCoachPlayer
//!     collection: players
//!     aliases:
//!       - Domain.ReadModel.SuperCoachPlayer
//!     sortable_fields: [Name, Age, Points]
//!     default_order_field: Id
//! ```

use crate::registry::collections::CollectionDescriptor;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A table of collection descriptors for one feature module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsConfig {
    /// List of queryable collections
    pub collections: Vec<CollectionDescriptor>,
}

impl CollectionsConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Merge another configuration into this one
    ///
    /// Descriptors are concatenated; colliding names are caught later by
    /// `DocumentTypeResolver::build`, which is where duplicates fail fast.
    pub fn merge(mut self, other: Self) -> Self {
        self.collections.extend(other.collections);
        self
    }

    /// Consume the config into registrable descriptors
    pub fn into_descriptors(self) -> Vec<CollectionDescriptor> {
        self.collections
    }
}
