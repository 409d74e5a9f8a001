//! Collection descriptors and the data-type resolver
//!
//! The "what are we querying" axis, orthogonal to query shapes: a caller
//! names a data type, the resolver maps it to the target collection and its
//! ordering whitelist. Built once at startup, read-only thereafter.

use crate::core::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Describes one queryable collection
///
/// Pairs a data-type name with the identity of the target storage collection,
/// the whitelist of fields callers may order by, and the default order key
/// that guarantees deterministic pagination under malformed `orderBy` input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDescriptor {
    /// Canonical data type name (e.g. "SuperCoachPlayer")
    pub data_type: String,

    /// Identifier of the target collection in the storage backend
    pub collection: String,

    /// Additional names resolving to this descriptor
    /// (e.g. a short name and a fully-qualified name)
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Whitelist of fields callers may order by
    #[serde(default)]
    pub sortable_fields: Vec<String>,

    /// Field used for the default single-key ascending order
    pub default_order_field: String,
}

impl CollectionDescriptor {
    /// Look up a field in the sortable whitelist, case-insensitively
    ///
    /// Returns the canonical spelling so the order spec (and with it the
    /// storage backend) always sees whitelist casing, never caller casing.
    pub fn sortable(&self, field: &str) -> Option<&str> {
        self.sortable_fields
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(field))
            .map(String::as_str)
    }
}

/// Resolver mapping data-type names and aliases to collection descriptors
///
/// Lookup is case-insensitive. Construction is eager: all descriptors are
/// supplied at startup, and a name or alias claimed twice fails the build.
#[derive(Debug)]
pub struct DocumentTypeResolver {
    descriptors: Vec<CollectionDescriptor>,
    /// Lowercased name/alias -> index into `descriptors`
    names: HashMap<String, usize>,
}

impl DocumentTypeResolver {
    /// Build the resolver from a list of collection descriptors
    pub fn build(
        descriptors: impl IntoIterator<Item = CollectionDescriptor>,
    ) -> QueryResult<Self> {
        let descriptors: Vec<CollectionDescriptor> = descriptors.into_iter().collect();
        let mut names = HashMap::new();

        for (index, descriptor) in descriptors.iter().enumerate() {
            let mut claim = |name: &str| -> QueryResult<()> {
                let key = name.to_ascii_lowercase();
                if names.insert(key, index).is_some() {
                    return Err(QueryError::DuplicateDataType {
                        data_type: name.to_string(),
                    });
                }
                Ok(())
            };

            claim(&descriptor.data_type)?;
            for alias in &descriptor.aliases {
                claim(alias)?;
            }
        }

        Ok(Self { descriptors, names })
    }

    /// Resolve a data-type name or alias to its collection descriptor
    pub fn resolve(&self, data_type: &str) -> QueryResult<&CollectionDescriptor> {
        self.names
            .get(&data_type.to_ascii_lowercase())
            .map(|&index| &self.descriptors[index])
            .ok_or_else(|| QueryError::UnknownDataType {
                data_type: data_type.to_string(),
                known: self.data_types().map(String::from).collect(),
            })
    }

    /// Canonical data type names, in registration order
    pub fn data_types(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.data_type.as_str())
    }

    /// Number of registered collections
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> CollectionDescriptor {
        CollectionDescriptor {
            data_type: "SuperCoachPlayer".to_string(),
            collection: "players".to_string(),
            aliases: vec!["Domain.ReadModel.SuperCoachPlayer".to_string()],
            sortable_fields: vec!["Name".to_string(), "Age".to_string()],
            default_order_field: "Id".to_string(),
        }
    }

    fn teams() -> CollectionDescriptor {
        CollectionDescriptor {
            data_type: "SuperCoachTeam".to_string(),
            collection: "teams".to_string(),
            aliases: vec![],
            sortable_fields: vec!["Name".to_string()],
            default_order_field: "Id".to_string(),
        }
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let resolver = DocumentTypeResolver::build([players(), teams()]).unwrap();

        let a = resolver.resolve("SuperCoachPlayer").unwrap();
        let b = resolver.resolve("supercoachplayer").unwrap();
        let c = resolver.resolve("SUPERCOACHPLAYER").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.collection, "players");
    }

    #[test]
    fn test_resolve_by_alias() {
        let resolver = DocumentTypeResolver::build([players()]).unwrap();
        let descriptor = resolver
            .resolve("domain.readmodel.supercoachplayer")
            .unwrap();
        assert_eq!(descriptor.data_type, "SuperCoachPlayer");
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let resolver = DocumentTypeResolver::build([players()]).unwrap();
        let err = resolver.resolve("UnknownThing").unwrap_err();
        match err {
            QueryError::UnknownDataType { data_type, known } => {
                assert_eq!(data_type, "UnknownThing");
                assert_eq!(known, vec!["SuperCoachPlayer".to_string()]);
            }
            other => panic!("expected UnknownDataType, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_name_fails_at_build() {
        let mut other = teams();
        other.data_type = "supercoachPLAYER".to_string();
        let err = DocumentTypeResolver::build([players(), other]).unwrap_err();
        assert!(matches!(err, QueryError::DuplicateDataType { .. }));
    }

    #[test]
    fn test_duplicate_alias_fails_at_build() {
        let mut other = teams();
        other.aliases = vec!["SuperCoachPlayer".to_string()];
        let err = DocumentTypeResolver::build([players(), other]).unwrap_err();
        assert!(matches!(err, QueryError::DuplicateDataType { .. }));
    }

    #[test]
    fn test_sortable_canonicalizes_casing() {
        let descriptor = players();
        assert_eq!(descriptor.sortable("name"), Some("Name"));
        assert_eq!(descriptor.sortable("AGE"), Some("Age"));
        assert_eq!(descriptor.sortable("ShoeSize"), None);
    }
}
