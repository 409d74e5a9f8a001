//! Startup-built registries: query shapes and queryable collections
//!
//! Both registries are constructed once by the engine builder and are
//! immutable for the process lifetime; request tasks read them concurrently
//! without synchronization.

pub mod collections;
pub mod shapes;

pub use collections::{CollectionDescriptor, DocumentTypeResolver};
pub use shapes::QueryTypeRegistry;
