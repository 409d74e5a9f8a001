//! Engine assembly and request execution
//!
//! The composition root: [`EngineBuilder`] collects shape descriptors,
//! collection descriptors, and handlers from feature modules, then `build()`
//! freezes them into the immutable registries a [`QueryEngine`] reads for the
//! process lifetime. There is no ambient global state: the engine is an explicit
//! value passed to whoever serves requests.

use crate::config::CollectionsConfig;
use crate::core::error::QueryResult;
use crate::core::request::{ReadModelRequest, ReadModelResponse};
use crate::core::shape::ShapeDescriptor;
use crate::decode::QueryDecoder;
use crate::dispatch::{Dispatcher, HandlerRegistry, QueryHandler};
use crate::registry::collections::{CollectionDescriptor, DocumentTypeResolver};
use crate::registry::shapes::QueryTypeRegistry;
use crate::storage::StorageSession;
use std::sync::Arc;

/// A feature module contributing query shapes, collections, and handlers
///
/// The discovery source for engine assembly: each deployed feature implements
/// this once and the host registers it on the builder. The engine places no
/// constraint on how the lists are produced, only that they are complete
/// before the first request is served.
///
/// # Example
///
/// ```rust,ignore
/// struct FantasyModule;
///
/// impl QueryModule for FantasyModule {
///     fn name(&self) -> &str {
///         "fantasy"
///     }
///
///     fn shapes(&self) -> Vec<ShapeDescriptor> {
///         vec![PlayersByTeam::descriptor(), PlayersByName::descriptor()]
///     }
///
///     fn collections(&self) -> Vec<CollectionDescriptor> {
///         CollectionsConfig::from_yaml_str(COLLECTIONS_YAML)?.into_descriptors()
///     }
///
///     fn register_handlers(&self, handlers: &mut HandlerRegistry) -> QueryResult<()> {
///         handlers.register::<PlayersByTeam, _>(PlayersByTeamHandler)?;
///         handlers.register::<PlayersByName, _>(PlayersByNameHandler)
///     }
/// }
/// ```
pub trait QueryModule: Send + Sync {
    /// Unique module name (used in startup logs)
    fn name(&self) -> &str;

    /// Shape descriptors this module contributes
    fn shapes(&self) -> Vec<ShapeDescriptor>;

    /// Collection descriptors this module contributes
    fn collections(&self) -> Vec<CollectionDescriptor>;

    /// Bind this module's handlers
    fn register_handlers(&self, handlers: &mut HandlerRegistry) -> QueryResult<()>;
}

/// Builder for assembling a [`QueryEngine`]
///
/// # Example
///
/// ```rust,ignore
/// let engine = QueryEngine::builder()
///     .register_module(&FantasyModule)?
///     .build()?;
/// ```
pub struct EngineBuilder {
    shapes: Vec<ShapeDescriptor>,
    collections: Vec<CollectionDescriptor>,
    handlers: HandlerRegistry,
    discriminator_field: Option<String>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            shapes: Vec::new(),
            collections: Vec::new(),
            handlers: HandlerRegistry::new(),
            discriminator_field: None,
        }
    }

    /// Override the discriminator field name (default `"queryType"`)
    pub fn with_discriminator_field(mut self, field: impl Into<String>) -> Self {
        self.discriminator_field = Some(field.into());
        self
    }

    /// Register a single shape descriptor
    pub fn register_shape(mut self, descriptor: ShapeDescriptor) -> Self {
        self.shapes.push(descriptor);
        self
    }

    /// Register a single collection descriptor
    pub fn register_collection(mut self, descriptor: CollectionDescriptor) -> Self {
        self.collections.push(descriptor);
        self
    }

    /// Register every collection from a loaded configuration
    pub fn register_collections_config(mut self, config: CollectionsConfig) -> Self {
        self.collections.extend(config.into_descriptors());
        self
    }

    /// Bind a handler to shape type `S`
    pub fn register_handler<S, H>(mut self, handler: H) -> QueryResult<Self>
    where
        S: crate::core::shape::QueryShape + 'static,
        H: QueryHandler<S> + 'static,
    {
        self.handlers.register::<S, H>(handler)?;
        Ok(self)
    }

    /// Register a feature module's shapes, collections, and handlers
    pub fn register_module(mut self, module: &dyn QueryModule) -> QueryResult<Self> {
        tracing::info!(module = module.name(), "registering query module");
        self.shapes.extend(module.shapes());
        self.collections.extend(module.collections());
        module.register_handlers(&mut self.handlers)?;
        Ok(self)
    }

    /// Freeze the registries and produce the engine
    ///
    /// All duplicate registrations fail here, at startup, never at request
    /// time.
    pub fn build(self) -> QueryResult<QueryEngine> {
        let registry = QueryTypeRegistry::build(self.shapes)?;
        let collections = DocumentTypeResolver::build(self.collections)?;

        tracing::info!(
            query_types = registry.len(),
            collections = collections.len(),
            handlers = self.handlers.len(),
            "query engine ready"
        );

        let mut decoder = QueryDecoder::new(Arc::new(registry));
        if let Some(field) = self.discriminator_field {
            decoder = decoder.with_discriminator_field(field);
        }

        Ok(QueryEngine {
            decoder,
            collections,
            dispatcher: Dispatcher::new(self.handlers),
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The assembled read-model query engine
///
/// Immutable after `build()`; safe to share behind an `Arc` across any
/// number of concurrent request tasks. The storage session is *not* part of
/// the engine; the caller owns one per request and lends it to `execute`.
pub struct QueryEngine {
    decoder: QueryDecoder,
    collections: DocumentTypeResolver,
    dispatcher: Dispatcher,
}

impl std::fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryEngine").finish_non_exhaustive()
    }
}

impl QueryEngine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Execute one read-model request
    ///
    /// Resolves the target collection, decodes the polymorphic query payload
    /// into its concrete shape, and dispatches to the one registered handler.
    /// Decode- and resolve-time failures abort immediately with no partial
    /// result; handler-internal storage failures propagate unchanged.
    pub async fn execute(
        &self,
        request: &ReadModelRequest,
        session: &dyn StorageSession,
    ) -> QueryResult<ReadModelResponse> {
        if let Some(id) = request.id {
            tracing::debug!(request_id = %id, data_type = %request.data_type, "executing read model query");
        }

        // Resolve the collection first so an unknown data type fails before
        // any shape or handler machinery runs.
        let collection = self.collections.resolve(&request.data_type)?;
        let shape = self.decoder.decode(&request.query)?;

        let result = self
            .dispatcher
            .dispatch(
                shape.as_ref(),
                collection,
                request.order_by.as_deref(),
                request.skip,
                request.take,
                session,
            )
            .await?;

        Ok(ReadModelResponse::new(result, collection.data_type.clone()))
    }

    /// The decoder (exposed for discovery endpoints and tests)
    pub fn decoder(&self) -> &QueryDecoder {
        &self.decoder
    }

    /// The collection resolver (exposed for discovery endpoints and tests)
    pub fn collections(&self) -> &DocumentTypeResolver {
        &self.collections
    }
}
