//! # Vantage
//!
//! A polymorphic read-model query engine for building generic query APIs in Rust.
//!
//! ## Features
//!
//! - **Open query shapes**: an extensible set of named query "shapes" is
//!   registered at startup and decoded from untyped payloads by
//!   discriminator, with no central switch statement to edit per query
//! - **Generic dispatch**: exactly one handler per shape, located by the
//!   shape's runtime type through a type-erased registration table
//! - **Two input channels**: JSON bodies and flattened query strings funnel
//!   into the same structural deserialization
//! - **Safe dynamic ordering**: free-text "Name DESC, Age" clauses compiled
//!   against a per-collection whitelist into a stable multi-key sort
//! - **Deterministic pagination**: totals computed pre-pagination, default
//!   ordering under malformed input
//! - **Configuration-based collections**: declare queryable collections in
//!   YAML or code
//! - **Macro-based shapes**: `query_shape!` generates the struct, trait
//!   impl, and registry descriptor
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vantage::prelude::*;
//!
//! query_shape!(PlayersByTeam, "PlayersByTeam", {
//!     team_id: i64,
//!     season: Option<i64>,
//! });
//!
//! struct PlayersByTeamHandler;
//!
//! #[async_trait]
//! impl QueryHandler<PlayersByTeam> for PlayersByTeamHandler {
//!     async fn execute(
//!         &self,
//!         shape: &PlayersByTeam,
//!         ctx: &QueryContext<'_>,
//!     ) -> QueryResult<ResultSet> {
//!         ctx.expect_collection("SuperCoachPlayer", PlayersByTeam::DISCRIMINATOR)?;
//!         let mut cursor = ctx.cursor()?.filter(Filter::eq("TeamId", shape.team_id));
//!         if let Some(season) = shape.season {
//!             cursor = cursor.filter(Filter::eq("Season", season));
//!         }
//!         ctx.finish(cursor).await
//!     }
//! }
//!
//! let engine = QueryEngine::builder()
//!     .register_shape(PlayersByTeam::descriptor())
//!     .register_collection(players_collection())
//!     .register_handler::<PlayersByTeam, _>(PlayersByTeamHandler)?
//!     .build()?;
//!
//! let response = engine.execute(&request, &session).await?;
//! ```

pub mod config;
pub mod core;
pub mod decode;
pub mod dispatch;
pub mod engine;
pub mod ordering;
pub mod registry;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core types ===
    pub use crate::core::{
        error::{ErrorResponse, QueryError, QueryResult},
        request::{ReadModelRequest, ReadModelResponse, ResultSet},
        shape::{QueryShape, ShapeDescriptor},
    };

    // === Macros ===
    pub use crate::query_shape;

    // === Decoding and dispatch ===
    pub use crate::decode::{DISCRIMINATOR_FIELD, QueryDecoder};
    pub use crate::dispatch::{Dispatcher, HandlerRegistry, QueryContext, QueryHandler};

    // === Registries ===
    pub use crate::registry::{CollectionDescriptor, DocumentTypeResolver, QueryTypeRegistry};

    // === Ordering ===
    pub use crate::ordering::{OrderKey, OrderSpec};

    // === Storage ===
    pub use crate::storage::{Document, DocumentCursor, Filter, StorageError, StorageSession};
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemorySession;

    // === Engine ===
    pub use crate::engine::{EngineBuilder, QueryEngine, QueryModule};

    // === Config ===
    pub use crate::config::CollectionsConfig;

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
