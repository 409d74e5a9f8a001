//! Handler registry and generic dispatch
//!
//! Binds each query shape's runtime type to exactly one handler and invokes
//! it without compile-time knowledge of the shape: handlers are stored behind
//! a type-erased adapter keyed by `TypeId`, and the adapter downcasts back to
//! the concrete shape on invocation. Adding a new shape + handler pair never
//! requires touching this module.

use crate::core::error::{QueryError, QueryResult};
use crate::core::request::ResultSet;
use crate::core::shape::QueryShape;
use crate::ordering::{self, OrderSpec};
use crate::registry::collections::CollectionDescriptor;
use crate::storage::{DocumentCursor, StorageSession};
use async_trait::async_trait;
use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Per-request context handed to a handler
///
/// Everything a handler needs besides its shape: the resolved collection,
/// the compiled ordering, pagination bounds, and the caller-owned storage
/// session.
pub struct QueryContext<'a> {
    pub collection: &'a CollectionDescriptor,
    pub order: OrderSpec,
    pub skip: u64,
    pub take: Option<u64>,
    pub session: &'a dyn StorageSession,
}

impl QueryContext<'_> {
    /// Validate that the resolved collection is the one this handler expects
    ///
    /// The discriminator and the data-type name are resolved through two
    /// independent registries; nothing statically guarantees they agree, so
    /// every handler checks before touching storage.
    pub fn expect_collection(&self, data_type: &str, query_type: &str) -> QueryResult<()> {
        if self.collection.data_type.eq_ignore_ascii_case(data_type) {
            Ok(())
        } else {
            Err(QueryError::UnsupportedCollection {
                query_type: query_type.to_string(),
                expected: data_type.to_string(),
                actual: self.collection.data_type.clone(),
            })
        }
    }

    /// Open a cursor on the context's collection
    pub fn cursor(&self) -> QueryResult<Box<dyn DocumentCursor>> {
        Ok(self.session.query(self.collection)?)
    }

    /// Count, order, paginate, and materialize a filtered cursor
    ///
    /// The total is computed before `skip`/`take` so it reflects filters
    /// only; absent `take` means unbounded from `skip` onward.
    pub async fn finish(&self, cursor: Box<dyn DocumentCursor>) -> QueryResult<ResultSet> {
        let total_count = cursor.count().await?;

        let mut cursor = cursor.order(&self.order).skip(self.skip);
        if let Some(take) = self.take {
            cursor = cursor.take(take);
        }
        let items = cursor.collect().await?;

        Ok(ResultSet {
            items,
            total_count,
            skip: self.skip,
            take: self.take,
        })
    }
}

/// Executes one query shape's filters against storage
///
/// One implementation per shape, supplied by feature authors. A handler
/// applies its shape's filters as a conjunction of independent predicates
/// (absent optional fields contribute none), then hands the cursor to
/// [`QueryContext::finish`].
#[async_trait]
pub trait QueryHandler<S: QueryShape>: Send + Sync {
    async fn execute(&self, shape: &S, ctx: &QueryContext<'_>) -> QueryResult<ResultSet>;
}

/// Object-safe wrapper invoked by the dispatcher
#[async_trait]
trait ErasedQueryHandler: Send + Sync {
    async fn execute(
        &self,
        shape: &dyn QueryShape,
        ctx: &QueryContext<'_>,
    ) -> QueryResult<ResultSet>;
}

/// Adapter recovering the concrete shape type before delegating
struct ErasedAdapter<S, H> {
    handler: H,
    _shape: PhantomData<fn() -> S>,
}

#[async_trait]
impl<S, H> ErasedQueryHandler for ErasedAdapter<S, H>
where
    S: QueryShape + 'static,
    H: QueryHandler<S>,
{
    async fn execute(
        &self,
        shape: &dyn QueryShape,
        ctx: &QueryContext<'_>,
    ) -> QueryResult<ResultSet> {
        let concrete = shape.as_any().downcast_ref::<S>().ok_or_else(|| {
            QueryError::Internal(format!(
                "handler for {} invoked with shape '{}'",
                type_name::<S>(),
                shape.discriminator()
            ))
        })?;
        self.handler.execute(concrete, ctx).await
    }
}

/// Registry binding shape types to their handlers
///
/// Populated at startup, immutable afterwards. Registering a second handler
/// for the same shape type fails fast: a silent replace would hide exactly
/// the misconfiguration dispatch is meant to surface.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TypeId, Arc<dyn ErasedQueryHandler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Bind shape type `S` to `handler`
    pub fn register<S, H>(&mut self, handler: H) -> QueryResult<()>
    where
        S: QueryShape + 'static,
        H: QueryHandler<S> + 'static,
    {
        let adapter = ErasedAdapter {
            handler,
            _shape: PhantomData::<fn() -> S>,
        };
        if self
            .handlers
            .insert(TypeId::of::<S>(), Arc::new(adapter))
            .is_some()
        {
            return Err(QueryError::DuplicateHandler {
                shape: type_name::<S>().to_string(),
            });
        }
        Ok(())
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn get(&self, type_id: TypeId) -> Option<Arc<dyn ErasedQueryHandler>> {
        self.handlers.get(&type_id).cloned()
    }
}

/// Dispatches decoded shapes to their registered handlers
pub struct Dispatcher {
    handlers: HandlerRegistry,
}

impl Dispatcher {
    pub fn new(handlers: HandlerRegistry) -> Self {
        Self { handlers }
    }

    /// Execute a decoded shape against a collection
    ///
    /// Looks up the single handler registered for the shape's runtime type,
    /// compiles the ordering clause against the collection's whitelist, and
    /// invokes the handler. Fails with [`QueryError::NoHandlerRegistered`]
    /// when no handler is bound, logged at ERROR since that is a
    /// deployment fault surfacing as a request failure.
    pub async fn dispatch(
        &self,
        shape: &dyn QueryShape,
        collection: &CollectionDescriptor,
        order_by: Option<&str>,
        skip: u64,
        take: Option<u64>,
        session: &dyn StorageSession,
    ) -> QueryResult<ResultSet> {
        let type_id = shape.as_any().type_id();
        let handler = self.handlers.get(type_id).ok_or_else(|| {
            tracing::error!(
                query_type = shape.discriminator(),
                "no handler registered for decoded query shape"
            );
            QueryError::NoHandlerRegistered {
                query_type: shape.discriminator().to_string(),
            }
        })?;

        let order = ordering::compile(order_by, collection);
        tracing::debug!(
            query_type = shape.discriminator(),
            data_type = %collection.data_type,
            skip,
            take,
            "dispatching read model query"
        );

        let ctx = QueryContext {
            collection,
            order,
            skip,
            take,
            session,
        };
        handler.execute(shape, &ctx).await
    }
}

#[cfg(all(test, feature = "in-memory"))]
mod tests {
    use super::*;
    use crate::query_shape;
    use crate::storage::{Filter, InMemorySession};
    use serde_json::json;

    query_shape!(PlayersByTeam, "PlayersByTeam", {
        team_id: i64,
        season: Option<i64>,
    });

    query_shape!(PlayersByName, "PlayersByName", {
        name: String,
    });

    struct PlayersByTeamHandler;

    #[async_trait]
    impl QueryHandler<PlayersByTeam> for PlayersByTeamHandler {
        async fn execute(
            &self,
            shape: &PlayersByTeam,
            ctx: &QueryContext<'_>,
        ) -> QueryResult<ResultSet> {
            ctx.expect_collection("SuperCoachPlayer", PlayersByTeam::DISCRIMINATOR)?;

            let mut cursor = ctx.cursor()?.filter(Filter::eq("TeamId", shape.team_id));
            if let Some(season) = shape.season {
                cursor = cursor.filter(Filter::eq("Season", season));
            }
            ctx.finish(cursor).await
        }
    }

    fn players_descriptor() -> CollectionDescriptor {
        CollectionDescriptor {
            data_type: "SuperCoachPlayer".to_string(),
            collection: "players".to_string(),
            aliases: vec![],
            sortable_fields: vec!["Name".to_string(), "Age".to_string()],
            default_order_field: "Name".to_string(),
        }
    }

    fn teams_descriptor() -> CollectionDescriptor {
        CollectionDescriptor {
            data_type: "SuperCoachTeam".to_string(),
            collection: "teams".to_string(),
            aliases: vec![],
            sortable_fields: vec!["Name".to_string()],
            default_order_field: "Name".to_string(),
        }
    }

    fn seeded_session() -> InMemorySession {
        let session = InMemorySession::new();
        session
            .insert_many(
                "players",
                vec![
                    json!({"Name": "Smith", "TeamId": 7, "Season": 2025, "Age": 31}),
                    json!({"Name": "Jones", "TeamId": 7, "Season": 2024, "Age": 24}),
                    json!({"Name": "Brown", "TeamId": 3, "Season": 2025, "Age": 28}),
                ],
            )
            .unwrap();
        session
    }

    fn dispatcher() -> Dispatcher {
        let mut handlers = HandlerRegistry::new();
        handlers
            .register::<PlayersByTeam, _>(PlayersByTeamHandler)
            .unwrap();
        Dispatcher::new(handlers)
    }

    #[tokio::test]
    async fn test_dispatch_invokes_the_bound_handler() {
        let session = seeded_session();
        let shape = PlayersByTeam {
            team_id: 7,
            season: None,
        };
        let result = dispatcher()
            .dispatch(&shape, &players_descriptor(), None, 0, None, &session)
            .await
            .unwrap();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.items.len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_optional_filter_narrows() {
        let session = seeded_session();
        let shape = PlayersByTeam {
            team_id: 7,
            season: Some(2025),
        };
        let result = dispatcher()
            .dispatch(&shape, &players_descriptor(), None, 0, None, &session)
            .await
            .unwrap();
        assert_eq!(result.total_count, 1);
        assert_eq!(result.items[0]["Name"], "Smith");
    }

    #[tokio::test]
    async fn test_dispatch_no_handler_registered() {
        let session = seeded_session();
        let shape = PlayersByName {
            name: "Smith".to_string(),
        };
        let err = dispatcher()
            .dispatch(&shape, &players_descriptor(), None, 0, None, &session)
            .await
            .unwrap_err();
        match err {
            QueryError::NoHandlerRegistered { query_type } => {
                assert_eq!(query_type, "PlayersByName");
            }
            other => panic!("expected NoHandlerRegistered, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_unsupported_collection() {
        let session = seeded_session();
        let shape = PlayersByTeam {
            team_id: 7,
            season: None,
        };
        let err = dispatcher()
            .dispatch(&shape, &teams_descriptor(), None, 0, None, &session)
            .await
            .unwrap_err();
        match err {
            QueryError::UnsupportedCollection {
                expected, actual, ..
            } => {
                assert_eq!(expected, "SuperCoachPlayer");
                assert_eq!(actual, "SuperCoachTeam");
            }
            other => panic!("expected UnsupportedCollection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_applies_order_and_pagination() {
        let session = seeded_session();
        let shape = PlayersByTeam {
            team_id: 7,
            season: None,
        };
        let result = dispatcher()
            .dispatch(
                &shape,
                &players_descriptor(),
                Some("Age DESC"),
                0,
                Some(1),
                &session,
            )
            .await
            .unwrap();
        // Total reflects the filter, not the page
        assert_eq!(result.total_count, 2);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0]["Name"], "Smith");
    }

    #[test]
    fn test_duplicate_handler_fails_at_registration() {
        let mut handlers = HandlerRegistry::new();
        handlers
            .register::<PlayersByTeam, _>(PlayersByTeamHandler)
            .unwrap();
        let err = handlers
            .register::<PlayersByTeam, _>(PlayersByTeamHandler)
            .unwrap_err();
        assert!(matches!(err, QueryError::DuplicateHandler { .. }));
    }
}
