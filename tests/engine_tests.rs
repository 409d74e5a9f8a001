//! End-to-end tests for the query engine against the in-memory store
//!
//! Builds a small fantasy-sports read model (players and teams), registers it
//! through the module discovery path, and exercises the full request flow:
//! resolve -> decode -> dispatch -> filter/count/order/page.

use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use vantage::prelude::*;

query_shape!(
    /// Players belonging to one team, optionally narrowed to a season.
    PlayersByTeam, "PlayersByTeam", {
        team_id: i64,
        season: Option<i64>,
    }
);

query_shape!(
    /// Players whose name contains the given fragment.
    PlayersByName, "PlayersByName", {
        name: String,
        min_age: Option<i64>,
    }
);

query_shape!(
    /// Registered shape with no handler, for misconfiguration tests.
    OrphanQuery, "OrphanQuery", {
        anything: Option<String>,
    }
);

struct PlayersByTeamHandler {
    invocations: Arc<AtomicUsize>,
}

#[async_trait]
impl QueryHandler<PlayersByTeam> for PlayersByTeamHandler {
    async fn execute(
        &self,
        shape: &PlayersByTeam,
        ctx: &QueryContext<'_>,
    ) -> QueryResult<ResultSet> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        ctx.expect_collection("SuperCoachPlayer", PlayersByTeam::DISCRIMINATOR)?;

        let mut cursor = ctx.cursor()?.filter(Filter::eq("TeamId", shape.team_id));
        if let Some(season) = shape.season {
            cursor = cursor.filter(Filter::eq("Season", season));
        }
        ctx.finish(cursor).await
    }
}

struct PlayersByNameHandler;

#[async_trait]
impl QueryHandler<PlayersByName> for PlayersByNameHandler {
    async fn execute(
        &self,
        shape: &PlayersByName,
        ctx: &QueryContext<'_>,
    ) -> QueryResult<ResultSet> {
        ctx.expect_collection("SuperCoachPlayer", PlayersByName::DISCRIMINATOR)?;

        let mut cursor = ctx
            .cursor()?
            .filter(Filter::contains("Name", shape.name.clone()));
        if let Some(min_age) = shape.min_age {
            cursor = cursor.filter(Filter::gte("Age", min_age));
        }
        ctx.finish(cursor).await
    }
}

struct FantasyModule {
    invocations: Arc<AtomicUsize>,
}

impl QueryModule for FantasyModule {
    fn name(&self) -> &str {
        "fantasy"
    }

    fn shapes(&self) -> Vec<ShapeDescriptor> {
        vec![
            PlayersByTeam::descriptor(),
            PlayersByName::descriptor(),
            OrphanQuery::descriptor(),
        ]
    }

    fn collections(&self) -> Vec<CollectionDescriptor> {
        vec![
            CollectionDescriptor {
                data_type: "SuperCoachPlayer".to_string(),
                collection: "players".to_string(),
                aliases: vec!["Domain.ReadModel.SuperCoachPlayer".to_string()],
                sortable_fields: vec![
                    "Id".to_string(),
                    "Name".to_string(),
                    "Age".to_string(),
                    "Points".to_string(),
                ],
                default_order_field: "Id".to_string(),
            },
            CollectionDescriptor {
                data_type: "SuperCoachTeam".to_string(),
                collection: "teams".to_string(),
                aliases: vec![],
                sortable_fields: vec!["Name".to_string()],
                default_order_field: "Id".to_string(),
            },
        ]
    }

    fn register_handlers(&self, handlers: &mut HandlerRegistry) -> QueryResult<()> {
        handlers.register::<PlayersByTeam, _>(PlayersByTeamHandler {
            invocations: self.invocations.clone(),
        })?;
        handlers.register::<PlayersByName, _>(PlayersByNameHandler)
    }
}

fn build_engine() -> (QueryEngine, Arc<AtomicUsize>) {
    let invocations = Arc::new(AtomicUsize::new(0));
    let engine = QueryEngine::builder()
        .register_module(&FantasyModule {
            invocations: invocations.clone(),
        })
        .expect("module should register")
        .build()
        .expect("engine should build");
    (engine, invocations)
}

fn seeded_session() -> InMemorySession {
    let session = InMemorySession::new();
    session
        .insert_many(
            "players",
            vec![
                json!({"Id": 1, "Name": "Patrick Dangerfield", "TeamId": 7, "Season": 2025, "Age": 35, "Points": 98}),
                json!({"Id": 2, "Name": "Jeremy Cameron", "TeamId": 7, "Season": 2025, "Age": 32, "Points": 112}),
                json!({"Id": 3, "Name": "Jeremy Cameron", "TeamId": 7, "Season": 2024, "Age": 31, "Points": 87}),
                json!({"Id": 4, "Name": "Nick Daicos", "TeamId": 3, "Season": 2025, "Age": 22, "Points": 131}),
                json!({"Id": 5, "Name": "Jordan Dawson", "TeamId": 5, "Season": 2025, "Age": 28, "Points": 104}),
            ],
        )
        .unwrap();
    session
        .insert(
            "teams",
            json!({"Id": 7, "Name": "Geelong", "Region": "Victoria"}),
        )
        .unwrap();
    session
}

fn request(body: serde_json::Value) -> ReadModelRequest {
    serde_json::from_value(body).expect("request should deserialize")
}

#[tokio::test]
async fn round_trip_filters_orders_and_counts() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let response = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7, "season": 2025},
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap();

    // Exactly TeamId == 7 AND Season == 2025
    assert_eq!(response.total_count, 2);
    assert_eq!(response.data.len(), 2);
    // Default ordering: Id ascending
    assert_eq!(response.data[0]["Id"], 1);
    assert_eq!(response.data[1]["Id"], 2);
    assert_eq!(response.data_type, "SuperCoachPlayer");
}

#[tokio::test]
async fn optional_filter_absent_means_no_predicate() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let response = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7},
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap();

    assert_eq!(response.total_count, 3);
}

#[tokio::test]
async fn discriminator_and_data_type_are_case_insensitive() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let response = engine
        .execute(
            &request(json!({
                "query": {"queryType": "pLaYeRsByTeAm", "teamId": 7},
                "dataType": "SUPERCOACHPLAYER"
            })),
            &session,
        )
        .await
        .unwrap();

    assert_eq!(response.total_count, 3);
    assert_eq!(response.data_type, "SuperCoachPlayer");
}

#[tokio::test]
async fn data_type_alias_resolves_to_same_collection() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let response = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7},
                "dataType": "Domain.ReadModel.SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap();

    assert_eq!(response.data_type, "SuperCoachPlayer");
}

#[tokio::test]
async fn order_by_composes_multi_key_and_drops_unknown_middle_clause() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let response = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7},
                "orderBy": "Name DESC, Unknown ASC, Age",
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap();

    // Name desc puts Dangerfield first; the two Camerons tie on Name and
    // order by Age ascending.
    let names_and_ages: Vec<(String, i64)> = response
        .data
        .iter()
        .map(|d| {
            (
                d["Name"].as_str().unwrap().to_string(),
                d["Age"].as_i64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        names_and_ages,
        vec![
            ("Patrick Dangerfield".to_string(), 35),
            ("Jeremy Cameron".to_string(), 31),
            ("Jeremy Cameron".to_string(), 32),
        ]
    );
}

#[tokio::test]
async fn unknown_first_order_clause_falls_back_to_default() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let response = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7},
                "orderBy": "ShoeSize DESC, Name ASC",
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap();

    let ids: Vec<i64> = response.data.iter().map(|d| d["Id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn pagination_leaves_total_count_unchanged() {
    let (engine, _) = build_engine();
    let session = InMemorySession::new();
    session
        .insert_many(
            "players",
            (1..=57).map(|id| {
                json!({"Id": id, "Name": format!("Player {id}"), "TeamId": 7, "Season": 2025, "Age": 20 + (id % 15), "Points": id})
            }),
        )
        .unwrap();

    let response = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7},
                "skip": 50,
                "take": 10,
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap();

    assert_eq!(response.total_count, 57);
    assert_eq!(response.data.len(), 7);
    assert_eq!(response.skip, 50);
    assert_eq!(response.take, Some(10));
    // Default Id ascending: the last page is 51..=57
    assert_eq!(response.data[0]["Id"], 51);
    assert_eq!(response.data[6]["Id"], 57);
}

#[tokio::test]
async fn absent_take_is_unbounded_from_skip() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let response = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7},
                "skip": 1,
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap();

    assert_eq!(response.total_count, 3);
    assert_eq!(response.data.len(), 2);
    assert_eq!(response.take, None);
}

#[tokio::test]
async fn unknown_data_type_fails_before_any_handler_runs() {
    let (engine, invocations) = build_engine();
    let session = seeded_session();

    let err = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7},
                "dataType": "UnknownThing"
            })),
            &session,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::UnknownDataType { .. }));
    assert_eq!(invocations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_query_type_lists_known_discriminators() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let err = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByShoe"},
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap_err();

    match err {
        QueryError::UnknownQueryType { query_type, known } => {
            assert_eq!(query_type, "PlayersByShoe");
            assert_eq!(
                known,
                vec!["PlayersByTeam", "PlayersByName", "OrphanQuery"]
            );
        }
        other => panic!("expected UnknownQueryType, got {:?}", other),
    }
}

#[tokio::test]
async fn shape_without_handler_is_a_configuration_error() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let err = engine
        .execute(
            &request(json!({
                "query": {"queryType": "OrphanQuery"},
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::NoHandlerRegistered { .. }));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn handler_rejects_mismatched_collection() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let err = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7},
                "dataType": "SuperCoachTeam"
            })),
            &session,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, QueryError::UnsupportedCollection { .. }));
}

#[tokio::test]
async fn query_string_channel_matches_json_channel() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let from_json = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7, "season": 2025},
                "orderBy": "Points DESC",
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap();

    let from_pairs = engine
        .execute(
            &ReadModelRequest::from_pairs([
                ("queryType", "PlayersByTeam"),
                ("teamId", "7"),
                ("season", "2025"),
                ("orderBy", "Points DESC"),
                ("dataType", "SuperCoachPlayer"),
            ])
            .unwrap(),
            &session,
        )
        .await
        .unwrap();

    assert_eq!(from_json.total_count, from_pairs.total_count);
    assert_eq!(from_json.data, from_pairs.data);
}

#[tokio::test]
async fn contains_filter_with_optional_minimum() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let response = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByName", "name": "cameron", "minAge": 32},
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap();

    assert_eq!(response.total_count, 1);
    assert_eq!(response.data[0]["Id"], 2);
}

#[tokio::test]
async fn missing_required_field_names_the_field() {
    let (engine, _) = build_engine();
    let session = seeded_session();

    let err = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "season": 2025},
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap_err();

    match err {
        QueryError::MissingRequiredField { query_type, field } => {
            assert_eq!(query_type, "PlayersByTeam");
            assert_eq!(field, "teamId");
        }
        other => panic!("expected MissingRequiredField, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_order_by_with_empty_whitelist_uses_default() {
    let invocations = Arc::new(AtomicUsize::new(0));
    let engine = QueryEngine::builder()
        .register_shape(PlayersByTeam::descriptor())
        .register_collection(CollectionDescriptor {
            data_type: "SuperCoachPlayer".to_string(),
            collection: "players".to_string(),
            aliases: vec![],
            sortable_fields: vec![],
            default_order_field: "Id".to_string(),
        })
        .register_handler::<PlayersByTeam, _>(PlayersByTeamHandler {
            invocations: invocations.clone(),
        })
        .unwrap()
        .build()
        .unwrap();
    let session = seeded_session();

    let response = engine
        .execute(
            &request(json!({
                "query": {"queryType": "PlayersByTeam", "teamId": 7},
                "orderBy": "",
                "dataType": "SuperCoachPlayer"
            })),
            &session,
        )
        .await
        .unwrap();

    let ids: Vec<i64> = response.data.iter().map(|d| d["Id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn duplicate_discriminators_fail_at_build_time() {
    let err = QueryEngine::builder()
        .register_shape(PlayersByTeam::descriptor())
        .register_shape(PlayersByTeam::descriptor())
        .build()
        .unwrap_err();
    assert!(matches!(err, QueryError::DuplicateDiscriminator { .. }));
}

#[test]
fn duplicate_collection_names_fail_at_build_time() {
    let collection = CollectionDescriptor {
        data_type: "SuperCoachPlayer".to_string(),
        collection: "players".to_string(),
        aliases: vec![],
        sortable_fields: vec![],
        default_order_field: "Id".to_string(),
    };
    let err = QueryEngine::builder()
        .register_collection(collection.clone())
        .register_collection(collection)
        .build()
        .unwrap_err();
    assert!(matches!(err, QueryError::DuplicateDataType { .. }));
}
