//! Wiring demo: a fantasy-sports read model served by the query engine
//!
//! Registers a feature module (shapes + collections + handlers), seeds the
//! in-memory store, and runs queries through both input channels.

use anyhow::Result;
use serde_json::json;
use tracing_subscriber::EnvFilter;
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
    }
);

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

struct PlayersByNameHandler;

#[async_trait]
impl QueryHandler<PlayersByName> for PlayersByNameHandler {
    async fn execute(
        &self,
        shape: &PlayersByName,
        ctx: &QueryContext<'_>,
    ) -> QueryResult<ResultSet> {
        ctx.expect_collection("SuperCoachPlayer", PlayersByName::DISCRIMINATOR)?;

        let cursor = ctx
            .cursor()?
            .filter(Filter::contains("Name", shape.name.clone()));
        ctx.finish(cursor).await
    }
}

struct FantasyModule;

impl QueryModule for FantasyModule {
    fn name(&self) -> &str {
        "fantasy"
    }

    fn shapes(&self) -> Vec<ShapeDescriptor> {
        vec![PlayersByTeam::descriptor(), PlayersByName::descriptor()]
    }

    fn collections(&self) -> Vec<CollectionDescriptor> {
        CollectionsConfig::from_yaml_str(COLLECTIONS_YAML)
            .expect("embedded collections config should parse")
            .into_descriptors()
    }

    fn register_handlers(&self, handlers: &mut HandlerRegistry) -> QueryResult<()> {
        handlers.register::<PlayersByTeam, _>(PlayersByTeamHandler)?;
        handlers.register::<PlayersByName, _>(PlayersByNameHandler)
    }
}

const COLLECTIONS_YAML: &str = r#"
collections:
  - data_type: SuperCoachPlayer
    collection: players
    aliases:
      - Domain.ReadModel.SuperCoachPlayer
    sortable_fields: [Id, Name, Age, Points]
    default_order_field: Id
"#;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("🏉 Vantage SuperCoach Example\n");

    let engine = QueryEngine::builder()
        .register_module(&FantasyModule)?
        .build()?;

    let session = InMemorySession::new();
    session.insert_many(
        "players",
        vec![
            json!({"Id": 1, "Name": "Patrick Dangerfield", "TeamId": 7, "Season": 2025, "Age": 35, "Points": 98}),
            json!({"Id": 2, "Name": "Jeremy Cameron", "TeamId": 7, "Season": 2025, "Age": 32, "Points": 112}),
            json!({"Id": 3, "Name": "Nick Daicos", "TeamId": 3, "Season": 2025, "Age": 22, "Points": 131}),
            json!({"Id": 4, "Name": "Jordan Dawson", "TeamId": 5, "Season": 2025, "Age": 28, "Points": 104}),
        ],
    )?;

    // JSON body channel
    let request: ReadModelRequest = serde_json::from_value(json!({
        "query": {"queryType": "PlayersByTeam", "teamId": 7, "season": 2025},
        "orderBy": "Points DESC",
        "take": 10,
        "dataType": "SuperCoachPlayer"
    }))?;
    let response = engine.execute(&request, &session).await?;
    println!(
        "🔍 PlayersByTeam(teamId=7, season=2025): {} of {} match",
        response.data.len(),
        response.total_count
    );
    println!("{}\n", serde_json::to_string_pretty(&response.data)?);

    // Flattened query-string channel
    let request = ReadModelRequest::from_pairs([
        ("queryType", "PlayersByName"),
        ("name", "daicos"),
        ("dataType", "SuperCoachPlayer"),
    ])?;
    let response = engine.execute(&request, &session).await?;
    println!(
        "🔍 PlayersByName(name~'daicos'): {} match",
        response.total_count
    );
    println!("{}\n", serde_json::to_string_pretty(&response.data)?);

    // A client mistake surfaces as a typed error
    let request: ReadModelRequest = serde_json::from_value(json!({
        "query": {"queryType": "PlayersByShoe"},
        "dataType": "SuperCoachPlayer"
    }))?;
    match engine.execute(&request, &session).await {
        Ok(_) => println!("unexpected success"),
        Err(e) => println!("❌ {} → {}", e.error_code(), e),
    }

    println!("\n✨ Example completed successfully!");

    Ok(())
}
