//! Request and response envelopes for read-model queries
//!
//! These are the transport-agnostic wire types: an endpoint layer extracts a
//! [`ReadModelRequest`] from a JSON body or query string, hands it to the
//! engine, and serializes the [`ReadModelResponse`] back out.

use crate::core::error::{QueryError, QueryResult};
use crate::decode::sniff;
use crate::storage::Document;
use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A read-model query request
///
/// `query` is the open payload the polymorphic decoder turns into a concrete
/// shape; `data_type` names the target collection through the
/// `DocumentTypeResolver`. The two axes are resolved independently.
///
/// # Example
///
/// ```json
/// {
///     "query": { "queryType": "PlayersByTeam", "teamId": 7, "season": 2025 },
///     "orderBy": "Name DESC, Age",
///     "skip": 0,
///     "take": 25,
///     "dataType": "SuperCoachPlayer"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadModelRequest {
    /// Optional correlation id echoed into logs
    #[serde(default)]
    pub id: Option<Uuid>,

    /// The untyped query payload, including the discriminator field
    pub query: Value,

    /// Free-text ordering clause, e.g. "Name DESC, Age"
    #[serde(default)]
    pub order_by: Option<String>,

    /// Number of records to skip (defaults to 0)
    #[serde(default)]
    pub skip: u64,

    /// Maximum number of records to return; absent = unbounded from `skip`
    #[serde(default)]
    pub take: Option<u64>,

    /// Name (or alias) of the target collection's data type
    pub data_type: String,
}

impl ReadModelRequest {
    /// Build a request from flattened query-string pairs
    ///
    /// Envelope parameters (`id`, `orderBy`, `skip`, `take`, `dataType`) are
    /// pulled out; every remaining parameter becomes a candidate shape field
    /// with sniffed typing (integer, then decimal, then boolean, then
    /// string), and repeated keys collect into an array. The resulting
    /// payload funnels into the same decoder as the JSON channel, so handler
    /// behavior does not depend on the transport.
    pub fn from_pairs<I, K, V>(pairs: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut id = None;
        let mut order_by = None;
        let mut skip = 0u64;
        let mut take = None;
        let mut data_type = None;
        let mut fields = serde_json::Map::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref();
            match key {
                "id" => {
                    id = Some(value.parse::<Uuid>().map_err(|e| {
                        QueryError::InvalidRequest {
                            message: format!("invalid value '{}' for 'id': {}", value, e),
                        }
                    })?);
                }
                "orderBy" => order_by = Some(value.to_string()),
                "skip" => {
                    skip = value.parse::<u64>().map_err(|_| QueryError::InvalidRequest {
                        message: format!("invalid value '{}' for 'skip'", value),
                    })?;
                }
                "take" => {
                    take = Some(value.parse::<u64>().map_err(|_| {
                        QueryError::InvalidRequest {
                            message: format!("invalid value '{}' for 'take'", value),
                        }
                    })?);
                }
                "dataType" => data_type = Some(value.to_string()),
                _ => {
                    let sniffed = sniff(value);
                    match fields.get_mut(key) {
                        // Repeated keys become a sequence
                        Some(Value::Array(items)) => items.push(sniffed),
                        Some(existing) => {
                            let first = existing.take();
                            *existing = Value::Array(vec![first, sniffed]);
                        }
                        None => {
                            fields.insert(key.to_string(), sniffed);
                        }
                    }
                }
            }
        }

        let data_type = data_type.ok_or_else(|| QueryError::InvalidRequest {
            message: "missing required parameter 'dataType'".to_string(),
        })?;

        Ok(Self {
            id,
            query: Value::Object(fields),
            order_by,
            skip,
            take,
            data_type,
        })
    }
}

/// Results of executing one query shape against a collection
///
/// `total_count` is computed over the filtered set before pagination and is
/// unaffected by `skip`/`take`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub items: Vec<Document>,
    pub total_count: u64,
    pub skip: u64,
    pub take: Option<u64>,
}

/// A read-model query response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadModelResponse {
    /// The page of matching records
    pub data: Vec<Document>,

    /// Total matching records before pagination
    pub total_count: u64,

    /// Echoed pagination bounds
    pub skip: u64,
    pub take: Option<u64>,

    /// Canonical data type name of the queried collection
    pub data_type: String,
}

impl ReadModelResponse {
    /// Assemble a response from a handler result set
    pub fn new(result: ResultSet, data_type: impl Into<String>) -> Self {
        Self {
            data: result.items,
            total_count: result.total_count,
            skip: result.skip,
            take: result.take,
            data_type: data_type.into(),
        }
    }
}

impl IntoResponse for ReadModelResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
