//! Typed error handling for the vantage query engine
//!
//! Every failure the dispatch core can produce is a variant of [`QueryError`],
//! so transports and tests can match on the exact kind instead of string
//! matching a generic error.
//!
//! # Error categories
//!
//! - Client-input errors: a malformed or unresolvable request
//!   (`MissingDiscriminator`, `UnknownQueryType`, `MissingRequiredField`,
//!   `ShapeDecode`, `UnknownDataType`, `UnsupportedCollection`)
//! - Configuration errors: a broken deployment surfacing at request time
//!   (`NoHandlerRegistered`) or at startup (`DuplicateDiscriminator`,
//!   `DuplicateHandler`, `DuplicateDataType`)
//! - Storage errors: propagated unchanged from the storage collaborator
//!
//! # Example
//!
//! ```rust,ignore
//! match engine.execute(&request, &session).await {
//!     Ok(response) => println!("{} rows", response.total_count),
//!     Err(QueryError::UnknownQueryType { query_type, known }) => {
//!         eprintln!("'{}' is not one of {:?}", query_type, known);
//!     }
//!     Err(e) => eprintln!("query failed: {}", e),
//! }
//! ```

use crate::storage::StorageError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type for the vantage query engine
#[derive(Debug)]
pub enum QueryError {
    /// The discriminator field was absent, empty, or not a string
    MissingDiscriminator {
        field: String,
    },

    /// The discriminator did not match any registered query shape
    UnknownQueryType {
        query_type: String,
        known: Vec<String>,
    },

    /// A required shape field was absent from the payload
    MissingRequiredField {
        query_type: String,
        field: String,
    },

    /// The payload fields could not be deserialized into the shape
    ShapeDecode {
        query_type: String,
        message: String,
    },

    /// The data type name did not match any registered collection
    UnknownDataType {
        data_type: String,
        known: Vec<String>,
    },

    /// A malformed request envelope (bad pagination bounds, bad id, ...)
    InvalidRequest {
        message: String,
    },

    /// A shape decoded fine but no handler is bound to it.
    ///
    /// This is a deployment fault masquerading as a request failure; the
    /// dispatcher logs it at ERROR before returning it.
    NoHandlerRegistered {
        query_type: String,
    },

    /// The handler does not operate on the collection the caller resolved
    UnsupportedCollection {
        query_type: String,
        expected: String,
        actual: String,
    },

    /// Two shape descriptors share a discriminator (startup-only, fatal)
    DuplicateDiscriminator {
        discriminator: String,
    },

    /// Two handlers were registered for the same shape type (startup-only)
    DuplicateHandler {
        shape: String,
    },

    /// Two collection descriptors share a name or alias (startup-only)
    DuplicateDataType {
        data_type: String,
    },

    /// Storage backend errors, propagated unchanged from the collaborator
    Storage(StorageError),

    /// Internal engine errors (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::MissingDiscriminator { field } => {
                write!(f, "Missing or empty query discriminator field '{}'", field)
            }
            QueryError::UnknownQueryType { query_type, known } => {
                write!(
                    f,
                    "Unknown query type '{}' (known: {})",
                    query_type,
                    known.join(", ")
                )
            }
            QueryError::MissingRequiredField { query_type, field } => {
                write!(
                    f,
                    "Query '{}' is missing required field '{}'",
                    query_type, field
                )
            }
            QueryError::ShapeDecode {
                query_type,
                message,
            } => {
                write!(f, "Failed to decode query '{}': {}", query_type, message)
            }
            QueryError::UnknownDataType { data_type, known } => {
                write!(
                    f,
                    "Unknown data type '{}' (known: {})",
                    data_type,
                    known.join(", ")
                )
            }
            QueryError::InvalidRequest { message } => {
                write!(f, "Invalid request: {}", message)
            }
            QueryError::NoHandlerRegistered { query_type } => {
                write!(f, "No handler registered for query type '{}'", query_type)
            }
            QueryError::UnsupportedCollection {
                query_type,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Query '{}' cannot run against collection '{}' (expects '{}')",
                    query_type, actual, expected
                )
            }
            QueryError::DuplicateDiscriminator { discriminator } => {
                write!(f, "Duplicate query type discriminator '{}'", discriminator)
            }
            QueryError::DuplicateHandler { shape } => {
                write!(f, "A handler is already registered for shape '{}'", shape)
            }
            QueryError::DuplicateDataType { data_type } => {
                write!(f, "Duplicate data type name or alias '{}'", data_type)
            }
            QueryError::Storage(e) => write!(f, "{}", e),
            QueryError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl QueryError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueryError::MissingDiscriminator { .. } => StatusCode::BAD_REQUEST,
            QueryError::UnknownQueryType { .. } => StatusCode::BAD_REQUEST,
            QueryError::MissingRequiredField { .. } => StatusCode::BAD_REQUEST,
            QueryError::ShapeDecode { .. } => StatusCode::BAD_REQUEST,
            QueryError::UnknownDataType { .. } => StatusCode::BAD_REQUEST,
            QueryError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            QueryError::UnsupportedCollection { .. } => StatusCode::BAD_REQUEST,
            QueryError::NoHandlerRegistered { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            QueryError::DuplicateDiscriminator { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            QueryError::DuplicateHandler { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            QueryError::DuplicateDataType { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            QueryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            QueryError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::MissingDiscriminator { .. } => "MISSING_QUERY_TYPE",
            QueryError::UnknownQueryType { .. } => "UNKNOWN_QUERY_TYPE",
            QueryError::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            QueryError::ShapeDecode { .. } => "QUERY_DECODE_FAILED",
            QueryError::UnknownDataType { .. } => "UNKNOWN_DATA_TYPE",
            QueryError::InvalidRequest { .. } => "INVALID_REQUEST",
            QueryError::NoHandlerRegistered { .. } => "NO_HANDLER_REGISTERED",
            QueryError::UnsupportedCollection { .. } => "UNSUPPORTED_COLLECTION",
            QueryError::DuplicateDiscriminator { .. } => "DUPLICATE_QUERY_TYPE",
            QueryError::DuplicateHandler { .. } => "DUPLICATE_HANDLER",
            QueryError::DuplicateDataType { .. } => "DUPLICATE_DATA_TYPE",
            QueryError::Storage(_) => "STORAGE_ERROR",
            QueryError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is the caller's fault (4xx) rather than the
    /// deployment's (5xx). Transports use this to pick a log severity.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    /// Get additional details for the error
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            QueryError::UnknownQueryType { query_type, known } => Some(serde_json::json!({
                "queryType": query_type,
                "knownQueryTypes": known,
            })),
            QueryError::UnknownDataType { data_type, known } => Some(serde_json::json!({
                "dataType": data_type,
                "knownDataTypes": known,
            })),
            QueryError::MissingRequiredField { query_type, field } => Some(serde_json::json!({
                "queryType": query_type,
                "field": field,
            })),
            QueryError::UnsupportedCollection {
                query_type,
                expected,
                actual,
            } => Some(serde_json::json!({
                "queryType": query_type,
                "expected": expected,
                "actual": actual,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

impl From<StorageError> for QueryError {
    fn from(err: StorageError) -> Self {
        QueryError::Storage(err)
    }
}

/// A specialized Result type for vantage operations
pub type QueryResult<T> = Result<T, QueryError>;
