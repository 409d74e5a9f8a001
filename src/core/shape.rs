//! Query shape trait and registry descriptors
//!
//! A query shape is a fixed, named set of filter parameters. Shapes are plain
//! `Deserialize` structs; the engine only sees them through the object-safe
//! [`QueryShape`] trait and downcasts back to the concrete type inside the
//! dispatch layer.

use crate::core::error::{QueryError, QueryResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Trait implemented by every query shape
///
/// Shapes carry a unique discriminator string and nothing else behaviorally;
/// all filtering logic lives in the handler bound to the shape. Use the
/// [`query_shape!`](crate::query_shape) macro instead of implementing this by
/// hand.
pub trait QueryShape: Any + fmt::Debug + Send + Sync {
    /// The unique discriminator string identifying this shape
    fn discriminator(&self) -> &'static str;

    /// Downcast hook used by the dispatcher to recover the concrete type
    fn as_any(&self) -> &dyn Any;
}

type DecodeFn = dyn Fn(Value) -> QueryResult<Box<dyn QueryShape>> + Send + Sync;

/// Registry entry pairing a discriminator with a decode function
///
/// Descriptors are created once at startup (usually via the generated
/// `descriptor()` constructor on each shape) and are immutable for the
/// process lifetime. Cloning is cheap.
#[derive(Clone)]
pub struct ShapeDescriptor {
    discriminator: &'static str,
    decode: Arc<DecodeFn>,
}

impl ShapeDescriptor {
    /// Create a descriptor for shape `S`
    ///
    /// The decode function structurally deserializes a JSON object into `S`.
    /// Unknown extra fields are ignored; a missing required field surfaces as
    /// [`QueryError::MissingRequiredField`].
    pub fn new<S>(discriminator: &'static str) -> Self
    where
        S: QueryShape + DeserializeOwned,
    {
        Self {
            discriminator,
            decode: Arc::new(move |fields: Value| {
                let shape: S = serde_json::from_value(fields)
                    .map_err(|e| decode_error(discriminator, &e))?;
                Ok(Box::new(shape) as Box<dyn QueryShape>)
            }),
        }
    }

    /// The discriminator this descriptor was registered under
    pub fn discriminator(&self) -> &'static str {
        self.discriminator
    }

    /// Decode a field map into the concrete shape
    ///
    /// All-or-nothing: on failure no partially populated shape exists.
    pub fn decode(&self, fields: Value) -> QueryResult<Box<dyn QueryShape>> {
        (self.decode)(fields)
    }
}

impl fmt::Debug for ShapeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeDescriptor")
            .field("discriminator", &self.discriminator)
            .finish()
    }
}

/// Map a serde error onto the query error taxonomy
///
/// serde_json reports absent required fields as "missing field `name`", which
/// is the one structural failure the contract distinguishes; everything else
/// is a generic decode failure.
fn decode_error(discriminator: &'static str, err: &serde_json::Error) -> QueryError {
    let message = err.to_string();
    if let Some(rest) = message.strip_prefix("missing field `") {
        if let Some(field) = rest.split('`').next() {
            return QueryError::MissingRequiredField {
                query_type: discriminator.to_string(),
                field: field.to_string(),
            };
        }
    }
    QueryError::ShapeDecode {
        query_type: discriminator.to_string(),
        message,
    }
}
