//! Polymorphic query decoder
//!
//! Turns an untyped payload into the one concrete [`QueryShape`] its
//! discriminator names. Two input channels feed the same structural
//! deserialization: a JSON object body, and flattened query-string pairs with
//! type sniffing, so handler-visible behavior never depends on the
//! transport.

use crate::core::error::{QueryError, QueryResult};
use crate::core::shape::QueryShape;
use crate::registry::shapes::QueryTypeRegistry;
use serde_json::Value;
use std::sync::Arc;

/// Default name of the discriminator field in query payloads
pub const DISCRIMINATOR_FIELD: &str = "queryType";

/// Decoder resolving open payloads into concrete query shapes
///
/// Decode is all-or-nothing: on any failure no partially populated shape is
/// returned. Decoding the same payload twice yields field-wise equal shapes.
pub struct QueryDecoder {
    registry: Arc<QueryTypeRegistry>,
    discriminator_field: String,
}

impl QueryDecoder {
    /// Create a decoder over a shape registry
    pub fn new(registry: Arc<QueryTypeRegistry>) -> Self {
        Self {
            registry,
            discriminator_field: DISCRIMINATOR_FIELD.to_string(),
        }
    }

    /// Override the discriminator field name (default `"queryType"`)
    pub fn with_discriminator_field(mut self, field: impl Into<String>) -> Self {
        self.discriminator_field = field.into();
        self
    }

    /// The registry this decoder resolves against
    pub fn registry(&self) -> &QueryTypeRegistry {
        &self.registry
    }

    /// Decode a JSON object payload into a concrete query shape
    ///
    /// 1. extract the discriminator (required top-level string field);
    /// 2. resolve it through the registry;
    /// 3. structurally deserialize the remaining fields into the shape.
    ///
    /// Unknown extra fields are ignored; missing required fields fail with
    /// [`QueryError::MissingRequiredField`].
    pub fn decode(&self, payload: &Value) -> QueryResult<Box<dyn QueryShape>> {
        let object = payload
            .as_object()
            .ok_or_else(|| self.missing_discriminator())?;

        let discriminator = object
            .get(&self.discriminator_field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| self.missing_discriminator())?;

        let descriptor = self.registry.resolve(discriminator)?;
        tracing::debug!(
            query_type = descriptor.discriminator(),
            "decoding query payload"
        );

        let mut fields = object.clone();
        fields.remove(&self.discriminator_field);
        descriptor.decode(Value::Object(fields))
    }

    /// Decode flattened query-string pairs into a concrete query shape
    ///
    /// Each value is type-sniffed (integer, then decimal, then boolean, then
    /// string) and repeated keys become a sequence; the resulting object
    /// funnels into [`decode`](Self::decode).
    pub fn decode_pairs<I, K, V>(&self, pairs: I) -> QueryResult<Box<dyn QueryShape>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut object = serde_json::Map::new();

        for (key, value) in pairs {
            let key = key.as_ref();
            // The discriminator stays textual; everything else is sniffed.
            let value = if key == self.discriminator_field {
                Value::String(value.as_ref().to_string())
            } else {
                sniff(value.as_ref())
            };

            match object.get_mut(key) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    object.insert(key.to_string(), value);
                }
            }
        }

        self.decode(&Value::Object(object))
    }

    fn missing_discriminator(&self) -> QueryError {
        QueryError::MissingDiscriminator {
            field: self.discriminator_field.clone(),
        }
    }
}

/// Sniff the JSON type of a raw query-string value
///
/// Tries integer, then decimal, then boolean, then falls back to string.
pub(crate) fn sniff(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(n) = raw.parse::<f64>() {
        return Value::from(n);
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}
