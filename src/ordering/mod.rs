//! Ordering clause compiler
//!
//! Turns a free-text "Name DESC, Age" string into a validated [`OrderSpec`]
//! over a collection's sortable-field whitelist. The compiled spec applies as
//! a stable multi-key sort, so pagination stays deterministic even when the
//! caller supplies no (or nonsense) ordering.
//!
//! Leniency policy: blank input or an unrecognized *first* clause falls back
//! to the collection's default single-key ascending spec; an unrecognized
//! *non-first* clause is dropped while later valid clauses still apply. A
//! request never fails because of its `orderBy` string.

use crate::registry::collections::CollectionDescriptor;
use crate::storage::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// One sort key: a whitelisted field and a direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    /// Canonical field name (whitelist spelling, not caller spelling)
    pub field: String,
    pub descending: bool,
}

/// A validated, ordered list of sort keys
///
/// Keys compose left-to-right as primary, secondary, ... sort keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    keys: Vec<OrderKey>,
}

impl OrderSpec {
    /// Spec with a single key
    pub fn single(field: impl Into<String>, descending: bool) -> Self {
        Self {
            keys: vec![OrderKey {
                field: field.into(),
                descending,
            }],
        }
    }

    /// The compiled sort keys, primary first
    pub fn keys(&self) -> &[OrderKey] {
        &self.keys
    }

    /// Sort documents in place by this spec
    ///
    /// `sort_by` is a stable sort, so records equal under every key keep
    /// their relative order.
    pub fn apply(&self, documents: &mut [Document]) {
        documents.sort_by(|a, b| self.compare(a, b));
    }

    /// Compare two documents under this spec
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for key in &self.keys {
            let left = a.get(&key.field).unwrap_or(&Value::Null);
            let right = b.get(&key.field).unwrap_or(&Value::Null);
            let mut ordering = compare_values(left, right);
            if key.descending {
                ordering = ordering.reverse();
            }
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Compile an orderBy string against a collection's whitelist
///
/// Grammar: clauses split on commas; each clause splits on the first
/// whitespace run into `(field, direction)`; direction is case-insensitive
/// `ASC`/`DESC`, defaulting to ascending when absent or unrecognized.
pub fn compile(order_by: Option<&str>, collection: &CollectionDescriptor) -> OrderSpec {
    let default = OrderSpec::single(collection.default_order_field.clone(), false);

    let Some(order_by) = order_by else {
        return default;
    };
    if order_by.trim().is_empty() {
        return default;
    }

    let mut keys = Vec::new();
    let mut first = true;
    for clause in order_by.split(',') {
        let clause = clause.trim();
        if clause.is_empty() {
            continue;
        }

        let mut parts = clause.split_whitespace();
        let field = match parts.next() {
            Some(field) => field,
            None => continue,
        };
        let descending = parts
            .next()
            .is_some_and(|token| token.eq_ignore_ascii_case("desc"));

        match collection.sortable(field) {
            Some(canonical) => keys.push(OrderKey {
                field: canonical.to_string(),
                descending,
            }),
            None if first => {
                // Unrecognized primary key: the whole string is untrusted,
                // fall back to the deterministic default.
                return default;
            }
            None => {
                tracing::debug!(field, "dropping unrecognized orderBy clause");
            }
        }
        first = false;
    }

    if keys.is_empty() { default } else { OrderSpec { keys } }
}

/// Total ordering over JSON values
///
/// Values of different kinds order by kind rank (null < bool < number <
/// string < array < object); numbers compare numerically, strings
/// lexicographically. Deterministic for any input the decoder can produce.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}
