//! Shape detection for upstream payloads.
//!
//! Upstream APIs don't agree on how they return collections: some return a bare
//! array, some wrap it in an object (`{"data": [...]}`), some return something
//! that isn't a collection at all. The payload is classified once, here, and
//! the rest of the crate works on [`Payload`] instead of probing JSON shapes.

use serde_json::Value;

use crate::fetch::FetchError;

#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// A bare JSON array.
    Sequence(Vec<Value>),
    /// An object; `field` is the first of its fields holding an array.
    Wrapped { field: String, items: Vec<Value> },
    /// Anything that can't be treated as a collection.
    Opaque(Value),
}

impl Payload {
    /// The records of the collection, or `None` for opaque payloads.
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Payload::Sequence(items) | Payload::Wrapped { items, .. } => Some(items),
            Payload::Opaque(_) => None,
        }
    }

    /// Name of the field the collection was found under, if it was wrapped.
    pub fn wrapper(&self) -> Option<&str> {
        match self {
            Payload::Wrapped { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Payload::Sequence(items),
            Value::Object(map) => {
                // Field order is document order (serde_json `preserve_order`)
                let wrapped = map
                    .iter()
                    .find_map(|(k, v)| v.as_array().map(|items| (k.clone(), items.clone())));

                match wrapped {
                    Some((field, items)) => Payload::Wrapped { field, items },
                    None => Payload::Opaque(Value::Object(map)),
                }
            }
            other => Payload::Opaque(other),
        }
    }
}

/// Short JSON type name used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Requires a bare array of records, as the relation resolver does.
///
/// Wrapped arrays are rejected: a relation source must return the collection itself.
pub fn expect_sequence(value: Value) -> Result<Vec<Value>, FetchError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(FetchError::Shape {
            found: type_name(&other),
        }),
    }
}
