//! Encoder combinators: JSON out of typed values.
//!
//! The mirror of [`decode`](crate::decode), and deliberately narrower:
//! encoding is total, so nothing here can fail. A [`Value`] can only be
//! produced through these combinators, which is what guarantees a request's
//! variables are JSON-safe; it is never inspected, only serialized (it
//! implements [`serde::Serialize`]).
//!
//! ```ignore
//! use graphette_codec::encode;
//!
//! let review = encode::input(vec![
//!     ("stars", encode::int(5)),
//!     ("commentary", encode::maybe(|c: &String| encode::string(c.clone()), None)),
//! ]);
//! ```

use serde::{Serialize, Serializer};
use serde_json::Value as Json;

use crate::id::Id;

/// A JSON-safe value built through the encoder combinators.
///
/// Opaque on purpose: callers construct values, the request layer serializes
/// them, and nobody gets to reach inside and smuggle in a non-JSON shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Value(Json);

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Encodes a string.
pub fn string(value: impl Into<String>) -> Value {
    Value(Json::String(value.into()))
}

/// Encodes an integer.
pub fn int(value: i64) -> Value {
    Value(Json::from(value))
}

/// Encodes a float. Non-finite values have no JSON form and become null.
pub fn float(value: f64) -> Value {
    Value(
        serde_json::Number::from_f64(value)
            .map(Json::Number)
            .unwrap_or(Json::Null),
    )
}

/// Encodes a boolean.
pub fn boolean(value: bool) -> Value {
    Value(Json::Bool(value))
}

/// Encodes an [`Id`] as a JSON string.
pub fn id(value: &Id) -> Value {
    Value(Json::String(value.as_str().to_owned()))
}

/// Encodes JSON null.
pub fn null() -> Value {
    Value(Json::Null)
}

/// Encodes a custom scalar through its own JSON projection.
pub fn scalar<T>(to_json: impl Fn(&T) -> Json, value: &T) -> Value {
    Value(to_json(value))
}

/// Encodes a GraphQL enum by its string projection.
pub fn enumeration<T>(to_string: impl Fn(&T) -> String, value: &T) -> Value {
    Value(Json::String(to_string(value)))
}

/// Encodes an input object, preserving the given field order.
pub fn input<S: Into<String>>(fields: impl IntoIterator<Item = (S, Value)>) -> Value {
    let mut object = serde_json::Map::new();
    for (name, value) in fields {
        object.insert(name.into(), value.0);
    }
    Value(Json::Object(object))
}

/// Encodes an optional value, `None` as null.
pub fn maybe<T>(to_value: impl Fn(&T) -> Value, value: Option<&T>) -> Value {
    match value {
        Some(v) => to_value(v),
        None => null(),
    }
}

/// Encodes a sequence element-wise.
pub fn list<T>(to_value: impl Fn(&T) -> Value, items: &[T]) -> Value {
    Value(Json::Array(items.iter().map(|item| to_value(item).0).collect()))
}
