//! Decoder combinators: typed values out of JSON trees.
//!
//! A [`Decoder<T>`] is an immutable value that knows how to turn a
//! `serde_json::Value` into a `T`, or fail with a [`DecodeError`] carrying
//! the path to the offending spot. Decoders are built once from the
//! combinators below and reused for any number of inputs; running one has no
//! side effects, so the same decoder and the same input always produce the
//! same result, from any thread.
//!
//! ```ignore
//! use graphette_codec::decode;
//!
//! struct Human { name: String, age: i64 }
//!
//! let human = decode::object(|name, age| Human { name, age })
//!     .field("name", decode::string())
//!     .field("age", decode::int())
//!     .build();
//!
//! let value = serde_json::json!({ "name": "Cam", "age": 5 });
//! let decoded = human.decode(&value)?;
//! ```

use serde_json::Value as Json;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::error::{fmt_path, PathSegment};
use crate::id::Id;

// ============================================================================
// Errors
// ============================================================================

/// Why a decode attempt failed, without location information.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// A required value (usually an object field) was absent.
    #[error("missing value")]
    Missing,
    /// The value was present but had the wrong JSON type.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// A string did not appear in the enum lookup table.
    #[error("unexpected enum value: {0:?}")]
    UnknownEnumValue(String),
    /// A `__typename` did not match any declared variant.
    #[error("unexpected typename: {0:?}")]
    UnknownTypename(String),
    /// The input was not parseable as JSON at all.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    /// Free-form failure, for custom scalar decoders.
    #[error("{0}")]
    Custom(String),
}

/// A failed decode attempt: what went wrong and where.
///
/// The path is relative to the value the decoder was applied to and grows at
/// the front as the failure propagates out of nested `field`/`list` layers.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeError {
    path: Vec<PathSegment>,
    kind: DecodeErrorKind,
}

impl DecodeError {
    /// Wraps a kind with an empty path.
    pub fn new(kind: DecodeErrorKind) -> Self {
        Self {
            path: Vec::new(),
            kind,
        }
    }

    /// A required value was absent.
    pub fn missing() -> Self {
        Self::new(DecodeErrorKind::Missing)
    }

    /// The value had the wrong JSON type for what the decoder expected.
    pub fn mismatch(expected: &'static str, found: &Json) -> Self {
        Self::new(DecodeErrorKind::TypeMismatch {
            expected,
            found: json_type_name(found),
        })
    }

    /// Free-form failure for custom scalar decoders.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::new(DecodeErrorKind::Custom(message.into()))
    }

    /// Path from the decoded root to the failure.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn kind(&self) -> &DecodeErrorKind {
        &self.kind
    }

    pub(crate) fn at_field(mut self, name: &str) -> Self {
        self.path.insert(0, PathSegment::Field(name.to_owned()));
        self
    }

    pub(crate) fn at_index(mut self, index: usize) -> Self {
        self.path.insert(0, PathSegment::Index(index));
        self
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.path.is_empty() {
            f.write_str(" at ")?;
            fmt_path(&self.path, f)?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeError {}

fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

// ============================================================================
// Decoder
// ============================================================================

type DecodeFn<T> = dyn Fn(Option<&Json>) -> Result<T, DecodeError> + Send + Sync;

/// A reusable conversion from JSON into `T`.
///
/// The inner function receives `None` when the decoder is applied to a spot
/// where no value exists (an absent object field); that is how [`maybe`]
/// tells "missing" apart from "present but wrong". Everything else treats
/// absence as [`DecodeErrorKind::Missing`].
pub struct Decoder<T> {
    run: Arc<DecodeFn<T>>,
}

impl<T> Clone for Decoder<T> {
    fn clone(&self) -> Self {
        Self {
            run: Arc::clone(&self.run),
        }
    }
}

impl<T: 'static> Decoder<T> {
    fn from_fn(
        run: impl Fn(Option<&Json>) -> Result<T, DecodeError> + Send + Sync + 'static,
    ) -> Self {
        Self { run: Arc::new(run) }
    }

    /// Runs the decoder against a JSON value.
    pub fn decode(&self, value: &Json) -> Result<T, DecodeError> {
        (self.run)(Some(value))
    }

    pub(crate) fn decode_opt(&self, value: Option<&Json>) -> Result<T, DecodeError> {
        (self.run)(value)
    }

    /// Transforms the decoded value. Failure behavior is untouched.
    pub fn map<U: 'static>(self, f: impl Fn(T) -> U + Send + Sync + 'static) -> Decoder<U> {
        Decoder::from_fn(move |value| (self.run)(value).map(&f))
    }
}

// ============================================================================
// Scalars
// ============================================================================

/// Lifts a raw JSON conversion into a [`Decoder`].
///
/// This is the extension point for custom scalar types; the built-in scalar
/// decoders are defined through it.
pub fn scalar<T: 'static>(
    f: impl Fn(&Json) -> Result<T, DecodeError> + Send + Sync + 'static,
) -> Decoder<T> {
    Decoder::from_fn(move |value| match value {
        Some(v) => f(v),
        None => Err(DecodeError::missing()),
    })
}

/// Decodes a JSON string.
pub fn string() -> Decoder<String> {
    scalar(|v| {
        v.as_str()
            .map(str::to_owned)
            .ok_or_else(|| DecodeError::mismatch("string", v))
    })
}

/// Decodes a JSON integer.
pub fn int() -> Decoder<i64> {
    scalar(|v| v.as_i64().ok_or_else(|| DecodeError::mismatch("integer", v)))
}

/// Decodes any JSON number.
pub fn float() -> Decoder<f64> {
    scalar(|v| v.as_f64().ok_or_else(|| DecodeError::mismatch("number", v)))
}

/// Decodes a JSON boolean.
pub fn boolean() -> Decoder<bool> {
    scalar(|v| v.as_bool().ok_or_else(|| DecodeError::mismatch("boolean", v)))
}

/// Decodes an [`Id`] from a JSON string or number.
///
/// The only input-polymorphic scalar: endpoints disagree on whether IDs are
/// strings or numbers, so both normalize into the same value.
pub fn id() -> Decoder<Id> {
    scalar(|v| match v {
        Json::String(s) => Ok(Id::new(s.clone())),
        Json::Number(n) => Ok(Id::new(n.to_string())),
        _ => Err(DecodeError::mismatch("string or number", v)),
    })
}

/// Decodes a GraphQL enum by exact string lookup.
///
/// The table is scanned in order and the first match wins; a duplicate name
/// later in the table is legal but unreachable. An unknown string fails with
/// a message naming it.
pub fn enumeration<S, T>(table: impl IntoIterator<Item = (S, T)>) -> Decoder<T>
where
    S: Into<String>,
    T: Clone + Send + Sync + 'static,
{
    let table: Vec<(String, T)> = table.into_iter().map(|(s, t)| (s.into(), t)).collect();
    scalar(move |v| {
        let raw = v
            .as_str()
            .ok_or_else(|| DecodeError::mismatch("string", v))?;
        table
            .iter()
            .find(|(name, _)| name == raw)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| DecodeError::new(DecodeErrorKind::UnknownEnumValue(raw.to_owned())))
    })
}

// ============================================================================
// Containers
// ============================================================================

/// Absorbs failure into `None`.
///
/// Yields `None` both when the spot is absent (a missing object field) and
/// when the inner decoder does not match what is there — JSON `null` is not
/// special-cased, it is simply a value `decoder` will not match.
pub fn maybe<T: 'static>(decoder: Decoder<T>) -> Decoder<Option<T>> {
    Decoder::from_fn(move |value| match value {
        None => Ok(None),
        Some(v) => Ok(decoder.decode(v).ok()),
    })
}

/// Decodes a JSON array element-wise.
///
/// Stops at the first failing element, embedding its index in the error path.
pub fn list<T: 'static>(decoder: Decoder<T>) -> Decoder<Vec<T>> {
    Decoder::from_fn(move |value| {
        let v = value.ok_or_else(DecodeError::missing)?;
        let items = v
            .as_array()
            .ok_or_else(|| DecodeError::mismatch("array", v))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| decoder.decode(item).map_err(|e| e.at_index(index)))
            .collect()
    })
}

// ============================================================================
// Objects
// ============================================================================

/// Starts an object decoder from a constructor.
///
/// Chain one [`field`](ObjectDecoder::field) call per constructor parameter,
/// **in parameter order**, then [`build`](ObjectDecoder::build). Fields are
/// matched to parameters by position alone — there is no name-based
/// reconciliation, so swapping two same-typed fields produces a wrongly
/// filled value, not an error. Decoding is all-or-nothing: the first field
/// that fails fails the whole object.
///
/// ```ignore
/// let point = decode::object(|x, y| Point { x, y })
///     .field("x", decode::float())
///     .field("y", decode::float())
///     .build();
/// ```
pub fn object<F>(constructor: F) -> ObjectDecoder<F, ()> {
    ObjectDecoder {
        constructor,
        fields: (),
    }
}

/// Partial object decoder: a constructor plus the fields collected so far.
pub struct ObjectDecoder<F, Fields> {
    constructor: F,
    fields: Fields,
}

pub struct NamedField<A> {
    name: String,
    decoder: Decoder<A>,
}

fn require_object(value: Option<&Json>) -> Result<&serde_json::Map<String, Json>, DecodeError> {
    match value {
        None => Err(DecodeError::missing()),
        Some(Json::Object(map)) => Ok(map),
        Some(other) => Err(DecodeError::mismatch("object", other)),
    }
}

macro_rules! object_arities {
    ($( ($($A:ident $a:ident),*) )+) => { $(
        impl<F, $($A: 'static),*> ObjectDecoder<F, ($(NamedField<$A>,)*)> {
            /// Adds the next positional field.
            pub fn field<Z: 'static>(
                self,
                name: impl Into<String>,
                decoder: Decoder<Z>,
            ) -> ObjectDecoder<F, ($(NamedField<$A>,)* NamedField<Z>,)> {
                let ($($a,)*) = self.fields;
                ObjectDecoder {
                    constructor: self.constructor,
                    fields: ($($a,)* NamedField { name: name.into(), decoder },),
                }
            }

            /// Finishes the chain into a [`Decoder`].
            pub fn build<T: 'static>(self) -> Decoder<T>
            where
                F: Fn($($A),*) -> T + Send + Sync + 'static,
            {
                let constructor = self.constructor;
                let ($($a,)*) = self.fields;
                Decoder::from_fn(move |value| {
                    let _object = require_object(value)?;
                    $(
                        let $a = $a
                            .decoder
                            .decode_opt(_object.get($a.name.as_str()))
                            .map_err(|e| e.at_field(&$a.name))?;
                    )*
                    Ok((constructor)($($a),*))
                })
            }
        }
    )+ };
}

object_arities! {
    ()
    (A1 f1)
    (A1 f1, A2 f2)
    (A1 f1, A2 f2, A3 f3)
    (A1 f1, A2 f2, A3 f3, A4 f4)
    (A1 f1, A2 f2, A3 f3, A4 f4, A5 f5)
    (A1 f1, A2 f2, A3 f3, A4 f4, A5 f5, A6 f6)
    (A1 f1, A2 f2, A3 f3, A4 f4, A5 f5, A6 f6, A7 f7)
    (A1 f1, A2 f2, A3 f3, A4 f4, A5 f5, A6 f6, A7 f7, A8 f8)
    (A1 f1, A2 f2, A3 f3, A4 f4, A5 f5, A6 f6, A7 f7, A8 f8, A9 f9)
    (A1 f1, A2 f2, A3 f3, A4 f4, A5 f5, A6 f6, A7 f7, A8 f8, A9 f9, A10 f10)
    (A1 f1, A2 f2, A3 f3, A4 f4, A5 f5, A6 f6, A7 f7, A8 f8, A9 f9, A10 f10, A11 f11)
    (A1 f1, A2 f2, A3 f3, A4 f4, A5 f5, A6 f6, A7 f7, A8 f8, A9 f9, A10 f10, A11 f11, A12 f12)
}

// ============================================================================
// Unions and interfaces
// ============================================================================

/// One arm of a [`union`] or [`interface`] decoder.
pub struct Variant<U> {
    typename: String,
    decoder: Decoder<U>,
}

/// Pairs a `__typename` literal with the decoder for that shape and an
/// injection into the common result type.
pub fn variant<T: 'static, U: 'static>(
    typename: impl Into<String>,
    decoder: Decoder<T>,
    inject: impl Fn(T) -> U + Send + Sync + 'static,
) -> Variant<U> {
    Variant {
        typename: typename.into(),
        decoder: decoder.map(inject),
    }
}

/// Decodes a polymorphic value by `__typename` dispatch.
///
/// Reads the `__typename` string field, scans the variant list in order, and
/// runs the first variant whose typename matches. A missing or non-string
/// `__typename`, a typename no variant claims, or a failure inside the
/// selected variant each fail the whole decoder. When two variants claim the
/// same typename the first listed always wins and the second is unreachable;
/// that is by contract and not rejected at construction time.
pub fn union<U: 'static>(variants: Vec<Variant<U>>) -> Decoder<U> {
    Decoder::from_fn(move |value| {
        let object = require_object(value)?;
        let raw = object
            .get("__typename")
            .ok_or_else(|| DecodeError::missing().at_field("__typename"))?;
        let typename = raw
            .as_str()
            .ok_or_else(|| DecodeError::mismatch("string", raw).at_field("__typename"))?;
        let variant = variants
            .iter()
            .find(|v| v.typename == typename)
            .ok_or_else(|| {
                DecodeError::new(DecodeErrorKind::UnknownTypename(typename.to_owned()))
            })?;
        variant.decoder.decode_opt(value)
    })
}

/// Alias of [`union`] for GraphQL interface types; the dispatch is identical.
pub fn interface<U: 'static>(variants: Vec<Variant<U>>) -> Decoder<U> {
    union(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_builtins() {
        assert_eq!(string().decode(&json!("hi")).unwrap(), "hi");
        assert_eq!(int().decode(&json!(42)).unwrap(), 42);
        assert_eq!(float().decode(&json!(2.5)).unwrap(), 2.5);
        assert_eq!(float().decode(&json!(3)).unwrap(), 3.0);
        assert!(boolean().decode(&json!(true)).unwrap());
    }

    #[test]
    fn test_scalar_mismatches() {
        let err = string().decode(&json!(1)).unwrap_err();
        assert_eq!(
            *err.kind(),
            DecodeErrorKind::TypeMismatch {
                expected: "string",
                found: "number"
            }
        );
        assert!(int().decode(&json!(1.5)).is_err());
        assert!(boolean().decode(&json!("true")).is_err());
    }

    #[test]
    fn test_id_accepts_string_or_number() {
        assert_eq!(id().decode(&json!("1000")).unwrap(), Id::new("1000"));
        assert_eq!(id().decode(&json!(1000)).unwrap(), Id::new("1000"));
        assert!(id().decode(&json!(true)).is_err());
    }

    #[test]
    fn test_enumeration_first_match_wins() {
        #[derive(Debug, Clone, PartialEq)]
        enum Episode {
            NewHope,
            Empire,
        }

        let episode = enumeration(vec![
            ("NEWHOPE", Episode::NewHope),
            ("EMPIRE", Episode::Empire),
            ("NEWHOPE", Episode::Empire),
        ]);

        assert_eq!(episode.decode(&json!("NEWHOPE")).unwrap(), Episode::NewHope);
        assert_eq!(episode.decode(&json!("EMPIRE")).unwrap(), Episode::Empire);
    }

    #[test]
    fn test_enumeration_unknown_value_names_the_string() {
        let letter = enumeration(vec![("A", 1), ("B", 2)]);
        let err = letter.decode(&json!("C")).unwrap_err();
        assert_eq!(*err.kind(), DecodeErrorKind::UnknownEnumValue("C".into()));
        assert!(err.to_string().contains("\"C\""));
    }

    #[test]
    fn test_object_fields_are_positional() {
        #[derive(Debug, PartialEq)]
        struct Person {
            name: String,
            age: i64,
        }

        let person = object(|name, age| Person { name, age })
            .field("name", string())
            .field("age", int())
            .build();

        let decoded = person.decode(&json!({ "name": "Cam", "age": 5 })).unwrap();
        assert_eq!(
            decoded,
            Person {
                name: "Cam".into(),
                age: 5
            }
        );
    }

    #[test]
    fn test_object_missing_field_names_it() {
        let pair = object(|a: i64, b: i64| (a, b))
            .field("a", int())
            .field("b", int())
            .build();

        let err = pair.decode(&json!({ "a": 1 })).unwrap_err();
        assert_eq!(*err.kind(), DecodeErrorKind::Missing);
        assert_eq!(err.path(), &[PathSegment::Field("b".into())]);
    }

    #[test]
    fn test_object_is_all_or_nothing() {
        let pair = object(|a: i64, b: i64| (a, b))
            .field("a", int())
            .field("b", int())
            .build();

        assert!(pair.decode(&json!({ "a": 1, "b": "two" })).is_err());
    }

    #[test]
    fn test_object_rejects_non_objects() {
        let one = object(|a: i64| a).field("a", int()).build();
        let err = one.decode(&json!([1])).unwrap_err();
        assert_eq!(
            *err.kind(),
            DecodeErrorKind::TypeMismatch {
                expected: "object",
                found: "array"
            }
        );
    }

    #[test]
    fn test_nested_error_paths() {
        let inner = object(|n: i64| n).field("n", int()).build();
        let outer = object(|rows| rows)
            .field("rows", list(inner))
            .build::<Vec<i64>>();

        let err = outer
            .decode(&json!({ "rows": [{ "n": 1 }, { "n": "x" }] }))
            .unwrap_err();
        assert_eq!(err.to_string(), "expected integer, found string at rows[1].n");
    }

    #[test]
    fn test_maybe_absorbs_mismatch_and_absence() {
        let nickname = object(|nick| nick)
            .field("nick", maybe(string()))
            .build::<Option<String>>();

        // Present and matching.
        assert_eq!(
            nickname.decode(&json!({ "nick": "R2" })).unwrap(),
            Some("R2".to_owned())
        );
        // Present but mismatched: None, not a failure.
        assert_eq!(nickname.decode(&json!({ "nick": 7 })).unwrap(), None);
        // Null is just another mismatched value.
        assert_eq!(nickname.decode(&json!({ "nick": null })).unwrap(), None);
        // Outright missing.
        assert_eq!(nickname.decode(&json!({})).unwrap(), None);
    }

    #[test]
    fn test_list_embeds_failing_index() {
        let numbers = list(int());
        assert_eq!(numbers.decode(&json!([1, 2, 3])).unwrap(), vec![1, 2, 3]);

        let err = numbers.decode(&json!([1, "two", 3])).unwrap_err();
        assert_eq!(err.path(), &[PathSegment::Index(1)]);

        assert!(numbers.decode(&json!("nope")).is_err());
    }

    #[test]
    fn test_map_transforms_success_only() {
        let doubled = int().map(|n| n * 2);
        assert_eq!(doubled.decode(&json!(21)).unwrap(), 42);
        assert!(doubled.decode(&json!("x")).is_err());
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Character {
        Human { name: String },
        Droid { primary_function: String },
    }

    fn character() -> Decoder<Character> {
        union(vec![
            variant(
                "Human",
                object(|name| name).field("name", string()).build(),
                |name| Character::Human { name },
            ),
            variant(
                "Droid",
                object(|f| f).field("primaryFunction", string()).build(),
                |primary_function| Character::Droid { primary_function },
            ),
        ])
    }

    #[test]
    fn test_union_dispatches_on_typename() {
        let decoded = character()
            .decode(&json!({ "__typename": "Droid", "primaryFunction": "Astromech" }))
            .unwrap();
        assert_eq!(
            decoded,
            Character::Droid {
                primary_function: "Astromech".into()
            }
        );
    }

    #[test]
    fn test_union_unknown_typename_fails() {
        let err = character()
            .decode(&json!({ "__typename": "Wookiee", "name": "Chewbacca" }))
            .unwrap_err();
        assert_eq!(
            *err.kind(),
            DecodeErrorKind::UnknownTypename("Wookiee".into())
        );
    }

    #[test]
    fn test_union_missing_typename_fails() {
        let err = character().decode(&json!({ "name": "Luke" })).unwrap_err();
        assert_eq!(*err.kind(), DecodeErrorKind::Missing);
        assert_eq!(err.path(), &[PathSegment::Field("__typename".into())]);
    }

    #[test]
    fn test_union_inner_failure_is_terminal() {
        // Typename recognized, declared field absent.
        let err = character()
            .decode(&json!({ "__typename": "Droid", "name": "R2-D2" }))
            .unwrap_err();
        assert_eq!(err.path(), &[PathSegment::Field("primaryFunction".into())]);
    }

    #[test]
    fn test_union_duplicate_typename_prefers_first() {
        let dup = union(vec![
            variant("Thing", object(|| 1).build(), |n: i64| n),
            variant("Thing", object(|| 2).build(), |n: i64| n),
        ]);
        assert_eq!(dup.decode(&json!({ "__typename": "Thing" })).unwrap(), 1);
    }

    #[test]
    fn test_interface_behaves_like_union() {
        let node = interface(vec![variant(
            "Human",
            object(|name| name).field("name", string()).build(),
            |name: String| name,
        )]);
        assert_eq!(
            node.decode(&json!({ "__typename": "Human", "name": "Leia" }))
                .unwrap(),
            "Leia"
        );
    }

    #[test]
    fn test_decoder_is_reusable_and_pure() {
        let numbers = list(int());
        let input = json!([1, 2]);
        assert_eq!(numbers.decode(&input).unwrap(), numbers.decode(&input).unwrap());

        let clone = numbers.clone();
        assert_eq!(clone.decode(&input).unwrap(), vec![1, 2]);
    }
}
