//! Typed GraphQL wire codec.
//!
//! Exchange typed values with any GraphQL endpoint without schema-driven
//! code generation:
//! - `decode`: combinators that turn response JSON into typed values,
//!   including `__typename`-dispatched unions and interfaces
//! - `encode`: combinators that turn typed values into the JSON variables
//!   of a request
//! - `response`: classification of a raw HTTP exchange into one
//!   discriminated [`Outcome`]
//! - `error`: the GraphQL error objects both sides of that classification
//!   speak
//!
//! Queries stay opaque strings; nothing here parses or validates GraphQL.
//!
//! # Example
//!
//! ```ignore
//! use graphette_codec::{decode, response::classify};
//!
//! struct Hero { name: String }
//!
//! let hero = decode::object(|hero| hero)
//!     .field("hero", decode::object(|name| Hero { name })
//!         .field("name", decode::string())
//!         .build())
//!     .build::<Hero>();
//!
//! // `raw` comes from whatever transport issued the request.
//! let outcome = classify(&hero, raw);
//! ```

pub mod decode;
pub mod encode;
pub mod error;
pub mod id;
pub mod response;

pub use decode::{DecodeError, DecodeErrorKind, Decoder};
pub use error::{ErrorLocation, GraphQLError, PathSegment};
pub use id::Id;
pub use response::{
    classify, classify_with_partial_errors, Outcome, RawResponse, ResponseMeta, TransportError,
};
