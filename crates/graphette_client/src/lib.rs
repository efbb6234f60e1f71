//! GraphQL HTTP transport for `graphette_codec`.
//!
//! This crate is the I/O half of the pair: it builds the
//! `{ operationName?, query, variables }` request body, speaks HTTP/1.1 over
//! a TCP socket, and feeds whatever comes back into the codec's response
//! classifier. Decoding, encoding, and classification semantics all live in
//! [`graphette_codec`]; nothing here reinterprets them.
//!
//! # Example
//!
//! ```ignore
//! use graphette_client::{Client, Request};
//! use graphette_client::codec::{decode, encode, Outcome};
//!
//! let client = Client::new("http://localhost:4000/graphql");
//!
//! let request = Request::new("query Hero { hero { name } }")
//!     .operation_name("Hero");
//!
//! let hero = decode::object(|hero| hero)
//!     .field("hero", decode::object(|name| name)
//!         .field("name", decode::string())
//!         .build())
//!     .build::<String>();
//!
//! match client.run(&request, &hero).await {
//!     Outcome::Success(name) => println!("hero: {name}"),
//!     other => eprintln!("failed: {other:?}"),
//! }
//! ```

pub mod client;
pub(crate) mod http;

pub use client::{normalize_query, Client, ClientConfig, Request};

/// The codec this transport feeds, re-exported for one-import convenience.
pub use graphette_codec as codec;
