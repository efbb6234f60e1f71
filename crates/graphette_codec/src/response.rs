//! Response classification: one deterministic verdict per HTTP exchange.
//!
//! Status codes and body contents can disagree — a 200 carrying an `errors`
//! array, a 500 carrying a perfectly decodable `data` payload. Every caller
//! resolving that disagreement its own way is how clients drift apart, so
//! the precedence lives here, once: [`classify`] and
//! [`classify_with_partial_errors`] fold a raw transport result and a
//! [`Decoder`] into a single [`Outcome`]. Classification is a pure,
//! synchronous function; issuing the request is the transport's job.

use serde::Deserialize;
use serde_json::Value as Json;
use std::collections::HashMap;
use thiserror::Error;

use crate::decode::{DecodeError, DecodeErrorKind, Decoder};
use crate::error::GraphQLError;

/// What came back over the wire, before any interpretation.
///
/// This is the contract a transport implementation fulfills: either one of
/// the three bodyless failure signals, or the full status/headers/body of a
/// completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// The request never went out because the URL was unusable.
    BadUrl(String),
    /// The exchange was abandoned after the configured timeout.
    Timeout,
    /// Connection-level failure: refused, reset, unreachable.
    NetworkError,
    /// A complete HTTP response, whatever its status.
    Status { meta: ResponseMeta, body: String },
}

/// Everything about a completed exchange except the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMeta {
    pub url: String,
    pub status_code: u16,
    pub status_text: String,
    pub headers: HashMap<String, String>,
}

/// A failure below the GraphQL layer, with diagnostics retained.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("bad url: {0}")]
    BadUrl(String),
    #[error("request timed out")]
    Timeout,
    #[error("network failure")]
    Network,
    /// The body looked fine but the HTTP layer itself signaled failure.
    #[error("unexpected http status {} {}", .meta.status_code, .meta.status_text)]
    BadStatus { meta: ResponseMeta, body: String },
    /// The body could not be reconciled with either a `data` decode or an
    /// `errors` array. Keeps the raw body and the decode error for debugging.
    #[error("unusable response body: {error}")]
    BadBody {
        meta: ResponseMeta,
        body: String,
        error: DecodeError,
    },
}

/// The single discriminated verdict on one GraphQL exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// `data` decoded cleanly on a success status.
    Success(T),
    /// Both a decodable `data` and a non-empty `errors` array were present.
    /// Only produced by [`classify_with_partial_errors`].
    PartialSuccess(T, Vec<GraphQLError>),
    /// No usable `data`, but a well-formed `errors` array.
    ValidationErrors(Vec<GraphQLError>),
    /// No usable body at all.
    Transport(TransportError),
}

impl<T> Outcome<T> {
    /// True for [`Success`](Outcome::Success) and
    /// [`PartialSuccess`](Outcome::PartialSuccess).
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_) | Self::PartialSuccess(..))
    }

    /// The decoded data, if any was produced.
    pub fn data(self) -> Option<T> {
        match self {
            Self::Success(data) | Self::PartialSuccess(data, _) => Some(data),
            Self::ValidationErrors(_) | Self::Transport(_) => None,
        }
    }

    /// The GraphQL errors attached to this outcome, empty unless the server
    /// reported some.
    pub fn graphql_errors(&self) -> &[GraphQLError] {
        match self {
            Self::PartialSuccess(_, errors) | Self::ValidationErrors(errors) => errors,
            Self::Success(_) | Self::Transport(_) => &[],
        }
    }

    /// Maps the decoded data, leaving every other variant untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(data) => Outcome::Success(f(data)),
            Self::PartialSuccess(data, errors) => Outcome::PartialSuccess(f(data), errors),
            Self::ValidationErrors(errors) => Outcome::ValidationErrors(errors),
            Self::Transport(error) => Outcome::Transport(error),
        }
    }
}

/// Classifies a raw response, ignoring any `errors` array next to good data.
///
/// Precedence: transport signals pass straight through; an unparseable body
/// is a transport failure; a decodable `data` on a 2xx is a success; a
/// decodable `data` on any other status is distrusted and reported as
/// [`TransportError::BadStatus`]; a failed `data` decode falls back to the
/// `errors` array, and only if that too is unusable does the original decode
/// error surface as [`TransportError::BadBody`].
pub fn classify<T: 'static>(decoder: &Decoder<T>, response: RawResponse) -> Outcome<T> {
    classify_response(decoder, response, false)
}

/// Like [`classify`], but a non-empty `errors` array alongside decodable
/// `data` yields [`Outcome::PartialSuccess`] instead of being ignored.
///
/// An absent or empty array still yields a plain success; a present but
/// malformed array is a hard failure, same as everywhere else in the error
/// model.
pub fn classify_with_partial_errors<T: 'static>(
    decoder: &Decoder<T>,
    response: RawResponse,
) -> Outcome<T> {
    classify_response(decoder, response, true)
}

fn classify_response<T: 'static>(
    decoder: &Decoder<T>,
    response: RawResponse,
    keep_partial_errors: bool,
) -> Outcome<T> {
    let (meta, body) = match response {
        RawResponse::BadUrl(url) => return Outcome::Transport(TransportError::BadUrl(url)),
        RawResponse::Timeout => return Outcome::Transport(TransportError::Timeout),
        RawResponse::NetworkError => return Outcome::Transport(TransportError::Network),
        RawResponse::Status { meta, body } => (meta, body),
    };

    let json: Json = match serde_json::from_str(&body) {
        Ok(json) => json,
        Err(err) => {
            let error = DecodeError::new(DecodeErrorKind::InvalidJson(err.to_string()));
            return Outcome::Transport(TransportError::BadBody { meta, body, error });
        }
    };

    match decoder.decode_opt(json.get("data")) {
        Ok(data) => {
            if !is_success_status(meta.status_code) {
                return Outcome::Transport(TransportError::BadStatus { meta, body });
            }
            if !keep_partial_errors {
                return Outcome::Success(data);
            }
            match json.get("errors") {
                None => Outcome::Success(data),
                Some(raw) => match parse_errors(raw) {
                    Ok(errors) if errors.is_empty() => Outcome::Success(data),
                    Ok(errors) => Outcome::PartialSuccess(data, errors),
                    Err(error) => Outcome::Transport(TransportError::BadBody { meta, body, error }),
                },
            }
        }
        Err(data_error) => match json.get("errors").map(parse_errors) {
            Some(Ok(errors)) => Outcome::ValidationErrors(errors),
            // No errors array, or one the error model rejects: surface the
            // original data decode failure.
            Some(Err(_)) | None => Outcome::Transport(TransportError::BadBody {
                meta,
                body,
                error: data_error.at_field("data"),
            }),
        },
    }
}

fn is_success_status(code: u16) -> bool {
    (200..300).contains(&code)
}

fn parse_errors(raw: &Json) -> Result<Vec<GraphQLError>, DecodeError> {
    Vec::<GraphQLError>::deserialize(raw)
        .map_err(|e| DecodeError::custom(format!("malformed errors array: {e}")).at_field("errors"))
}
