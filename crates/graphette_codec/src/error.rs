//! GraphQL error objects as servers report them.
//!
//! A response body may carry an `errors` array next to (or instead of) the
//! `data` field. Each entry is parsed into [`GraphQLError`]. The optional
//! fields default to empty when absent; a present field with the wrong shape
//! is a hard parse failure which the response classifier escalates to a
//! transport-level error.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One validation error reported by a GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    /// Human-readable description of the problem.
    pub message: String,
    /// Positions in the query text the error refers to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<ErrorLocation>,
    /// Traversal path into the response tree where the error originated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
    /// Vendor-specific extra data, passed through untouched.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, serde_json::Value>,
}

impl GraphQLError {
    /// Creates an error with a message and no locations, path, or extensions.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
            extensions: IndexMap::new(),
        }
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if !self.path.is_empty() {
            f.write_str(" at ")?;
            fmt_path(&self.path, f)?;
        }
        Ok(())
    }
}

/// A line/column position in the query source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorLocation {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// One step into a JSON tree: a list index or an object field.
///
/// On the wire a segment is a bare integer or string, so deserialization is
/// untagged. Anything else (a float, a boolean, an object) fails the parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Field(String),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Field(name) => f.write_str(name),
        }
    }
}

/// Renders a path as `hero.friends[2].name`.
pub(crate) fn fmt_path(path: &[PathSegment], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, segment) in path.iter().enumerate() {
        match segment {
            PathSegment::Field(name) => {
                if i > 0 {
                    f.write_str(".")?;
                }
                f.write_str(name)?;
            }
            PathSegment::Index(index) => write!(f, "[{index}]")?,
        }
    }
    Ok(())
}
