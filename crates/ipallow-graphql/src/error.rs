//! Error types for the GraphQL client.

use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport failure information captured from the HTTP sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorInfo {
    /// Error message.
    pub message: String,
    /// Whether the error was a timeout.
    pub is_timeout: bool,
    /// Whether the error was a connection failure.
    pub is_connect: bool,
}

impl HttpErrorInfo {
    /// Build transport error information for senders that are not reqwest.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_timeout: false,
            is_connect: false,
        }
    }
}

impl fmt::Display for HttpErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if self.is_timeout {
            f.write_str(" (timeout)")?;
        } else if self.is_connect {
            f.write_str(" (connect)")?;
        }
        Ok(())
    }
}

impl From<reqwest::Error> for HttpErrorInfo {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            is_timeout: err.is_timeout(),
            is_connect: err.is_connect(),
        }
    }
}

/// GraphQL error location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlErrorLocation {
    /// Line number in the query (1-based).
    pub line: u32,
    /// Column number in the query (1-based).
    pub column: u32,
}

/// GraphQL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphqlPathSegment {
    /// Field name.
    Key(String),
    /// Array index.
    Index(i64),
}

/// A single error record reported by the API.
///
/// Only `message` ends up in error text; `locations` and `path` are kept for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlError {
    /// Human-readable error message.
    pub message: String,
    /// Location(s) within the query.
    #[serde(default, deserialize_with = "crate::operation::null_as_empty")]
    pub locations: Vec<GraphqlErrorLocation>,
    /// Path within the response where the error occurred.
    #[serde(default, deserialize_with = "crate::operation::null_as_empty")]
    pub path: Vec<GraphqlPathSegment>,
}

/// All error records returned in one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    errors: Vec<GraphqlError>,
}

impl BatchError {
    /// Wrap a non-empty list of error records.
    #[must_use]
    pub fn new(errors: Vec<GraphqlError>) -> Self {
        Self { errors }
    }

    /// Individual error records, in response order.
    #[must_use]
    pub fn errors(&self) -> &[GraphqlError] {
        &self.errors
    }

    /// Individual messages, in response order.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|err| err.message.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.errors.len() == 1 {
            "error"
        } else {
            "errors"
        };
        write!(f, "{} GraphQL {noun} occurred:", self.errors.len())?;
        for (index, message) in self.messages().enumerate() {
            let sep = if index == 0 { " " } else { "; " };
            write!(f, "{sep}{message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}

/// Point at which a cancelled operation was stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelStage {
    /// Waiting for a throttle permit; nothing was sent.
    ThrottleWait,
    /// Waiting for the HTTP exchange to complete.
    Exchange,
    /// Waiting for another fetch to release the owner cache.
    CacheWait,
}

impl fmt::Display for CancelStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThrottleWait => f.write_str("waiting for a throttle permit"),
            Self::Exchange => f.write_str("waiting for the HTTP exchange"),
            Self::CacheWait => f.write_str("waiting for the owner cache"),
        }
    }
}

/// Error type for GraphQL client operations.
#[derive(Debug, Clone, Error)]
pub enum GraphqlClientError {
    /// Connection-level failure; no status code was received.
    #[error("HTTP transport error: {0}")]
    Transport(HttpErrorInfo),

    /// The exchange completed with a status of 300 or above.
    #[error("HTTP status {status} with body: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },

    /// The request envelope could not be serialized.
    #[error("request encoding error: {0}")]
    Encode(String),

    /// The body is not a valid GraphQL response envelope.
    #[error("response decoding error: {0}")]
    Decode(String),

    /// The response carried one or more API error records.
    #[error(transparent)]
    Batch(BatchError),

    /// The `data` payload does not match the requested type.
    #[error("response data decoding error: {0}")]
    FieldDecode(String),

    /// GraphQL protocol violation.
    #[error("GraphQL protocol error: {message}")]
    Protocol {
        /// Details.
        message: String,
    },

    /// Invalid client configuration.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The caller cancelled the operation.
    #[error("operation cancelled while {0}")]
    Cancelled(CancelStage),
}

impl From<reqwest::Error> for GraphqlClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(HttpErrorInfo::from(err))
    }
}

impl GraphqlClientError {
    /// HTTP status carried by a [`GraphqlClientError::HttpStatus`] error.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Batch of API errors, when the response reported any.
    #[must_use]
    pub const fn batch(&self) -> Option<&BatchError> {
        match self {
            Self::Batch(batch) => Some(batch),
            _ => None,
        }
    }

    /// Returns `true` if the caller cancelled the operation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns `true` for a 404 status.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(message: &str) -> GraphqlError {
        GraphqlError {
            message: message.to_string(),
            locations: Vec::new(),
            path: Vec::new(),
        }
    }

    #[test]
    fn batch_display_contains_every_message() {
        let batch = BatchError::new(vec![record("first failure"), record("second failure")]);
        let text = GraphqlClientError::Batch(batch).to_string();

        assert!(text.starts_with("2 GraphQL errors occurred:"));
        assert!(text.contains("first failure"));
        assert!(text.contains("second failure"));
    }

    #[test]
    fn batch_messages_keep_response_order() {
        let batch = BatchError::new(vec![record("a"), record("b"), record("c")]);
        assert_eq!(batch.messages().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn error_record_decodes_locations_and_path() {
        let record: GraphqlError = serde_json::from_value(serde_json::json!({
            "type": "NOT_FOUND",
            "path": ["deleteIpAllowListEntry", 0],
            "locations": [{"line": 2, "column": 3}],
            "message": "Could not resolve to a node"
        }))
        .expect("error record");

        assert_eq!(record.message, "Could not resolve to a node");
        assert_eq!(record.locations[0].line, 2);
        assert_eq!(
            record.path,
            vec![
                GraphqlPathSegment::Key("deleteIpAllowListEntry".to_string()),
                GraphqlPathSegment::Index(0),
            ]
        );
    }

    #[test]
    fn status_accessor_only_matches_status_errors() {
        let err = GraphqlClientError::HttpStatus {
            status: StatusCode::NOT_FOUND,
            body: String::new(),
        };
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.is_not_found());

        let err = GraphqlClientError::Decode("bad".to_string());
        assert_eq!(err.status(), None);
    }
}
