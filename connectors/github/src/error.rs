//! IP allow-list error types.

use ipallow_graphql::{BatchError, GraphqlClientError, PaginationError};
use reqwest::StatusCode;
use thiserror::Error;

use crate::types::IpAllowListEntry;

/// Result type for allow-list operations.
pub type AllowListResult<T> = Result<T, AllowListError>;

/// Allow-list errors, labelled with the operation that failed.
#[derive(Debug, Error)]
pub enum AllowListError {
    /// A single request failed.
    #[error("{operation} error: {source}")]
    Request {
        /// Operation name.
        operation: &'static str,
        #[source]
        source: GraphqlClientError,
    },

    /// A paginated listing failed part way.
    #[error("{operation} error: {source}")]
    Listing {
        /// Operation name.
        operation: &'static str,
        #[source]
        source: PaginationError<IpAllowListEntry>,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AllowListError {
    pub(crate) const fn request(operation: &'static str, source: GraphqlClientError) -> Self {
        Self::Request { operation, source }
    }

    pub(crate) const fn listing(
        operation: &'static str,
        source: PaginationError<IpAllowListEntry>,
    ) -> Self {
        Self::Listing { operation, source }
    }

    /// Underlying client error, if any.
    #[must_use]
    pub const fn graphql(&self) -> Option<&GraphqlClientError> {
        match self {
            Self::Request { source, .. } => Some(source),
            Self::Listing { source, .. } => Some(&source.source),
            Self::Config(_) => None,
        }
    }

    /// HTTP status of a failed exchange.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.graphql().and_then(GraphqlClientError::status)
    }

    /// API-reported errors.
    #[must_use]
    pub fn batch(&self) -> Option<&BatchError> {
        self.graphql().and_then(GraphqlClientError::batch)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.graphql().is_some_and(GraphqlClientError::is_cancelled)
    }

    /// Entries fetched before a listing failed.
    #[must_use]
    pub fn partial_entries(&self) -> &[IpAllowListEntry] {
        match self {
            Self::Listing { source, .. } => &source.partial,
            _ => &[],
        }
    }
}
