//! ipallow GraphQL - Paginated, batch-error GraphQL client infrastructure.
//!
//! This crate provides:
//! - A request executor with a bounded number of in-flight requests.
//! - Response classification into status, decode, batch and field errors.
//! - Cursor pagination with partial results on failure.
//! - A per-owner load-once cache for fully paginated listings.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]

mod cache;
mod client;
mod decode;
mod error;
mod operation;
mod pagination;
mod throttle;
mod transport;

pub use cache::OwnerCache;
pub use client::{
    DEFAULT_ENDPOINT, GraphqlClient, GraphqlClientBuilder, GraphqlClientConfig,
    GraphqlClientMetrics, GraphqlClientMetricsSnapshot,
};
pub use decode::{classify, decode_envelope};
pub use error::{
    BatchError, CancelStage, GraphqlClientError, GraphqlError, GraphqlErrorLocation,
    GraphqlPathSegment, HttpErrorInfo,
};
pub use operation::{AFTER_VARIABLE, GraphqlOperation, GraphqlRequest, GraphqlResponse, Variables};
pub use pagination::{CursorPage, PageInfo, PaginationError, paginate_cursor};
pub use throttle::{Throttle, ThrottlePermit};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub use tokio_util::sync::CancellationToken;
