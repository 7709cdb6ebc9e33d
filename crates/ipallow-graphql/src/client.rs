//! GraphQL HTTP client implementation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{
    AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::decode;
use crate::error::{CancelStage, GraphqlClientError};
use crate::operation::{AFTER_VARIABLE, GraphqlOperation, GraphqlRequest, Variables};
use crate::pagination::{CursorPage, PageInfo, PaginationError, paginate_cursor};
use crate::throttle::Throttle;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};

/// Default GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

/// GraphQL client metrics.
#[derive(Debug, Default)]
#[allow(clippy::struct_field_names)]
pub struct GraphqlClientMetrics {
    requests_total: AtomicU64,
    requests_success: AtomicU64,
    requests_error: AtomicU64,
    requests_cancelled: AtomicU64,
}

impl GraphqlClientMetrics {
    /// Snapshot current metrics.
    #[must_use]
    pub fn snapshot(&self) -> GraphqlClientMetricsSnapshot {
        GraphqlClientMetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            requests_error: self.requests_error.load(Ordering::Relaxed),
            requests_cancelled: self.requests_cancelled.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_field_names)]
pub struct GraphqlClientMetricsSnapshot {
    /// Requests handed to the transport.
    pub requests_total: u64,
    /// Requests that decoded successfully.
    pub requests_success: u64,
    /// Requests that failed after dispatch.
    pub requests_error: u64,
    /// Requests abandoned because the caller cancelled.
    pub requests_cancelled: u64,
}

/// GraphQL client configuration.
#[derive(Debug, Clone)]
pub struct GraphqlClientConfig {
    /// Headers applied verbatim to every request.
    pub headers: HeaderMap,
    /// Request timeout for the default transport.
    pub timeout: Duration,
    /// Maximum number of simultaneous in-flight requests.
    pub max_concurrency: usize,
}

impl Default for GraphqlClientConfig {
    fn default() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            headers,
            timeout: Duration::from_secs(30),
            max_concurrency: 1,
        }
    }
}

/// GraphQL client builder.
#[derive(Debug, Clone)]
pub struct GraphqlClientBuilder {
    endpoint: String,
    config: GraphqlClientConfig,
    transport: Option<Arc<dyn Transport>>,
    invalid_headers: Vec<String>,
}

impl Default for GraphqlClientBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl GraphqlClientBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            config: GraphqlClientConfig::default(),
            transport: None,
            invalid_headers: Vec::new(),
        }
    }

    /// Set the endpoint URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.config.headers.insert(name, value);
        self
    }

    /// Add headers given as text; invalid names or values fail `build`.
    #[must_use]
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in headers {
            let (name, value) = (name.as_ref(), value.as_ref());
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    self.config.headers.insert(name, value);
                }
                _ => self.invalid_headers.push(name.to_string()),
            }
        }
        self
    }

    /// Add a bearer token header.
    #[must_use]
    pub fn with_bearer_token(mut self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        match HeaderValue::from_str(&value) {
            Ok(mut header) => {
                header.set_sensitive(true);
                self.config.headers.insert(AUTHORIZATION, header);
            }
            Err(_) => self.invalid_headers.push(AUTHORIZATION.to_string()),
        }
        self
    }

    /// Set the User-Agent header.
    #[must_use]
    pub fn with_user_agent(self, user_agent: impl AsRef<str>) -> Self {
        self.with_headers([(USER_AGENT.as_str(), user_agent.as_ref())])
    }

    /// Set timeout for the default transport.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the maximum number of in-flight requests. Values below 1 are ignored.
    #[must_use]
    pub fn with_concurrency(mut self, max_concurrency: usize) -> Self {
        if max_concurrency >= 1 {
            self.config.max_concurrency = max_concurrency;
        } else {
            warn!(
                max_concurrency,
                kept = self.config.max_concurrency,
                "ignoring concurrency below 1"
            );
        }
        self
    }

    /// Send requests through a caller-provided transport.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<GraphqlClient, GraphqlClientError> {
        if !self.invalid_headers.is_empty() {
            return Err(GraphqlClientError::Config(format!(
                "invalid header(s): {}",
                self.invalid_headers.join(", ")
            )));
        }
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(self.config.timeout)?),
        };
        GraphqlClient::with_transport(self.endpoint, self.config, transport)
    }
}

/// GraphQL client.
///
/// Owns the throttle shared by every request it sends. Clones share the
/// throttle and metrics.
#[derive(Debug, Clone)]
pub struct GraphqlClient {
    endpoint: String,
    config: GraphqlClientConfig,
    transport: Arc<dyn Transport>,
    throttle: Throttle,
    metrics: Arc<GraphqlClientMetrics>,
}

impl GraphqlClient {
    /// Start building a client for the default endpoint.
    #[must_use]
    pub fn builder() -> GraphqlClientBuilder {
        GraphqlClientBuilder::default()
    }

    /// Create a client with explicit configuration and transport.
    pub fn with_transport(
        endpoint: impl Into<String>,
        config: GraphqlClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, GraphqlClientError> {
        let throttle = Throttle::new(config.max_concurrency)?;
        Ok(Self {
            endpoint: endpoint.into(),
            config,
            transport,
            throttle,
            metrics: Arc::new(GraphqlClientMetrics::default()),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub const fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// Return client metrics snapshot.
    #[must_use]
    pub fn metrics(&self) -> GraphqlClientMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Execute a typed operation and return its data.
    pub async fn execute<O: GraphqlOperation>(
        &self,
        variables: Variables,
        cancel: &CancellationToken,
    ) -> Result<O::ResponseData, GraphqlClientError> {
        debug!(operation = O::OPERATION_NAME, "executing GraphQL operation");
        self.execute_request(&O::request(variables), cancel).await
    }

    /// Execute an arbitrary request and decode its data into `R`.
    pub async fn execute_request<R: DeserializeOwned>(
        &self,
        request: &GraphqlRequest,
        cancel: &CancellationToken,
    ) -> Result<R, GraphqlClientError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| GraphqlClientError::Encode(err.to_string()))?;

        let http_request = HttpRequest {
            url: self.endpoint.clone(),
            headers: self.config.headers.clone(),
            body,
        };

        let permit = match self.throttle.acquire(cancel).await {
            Ok(permit) => permit,
            Err(err) => {
                self.record_failure(&err);
                return Err(err);
            }
        };

        self.metrics.requests_total.fetch_add(1, Ordering::Relaxed);
        let exchange = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(GraphqlClientError::Cancelled(CancelStage::Exchange)),
            response = self.transport.send(http_request) => {
                response.map_err(GraphqlClientError::Transport)
            }
        };
        drop(permit);

        let result = exchange.and_then(|response| {
            debug!(status = response.status.as_u16(), bytes = response.body.len(), "GraphQL response");
            decode::classify(&response)
        });

        match &result {
            Ok(_) => {
                self.metrics
                    .requests_success
                    .fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => self.record_failure(err),
        }
        result
    }

    /// Fetch every page of a typed operation.
    ///
    /// `page_info` and `page_items` pick the page info and the node list out
    /// of each page's data. The `after` variable is set to the previous
    /// page's cursor for every page but the first.
    pub async fn paginate<O, L, P, I>(
        &self,
        variables: Variables,
        page_info: P,
        page_items: I,
        cancel: &CancellationToken,
    ) -> Result<Vec<L>, PaginationError<L>>
    where
        O: GraphqlOperation,
        P: Fn(&O::ResponseData) -> PageInfo,
        I: Fn(O::ResponseData) -> Vec<L>,
    {
        debug!(operation = O::OPERATION_NAME, "paginating GraphQL operation");
        self.paginate_request(O::request(variables), page_info, page_items, cancel)
            .await
    }

    /// Fetch every page of an arbitrary request, decoding each page into `R`.
    pub async fn paginate_request<R, L, P, I>(
        &self,
        template: GraphqlRequest,
        page_info: P,
        page_items: I,
        cancel: &CancellationToken,
    ) -> Result<Vec<L>, PaginationError<L>>
    where
        R: DeserializeOwned,
        P: Fn(&R) -> PageInfo,
        I: Fn(R) -> Vec<L>,
    {
        let template = &template;
        let page_info = &page_info;
        let page_items = &page_items;

        paginate_cursor(move |cursor| {
            let mut request = template.clone();
            if let Some(cursor) = cursor {
                request.set_variable(AFTER_VARIABLE, cursor);
            }
            async move {
                let data: R = self.execute_request(&request, cancel).await?;
                let info = page_info(&data);
                Ok::<_, GraphqlClientError>(CursorPage {
                    items: page_items(data),
                    page_info: info,
                })
            }
        })
        .await
    }

    fn record_failure(&self, err: &GraphqlClientError) {
        if err.is_cancelled() {
            self.metrics
                .requests_cancelled
                .fetch_add(1, Ordering::Relaxed);
        } else {
            self.metrics.requests_error.fetch_add(1, Ordering::Relaxed);
        }
        debug!(error = %err, "GraphQL request failed");
    }
}
