//! HTTP transport seam.
//!
//! The executor hands a fully built POST to a [`Transport`] and gets back the
//! status and the complete body. Transports carry no retry, throttling or
//! classification policy of their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use crate::error::{GraphqlClientError, HttpErrorInfo};

/// Outbound HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Target URL.
    pub url: String,
    /// Headers attached verbatim.
    pub headers: HeaderMap,
    /// Serialized body.
    pub body: Vec<u8>,
}

/// Completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response status.
    pub status: StatusCode,
    /// Full response body.
    pub body: Vec<u8>,
}

/// An HTTP-capable sender.
///
/// Errors cover connection failures and body read failures only; any status
/// code is a successful exchange at this layer.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpErrorInfo>;
}

/// [`Transport`] backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with a per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, GraphqlClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Wrap an existing client, e.g. one preconfigured with authentication.
    #[must_use]
    pub const fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpErrorInfo> {
        let response = self
            .http
            .post(&request.url)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}
