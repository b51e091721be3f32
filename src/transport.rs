//! HTTP transport used by the client.
//!
//! The client only needs to send one request and read one response per
//! operation, so the transport is a small trait. [`ReqwestTransport`] is the
//! default; tests and callers with their own HTTP stack can plug in any
//! other implementation.

use crate::errors::Result;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;

/// A request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL
    pub url: String,
    /// JSON body, if any
    pub body: Option<Value>,
}

/// Status and body of a gateway response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw body text
    pub body: String,
}

/// Sends HTTP requests on behalf of the client.
///
/// Implementations must be shareable across tasks; the client holds one
/// for its whole lifetime and never retries.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs `request` and returns the response, whatever its status.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// [`Transport`] backed by a `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured `reqwest` client (timeouts, proxies, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
