//! HTTP transport abstraction
//!
//! Defines the `HttpTransport` trait that decouples the client from the
//! HTTP stack. The bundled `ReqwestTransport` covers normal use; embedders
//! substitute their own implementation for custom TLS setups, recording,
//! or test doubles.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;

use crate::constants::USER_AGENT;
use crate::error::{Error, Result};

/// One fully assembled HTTP request.
#[derive(Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Status code and raw body of an HTTP response.
///
/// Statuses are not interpreted at this layer; the client maps them.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Abstraction over the single-request HTTP primitive.
///
/// Implementations execute exactly one request and report the raw
/// outcome. They must not retry, follow auth challenges, or turn
/// non-2xx statuses into errors; that policy belongs to the client.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn HttpTransport>`).
pub trait HttpTransport: Send + Sync {
    /// Execute a single HTTP request.
    fn execute<'a>(
        &'a self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse>> + Send + 'a>>;
}

/// `HttpTransport` backed by a shared `reqwest::Client`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Transport with default settings and the crate User-Agent.
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// Transport with a per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Transport(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute<'a>(
        &'a self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = Result<TransportResponse>> + Send + 'a>> {
        Box::pin(async move {
            let mut req = self
                .client
                .request(request.method, &request.url)
                .headers(request.headers);
            if let Some(body) = request.body {
                req = req.body(body);
            }

            let response = req
                .send()
                .await
                .map_err(|e| Error::Transport(format!("request failed: {e}")))?;

            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| Error::Transport(format!("reading response body: {e}")))?;

            Ok(TransportResponse {
                status,
                body: body.to_vec(),
            })
        })
    }
}
