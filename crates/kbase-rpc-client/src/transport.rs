//! Transport layer for the RPC client
//!
//! A transport performs one HTTP POST and hands back the raw status and body.
//! It knows nothing about JSON-RPC envelopes.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::error::TransportError;

pub mod http;

pub use http::HttpTransport;

/// One POST to perform
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Target endpoint
    pub url: Url,
    /// Serialized request envelope
    pub body: String,
    /// Opaque value for the `Authorization` header
    pub authorization: Option<String>,
    /// Overall deadline for the exchange
    pub timeout: Duration,
}

/// Raw HTTP response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    /// Create a new transport response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport statistics for monitoring
#[derive(Debug, Clone, Default)]
pub struct TransportStatistics {
    /// Number of requests sent
    pub requests_sent: u64,
    /// Number of responses received
    pub responses_received: u64,
    /// Number of errors encountered
    pub errors: u64,
    /// Average response time
    pub avg_response_time_ms: f64,
    /// Last error message
    pub last_error: Option<String>,
}

/// Transport trait defining the interface for all transport implementations
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// POST a JSON body and return the response text, whatever its status
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;

    /// Get transport statistics
    fn statistics(&self) -> TransportStatistics {
        TransportStatistics::default()
    }
}

/// Parse and check an endpoint URL
pub fn parse_endpoint(endpoint: &str) -> Result<Url, TransportError> {
    let url = Url::parse(endpoint)
        .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TransportError::InvalidUrl(format!(
            "unsupported scheme for HTTP transport: {}",
            url.scheme()
        )));
    }

    Ok(url)
}
