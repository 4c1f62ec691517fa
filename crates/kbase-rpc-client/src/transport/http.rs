//! HTTP transport implementation for the RPC client

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::transport::{Transport, TransportRequest, TransportResponse, TransportStatistics};

/// HTTP transport backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client
    client: Client,
    /// Extra headers sent with every request
    headers: HashMap<String, String>,
    /// Statistics
    stats: Arc<parking_lot::Mutex<TransportStatistics>>,
}

impl HttpTransport {
    /// Create a new HTTP transport with default settings
    pub fn new() -> Result<Self, TransportError> {
        Self::from_config(&ClientConfig::default())
    }

    /// Create a transport honoring the connection and timeout settings
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().connect_timeout(config.timeouts.connect);
        if let Some(user_agent) = &config.connection.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(
            client,
            config.connection.headers.clone().unwrap_or_default(),
        ))
    }

    /// Create HTTP transport with custom client
    pub fn with_client(client: Client, headers: HashMap<String, String>) -> Self {
        Self {
            client,
            headers,
            stats: Arc::new(parking_lot::Mutex::new(TransportStatistics::default())),
        }
    }

    /// Update statistics
    fn update_stats<F>(&self, update_fn: F)
    where
        F: FnOnce(&mut TransportStatistics),
    {
        let mut stats = self.stats.lock();
        update_fn(&mut stats);
    }

    fn record_error(&self, error: &TransportError) {
        self.update_stats(|stats| {
            stats.errors += 1;
            stats.last_error = Some(error.to_string());
        });
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let start_time = Instant::now();
        self.update_stats(|stats| stats.requests_sent += 1);

        let mut req_builder = self
            .client
            .post(request.url.clone())
            .timeout(request.timeout)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");

        for (name, value) in &self.headers {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }

        if let Some(authorization) = &request.authorization {
            req_builder = req_builder.header("Authorization", authorization.as_str());
        }

        let response = match req_builder.body(request.body).send().await {
            Ok(response) => response,
            Err(e) => {
                let error = TransportError::from_reqwest(e, request.timeout);
                self.record_error(&error);
                return Err(error);
            }
        };

        let status = response.status().as_u16();

        // The body is the envelope regardless of status; callers decide what a
        // non-2xx status means once they have tried to parse it.
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                let error = TransportError::from_reqwest(e, request.timeout);
                self.record_error(&error);
                return Err(error);
            }
        };

        let elapsed = start_time.elapsed();
        self.update_stats(|stats| {
            stats.responses_received += 1;
            stats.avg_response_time_ms = (stats.avg_response_time_ms
                * (stats.responses_received - 1) as f64
                + elapsed.as_millis() as f64)
                / stats.responses_received as f64;
        });

        debug!(
            url = %request.url,
            status,
            elapsed_ms = elapsed.as_millis(),
            "HTTP exchange completed"
        );

        Ok(TransportResponse { status, body })
    }

    fn statistics(&self) -> TransportStatistics {
        self.stats.lock().clone()
    }
}
