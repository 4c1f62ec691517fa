//! JSON-RPC client bound to one endpoint and one dialect

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use kbase_rpc_envelope::Dialect;

use crate::config::ClientConfig;
use crate::error::{RpcClientError, RpcClientResult, TransportError};
use crate::transport::{HttpTransport, Transport, TransportRequest, parse_endpoint};

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Overrides the client's request timeout for this call
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// JSON-RPC client for a single endpoint
#[derive(Debug, Clone)]
pub struct RpcClient {
    /// Server endpoint URL
    url: Url,
    /// Wire grammar spoken to the endpoint
    dialect: Dialect,
    /// Transport layer
    transport: Arc<dyn Transport>,
    /// Opaque `Authorization` header value
    authorization: Option<String>,
    /// Default request timeout
    timeout: Duration,
}

impl RpcClient {
    /// Create a client with default configuration
    pub fn new(url: &str, dialect: Dialect) -> RpcClientResult<Self> {
        RpcClientBuilder::new(url).dialect(dialect).build()
    }

    pub fn builder(url: &str) -> RpcClientBuilder {
        RpcClientBuilder::new(url)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn authorization(&self) -> Option<&str> {
        self.authorization.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Same client settings aimed at a different endpoint
    pub fn with_url(&self, url: Url) -> Self {
        Self {
            url,
            ..self.clone()
        }
    }

    /// Same client settings speaking a different dialect
    pub fn with_dialect(&self, dialect: Dialect) -> Self {
        Self {
            dialect,
            ..self.clone()
        }
    }

    /// Call `method` and return its decoded `result`.
    ///
    /// 1.1 results come back as the raw array payload, 2.0 results as the
    /// raw JSON value.
    pub async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        options: CallOptions,
    ) -> RpcClientResult<Value> {
        let envelope = self.dialect.build_request(method, params)?;
        let body = envelope.to_json()?;
        let timeout = options.timeout.unwrap_or(self.timeout);

        debug!(
            method,
            id = envelope.id(),
            dialect = %self.dialect,
            url = %self.url,
            "Sending JSON-RPC request"
        );

        let start_time = Instant::now();
        let response = self
            .transport
            .post(TransportRequest {
                url: self.url.clone(),
                body,
                authorization: self.authorization.clone(),
                timeout,
            })
            .await?;

        let parsed = match self.dialect.parse_response(&response.body) {
            Ok(parsed) => parsed,
            Err(_) if !response.is_success() => {
                return Err(TransportError::HttpStatus {
                    status: response.status,
                    body: response.body,
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };

        debug!(
            method,
            id = envelope.id(),
            status = response.status,
            elapsed_ms = start_time.elapsed().as_millis(),
            is_error = parsed.is_error(),
            "JSON-RPC response received"
        );

        parsed.into_result().map_err(|error| RpcClientError::Rpc {
            dialect: self.dialect,
            error,
        })
    }
}

/// Builder for [`RpcClient`]
#[derive(Debug)]
pub struct RpcClientBuilder {
    url: String,
    dialect: Dialect,
    transport: Option<Arc<dyn Transport>>,
    config: ClientConfig,
}

impl RpcClientBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dialect: Dialect::default(),
            transport: None,
            config: ClientConfig::default(),
        }
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn authorization(mut self, token: impl Into<String>) -> Self {
        self.config.authorization = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeouts.request = timeout;
        self
    }

    /// Share a transport (and its connection pool) between clients
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> RpcClientResult<RpcClient> {
        let url = parse_endpoint(&self.url)?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&self.config)?),
        };

        Ok(RpcClient {
            url,
            dialect: self.dialect,
            transport,
            authorization: self.config.authorization,
            timeout: self.config.timeouts.request,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportResponse, TransportStatistics};
    use async_trait::async_trait;
    use serde_json::json;

    /// Answers every POST with a canned response and remembers the last request
    #[derive(Debug)]
    struct CannedTransport {
        response: TransportResponse,
        last_request: parking_lot::Mutex<Option<TransportRequest>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: Value) -> Arc<Self> {
            Arc::new(Self {
                response: TransportResponse::new(status, body.to_string()),
                last_request: parking_lot::Mutex::new(None),
            })
        }

        fn raw(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                response: TransportResponse::new(status, body),
                last_request: parking_lot::Mutex::new(None),
            })
        }

        fn last_body(&self) -> Value {
            let request = self.last_request.lock().clone().unwrap();
            serde_json::from_str(&request.body).unwrap()
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn post(
            &self,
            request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            *self.last_request.lock() = Some(request);
            Ok(self.response.clone())
        }

        fn statistics(&self) -> TransportStatistics {
            TransportStatistics::default()
        }
    }

    fn client(dialect: Dialect, transport: Arc<CannedTransport>) -> RpcClient {
        RpcClient::builder("http://localhost:5000/rpc")
            .dialect(dialect)
            .authorization("TOKEN")
            .transport(transport)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_v20_result() {
        let transport =
            CannedTransport::new(200, json!({"jsonrpc": "2.0", "id": "x", "result": {"ok": true}}));
        let client = client(Dialect::V2_0, transport.clone());

        let result = client
            .call("M.f", Some(json!({"a": 1})), CallOptions::default())
            .await
            .unwrap();
        assert_eq!(result, json!({"ok": true}));

        let sent = transport.last_body();
        assert_eq!(sent["jsonrpc"], "2.0");
        assert_eq!(sent["method"], "M.f");
        assert_eq!(sent["params"], json!({"a": 1}));

        let request = transport.last_request.lock().clone().unwrap();
        assert_eq!(request.authorization.as_deref(), Some("TOKEN"));
        assert_eq!(request.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_v11_result_is_raw_array() {
        let transport = CannedTransport::new(
            200,
            json!({"version": "1.1", "id": "x", "result": [{"n": 1}], "error": null}),
        );
        let client = client(Dialect::V1_1, transport.clone());

        let result = client
            .call("M.f", Some(json!({"a": 1})), CallOptions::default())
            .await
            .unwrap();
        assert_eq!(result, json!([{"n": 1}]));
        assert_eq!(transport.last_body()["params"], json!([{"a": 1}]));
    }

    #[tokio::test]
    async fn test_error_envelope_is_rpc_error() {
        let transport = CannedTransport::new(
            200,
            json!({"jsonrpc": "2.0", "id": "x", "error": {"code": -32601, "message": "Method not found"}}),
        );
        let client = client(Dialect::V2_0, transport);

        let error = client
            .call("M.missing", None, CallOptions::default())
            .await
            .unwrap_err();
        assert_eq!(
            error.rpc_code().and_then(|code| code.as_i64()),
            Some(-32601)
        );
    }

    #[tokio::test]
    async fn test_non_2xx_with_error_envelope_is_rpc_error() {
        let transport = CannedTransport::new(
            500,
            json!({"version": "1.1", "id": "x", "error": {"code": -32500, "message": "boom"}}),
        );
        let client = client(Dialect::V1_1, transport);

        let error = client.call("M.f", None, CallOptions::default()).await.unwrap_err();
        assert!(matches!(error, RpcClientError::Rpc { .. }));
    }

    #[tokio::test]
    async fn test_non_2xx_garbage_is_transport_error() {
        let client = client(Dialect::V2_0, CannedTransport::raw(502, "<html>Bad Gateway</html>"));

        let error = client.call("M.f", None, CallOptions::default()).await.unwrap_err();
        assert!(matches!(
            error,
            RpcClientError::Transport(TransportError::HttpStatus { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn test_2xx_garbage_is_protocol_error() {
        let client = client(Dialect::V2_0, CannedTransport::raw(200, "not json"));

        let error = client.call("M.f", None, CallOptions::default()).await.unwrap_err();
        assert!(error.is_protocol_error());
    }

    #[tokio::test]
    async fn test_invalid_v11_params_never_sent() {
        let transport = CannedTransport::raw(200, "{}");
        let client = client(Dialect::V1_1, transport.clone());

        let error = client
            .call("M.f", Some(json!([1, 2])), CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(error, RpcClientError::Request(_)));
        assert!(transport.last_request.lock().is_none());
    }

    #[tokio::test]
    async fn test_call_timeout_override() {
        let transport =
            CannedTransport::new(200, json!({"jsonrpc": "2.0", "id": 1, "result": null}));
        let client = client(Dialect::V2_0, transport.clone());

        client
            .call("M.f", None, CallOptions::with_timeout(Duration::from_millis(750)))
            .await
            .unwrap();
        let request = transport.last_request.lock().clone().unwrap();
        assert_eq!(request.timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        assert!(RpcClient::new("ftp://example.org", Dialect::V2_0).is_err());
    }
}
