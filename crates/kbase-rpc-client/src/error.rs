//! Error types for RPC client operations

use std::time::Duration;
use thiserror::Error;

use kbase_rpc_envelope::{Dialect, ErrorCode, ProtocolError, RequestError, RpcErrorObject};

use crate::cache::CacheError;

/// Result type for RPC client operations
pub type RpcClientResult<T> = Result<T, RpcClientError>;

/// Error type for RPC client operations.
///
/// Every variant is terminal for the call that produced it; nothing here is
/// retried or downgraded to a default result.
#[derive(Error, Debug)]
pub enum RpcClientError {
    /// Network failure or an HTTP response that carried no valid envelope
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Response body violated the dialect grammar
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Request could not be expressed in the dialect
    #[error("Invalid request: {0}")]
    Request(#[from] RequestError),

    /// The remote method returned an error envelope
    #[error("{dialect} error from remote method: {error}")]
    Rpc {
        dialect: Dialect,
        error: RpcErrorObject,
    },

    /// Service resolution through the cache failed
    #[error("Service resolution error: {0}")]
    Cache(#[from] CacheError<RpcClientError>),

    /// JSON (de)serialization of params or results
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Result did not have the shape the caller asked for
    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Transport-specific errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP status {status} without a valid response envelope: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    /// Classify a reqwest failure
    pub fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            TransportError::Timeout(timeout)
        } else if error.is_connect() {
            TransportError::ConnectionFailed(error.to_string())
        } else {
            TransportError::Http(error.to_string())
        }
    }
}

impl RpcClientError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if the error is a protocol-level issue
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Check if the error came from the transport
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if a cache waiter gave up on an in-flight resolution
    pub fn is_cache_timeout(&self) -> bool {
        matches!(self, Self::Cache(CacheError::Timeout { .. }))
    }

    /// The remote error object, if the remote method failed
    pub fn rpc_error(&self) -> Option<&RpcErrorObject> {
        match self {
            Self::Rpc { error, .. } => Some(error),
            Self::Cache(CacheError::Fetch { source, .. }) => source.rpc_error(),
            _ => None,
        }
    }

    /// The remote error code, if the remote method failed
    pub fn rpc_code(&self) -> Option<&ErrorCode> {
        self.rpc_error().and_then(|error| error.code.as_ref())
    }
}
