//! Configuration types for the RPC client

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{RpcClientError, RpcClientResult};

/// Environment variable consulted for the authorization token
pub const TOKEN_ENV_VAR: &str = "KBASE_TOKEN";

/// Older name for the token variable, read when `KBASE_TOKEN` is unset or empty
pub const LEGACY_TOKEN_ENV_VAR: &str = "TOKEN";

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Opaque token sent verbatim in the `Authorization` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,

    /// Timeout configurations
    pub timeouts: TimeoutConfig,

    /// Connection configurations
    pub connection: ConnectionConfig,

    /// Service resolution cache configuration
    pub cache: CacheConfig,
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout for individual calls
    #[serde(with = "duration_serde")]
    pub request: Duration,

    /// Connection timeout
    #[serde(with = "duration_serde")]
    pub connect: Duration,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// User agent string
    pub user_agent: Option<String>,

    /// Custom headers to include in requests
    pub headers: Option<HashMap<String, String>>,
}

/// Resolution cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a fetched entry stays fresh
    #[serde(with = "duration_serde")]
    pub item_lifetime: Duration,

    /// Period of the background sweep that refreshes stale entries
    #[serde(with = "duration_serde")]
    pub monitoring_frequency: Duration,

    /// Longest a waiter blocks on another caller's in-flight fetch
    #[serde(with = "duration_serde")]
    pub waiter_timeout: Duration,

    /// Longest a waiter sleeps between checks of the in-flight fetch
    #[serde(with = "duration_serde")]
    pub waiter_frequency: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            connect: Duration::from_secs(10),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(format!("kbase-rpc-client/{}", env!("CARGO_PKG_VERSION"))),
            headers: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            item_lifetime: Duration::from_secs(30 * 60),
            monitoring_frequency: Duration::from_secs(60),
            waiter_timeout: Duration::from_secs(30),
            waiter_frequency: Duration::from_millis(100),
        }
    }
}

impl ClientConfig {
    /// Parse a YAML configuration document
    pub fn from_yaml_str(yaml: &str) -> RpcClientResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| RpcClientError::config(format!("Invalid YAML configuration: {}", e)))
    }

    /// Load a YAML configuration file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> RpcClientResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RpcClientError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Overlay the token from `KBASE_TOKEN`, falling back to `TOKEN`
    pub fn with_env_token(self) -> Self {
        self.with_token_from(|name| std::env::var(name).ok())
    }

    /// Overlay the first non-empty token that `lookup` returns for
    /// `KBASE_TOKEN` then `TOKEN`. Keeps the current token if neither is set.
    pub fn with_token_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = [TOKEN_ENV_VAR, LEGACY_TOKEN_ENV_VAR]
            .into_iter()
            .filter_map(&lookup)
            .find(|token| !token.is_empty())
        {
            self.authorization = Some(token);
        }
        self
    }
}

impl CacheConfig {
    pub fn validate(&self) -> RpcClientResult<()> {
        if self.monitoring_frequency.is_zero() {
            return Err(RpcClientError::config("cache monitoring_frequency must be non-zero"));
        }
        if self.waiter_frequency.is_zero() {
            return Err(RpcClientError::config("cache waiter_frequency must be non-zero"));
        }
        Ok(())
    }
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
