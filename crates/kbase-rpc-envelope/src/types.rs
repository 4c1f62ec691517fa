use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// Identifier correlating a request with its response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(Number),
    Null,
}

impl RequestId {
    /// Fresh, process-unique request id
    pub fn generate() -> Self {
        RequestId::String(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            _ => None,
        }
    }

    /// Accepts a JSON value as an id, given whether `null` is permitted
    pub(crate) fn from_value(value: &Value, allow_null: bool) -> Option<Self> {
        match value {
            Value::String(s) => Some(RequestId::String(s.clone())),
            Value::Number(n) => Some(RequestId::Number(n.clone())),
            Value::Null if allow_null => Some(RequestId::Null),
            _ => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        RequestId::String(value.to_string())
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        RequestId::Number(value.into())
    }
}

/// The JSON-RPC wire grammar a client speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Dialect {
    /// `{"version": "1.1", ...}` with array-wrapped params and results
    #[serde(rename = "1.1")]
    V1_1,
    /// `{"jsonrpc": "2.0", ...}`
    #[default]
    #[serde(rename = "2.0")]
    V2_0,
}

impl Dialect {
    /// Name of the member that tags envelopes of this dialect
    pub fn discriminator_field(&self) -> &'static str {
        match self {
            Dialect::V1_1 => "version",
            Dialect::V2_0 => "jsonrpc",
        }
    }

    /// Literal value of the discriminator member
    pub fn version(&self) -> &'static str {
        match self {
            Dialect::V1_1 => crate::JSONRPC_11_VERSION,
            Dialect::V2_0 => crate::JSONRPC_20_VERSION,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC {}", self.version())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.1" | "11" | "v1.1" => Ok(Dialect::V1_1),
            "2.0" | "20" | "2" | "v2.0" => Ok(Dialect::V2_0),
            other => Err(format!("unknown JSON-RPC dialect: {}", other)),
        }
    }
}
