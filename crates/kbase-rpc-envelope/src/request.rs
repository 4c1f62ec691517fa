use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Dialect;

/// JSON-RPC 1.1 request; params are always a sequence of objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpc11Request {
    pub version: String,
    pub method: String,
    pub id: String,
    pub params: Vec<Map<String, Value>>,
}

/// JSON-RPC 2.0 request; params may be any JSON value or omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpc20Request {
    pub jsonrpc: String,
    pub method: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A request envelope in one of the two dialects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestEnvelope {
    V11(JsonRpc11Request),
    V20(JsonRpc20Request),
}

impl RequestEnvelope {
    pub fn dialect(&self) -> Dialect {
        match self {
            RequestEnvelope::V11(_) => Dialect::V1_1,
            RequestEnvelope::V20(_) => Dialect::V2_0,
        }
    }

    pub fn method(&self) -> &str {
        match self {
            RequestEnvelope::V11(req) => &req.method,
            RequestEnvelope::V20(req) => &req.method,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RequestEnvelope::V11(req) => &req.id,
            RequestEnvelope::V20(req) => &req.id,
        }
    }

    /// Params as they appear on the wire (`None` when omitted)
    pub fn params(&self) -> Option<Value> {
        match self {
            RequestEnvelope::V11(req) => Some(Value::Array(
                req.params.iter().cloned().map(Value::Object).collect(),
            )),
            RequestEnvelope::V20(req) => req.params.clone(),
        }
    }

    /// Serialize to the wire JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<JsonRpc11Request> for RequestEnvelope {
    fn from(request: JsonRpc11Request) -> Self {
        RequestEnvelope::V11(request)
    }
}

impl From<JsonRpc20Request> for RequestEnvelope {
    fn from(request: JsonRpc20Request) -> Self {
        RequestEnvelope::V20(request)
    }
}
