use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::types::{Dialect, RequestId};

/// Error code carried by a remote error object.
///
/// JSON-RPC 2.0 codes are always integers; 1.1 services also send
/// string business codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl ErrorCode {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ErrorCode::Number(code) => Some(*code),
            ErrorCode::Text(text) => text.parse().ok(),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Number(code) => write!(f, "{}", code),
            ErrorCode::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        ErrorCode::Number(code)
    }
}

/// Error object returned by the remote method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            name: None,
            detail: None,
            data: None,
        }
    }
}

impl fmt::Display for RpcErrorObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} (code {})", self.message, code),
            None => write!(f, "{}", self.message),
        }
    }
}

/// The outcome carried by a validated response
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    Result(Value),
    Error(RpcErrorObject),
}

/// A response envelope that passed its dialect's validation
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub dialect: Dialect,
    pub id: RequestId,
    pub payload: ResponsePayload,
}

impl ResponseEnvelope {
    pub fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }

    /// Splits the envelope into the call outcome
    pub fn into_result(self) -> Result<Value, RpcErrorObject> {
        match self.payload {
            ResponsePayload::Result(value) => Ok(value),
            ResponsePayload::Error(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_code_forms() {
        let numeric: ErrorCode = serde_json::from_value(json!(-32601)).unwrap();
        assert_eq!(numeric, ErrorCode::Number(-32601));
        let text: ErrorCode = serde_json::from_value(json!("-32500")).unwrap();
        assert_eq!(text.as_i64(), Some(-32500));
        assert_eq!(ErrorCode::Text("nope".into()).as_i64(), None);
    }

    #[test]
    fn test_into_result() {
        let envelope = ResponseEnvelope {
            dialect: Dialect::V2_0,
            id: RequestId::from("x"),
            payload: ResponsePayload::Error(RpcErrorObject::new(-32601, "Method not found")),
        };
        assert!(envelope.is_error());
        let error = envelope.into_result().unwrap_err();
        assert_eq!(error.to_string(), "Method not found (code -32601)");
    }
}
