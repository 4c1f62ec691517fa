use serde_json::{Value, json};
use thiserror::Error;

use crate::error_codes;

/// Result type for envelope operations
pub type EnvelopeResult<T> = Result<T, ProtocolError>;

/// Name of the JSON type of a value, for diagnostics
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A response envelope that violates its dialect's grammar.
///
/// Validation is ordered; the first failing check is the one reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("The response from the service could not be parsed: {message}")]
    Parse { message: String, body: String },

    #[error("The response JSON is not an object (is {found})")]
    NotAnObject { found: &'static str },

    #[error("The response object does not include the \"{field}\" property")]
    MissingDiscriminator { field: &'static str },

    #[error("The response object \"{field}\" must be \"{expected}\", but is {found}")]
    WrongDiscriminator {
        field: &'static str,
        expected: &'static str,
        found: String,
    },

    #[error("The response object does not include the \"id\" property")]
    MissingId,

    #[error("The response id must be one of {allowed}, but is {found}")]
    InvalidIdType {
        allowed: &'static str,
        found: &'static str,
    },

    #[error("The response object must include either a \"result\" or \"error\" property")]
    MissingResultOrError,

    #[error("The response object must not include both the \"result\" and \"error\" property")]
    BothResultAndError,

    #[error("The response \"error\" is not an object (is {found})")]
    ErrorNotObject { found: &'static str },

    #[error("The response \"error\" must include a numeric \"code\" property")]
    MissingErrorCode,

    #[error("The response \"error\" \"code\" property must be an integer (is {found})")]
    InvalidErrorCode { found: &'static str },

    #[error("The response \"error\" must include a \"message\" property")]
    MissingErrorMessage,

    #[error("The response \"error\" \"message\" property must be a string (is {found})")]
    InvalidErrorMessage { found: &'static str },
}

impl ProtocolError {
    /// JSON-RPC style code for this violation
    pub fn code(&self) -> i64 {
        match self {
            ProtocolError::Parse { .. } => error_codes::PARSE_ERROR,
            _ => error_codes::INVALID_REQUEST,
        }
    }

    /// Stable machine-readable name of the violated rule
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolError::Parse { .. } => "parse_error",
            ProtocolError::NotAnObject { .. } => "not_an_object",
            ProtocolError::MissingDiscriminator { .. } => "missing_discriminator",
            ProtocolError::WrongDiscriminator { .. } => "wrong_discriminator",
            ProtocolError::MissingId => "missing_id",
            ProtocolError::InvalidIdType { .. } => "invalid_id_type",
            ProtocolError::MissingResultOrError => "missing_result_or_error",
            ProtocolError::BothResultAndError => "both_result_and_error",
            ProtocolError::ErrorNotObject { .. } => "error_not_object",
            ProtocolError::MissingErrorCode => "missing_error_code",
            ProtocolError::InvalidErrorCode { .. } => "invalid_error_code",
            ProtocolError::MissingErrorMessage => "missing_error_message",
            ProtocolError::InvalidErrorMessage { .. } => "invalid_error_message",
        }
    }

    /// Diagnostic payload, carrying the raw body for parse failures
    pub fn data(&self) -> Value {
        match self {
            ProtocolError::Parse { message, body } => json!({
                "originalMessage": message,
                "responseText": body,
            }),
            other => json!({ "kind": other.kind() }),
        }
    }
}

/// A request that cannot be expressed in the chosen dialect
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("method name must not be empty")]
    EmptyMethod,

    #[error("JSON-RPC 1.1 params must be an array of objects, got {found}")]
    InvalidParams { found: &'static str },

    #[error("JSON-RPC 1.1 param at index {index} must be an object, got {found}")]
    ParamNotObject { index: usize, found: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let parse = ProtocolError::Parse {
            message: "EOF".to_string(),
            body: "{".to_string(),
        };
        assert_eq!(parse.code(), -32700);
        assert_eq!(ProtocolError::MissingId.code(), -32600);
    }

    #[test]
    fn test_parse_error_data_carries_body() {
        let parse = ProtocolError::Parse {
            message: "expected value".to_string(),
            body: "<html>".to_string(),
        };
        assert_eq!(parse.data()["responseText"], "<html>");
        assert_eq!(ProtocolError::BothResultAndError.data()["kind"], "both_result_and_error");
    }

    #[test]
    fn test_json_type_name() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!([1])), "array");
        assert_eq!(json_type_name(&json!(1.5)), "number");
    }
}
