//! JSON-RPC 2.0 envelope grammar.

use serde_json::Value;

use crate::error::{EnvelopeResult, ProtocolError, RequestError, json_type_name};
use crate::request::JsonRpc20Request;
use crate::response::{ErrorCode, ResponseEnvelope, ResponsePayload, RpcErrorObject};
use crate::types::{Dialect, RequestId};
use crate::{JSONRPC_20_VERSION, parse_object};

/// Build a 2.0 request; params pass through unchanged
pub fn build_request(method: &str, params: Option<Value>) -> Result<JsonRpc20Request, RequestError> {
    if method.is_empty() {
        return Err(RequestError::EmptyMethod);
    }

    Ok(JsonRpc20Request {
        jsonrpc: JSONRPC_20_VERSION.to_string(),
        method: method.to_string(),
        id: RequestId::generate().to_string(),
        params,
    })
}

/// Parse and validate a 2.0 response body.
///
/// Member presence is by key: `"result": null` is a valid null result.
pub fn parse_response(raw: &str) -> EnvelopeResult<ResponseEnvelope> {
    let object = parse_object(raw)?;

    match object.get("jsonrpc") {
        None => {
            return Err(ProtocolError::MissingDiscriminator { field: "jsonrpc" });
        }
        Some(Value::String(version)) if version == JSONRPC_20_VERSION => {}
        Some(other) => {
            return Err(ProtocolError::WrongDiscriminator {
                field: "jsonrpc",
                expected: JSONRPC_20_VERSION,
                found: other.to_string(),
            });
        }
    }

    let id = object.get("id").ok_or(ProtocolError::MissingId)?;
    let id = RequestId::from_value(id, true).ok_or(ProtocolError::InvalidIdType {
        allowed: "string, number or null",
        found: json_type_name(id),
    })?;

    let payload = match (object.get("result"), object.get("error")) {
        (None, None) => return Err(ProtocolError::MissingResultOrError),
        (Some(_), Some(_)) => return Err(ProtocolError::BothResultAndError),
        (Some(result), None) => ResponsePayload::Result(result.clone()),
        (None, Some(error)) => ResponsePayload::Error(validate_error(error)?),
    };

    Ok(ResponseEnvelope {
        dialect: Dialect::V2_0,
        id,
        payload,
    })
}

fn validate_error(error: &Value) -> EnvelopeResult<RpcErrorObject> {
    let Value::Object(fields) = error else {
        return Err(ProtocolError::ErrorNotObject {
            found: json_type_name(error),
        });
    };

    let code = match fields.get("code") {
        None => return Err(ProtocolError::MissingErrorCode),
        Some(Value::Number(number)) => number.as_i64().ok_or(ProtocolError::InvalidErrorCode {
            found: "non-integer number",
        })?,
        Some(other) => {
            return Err(ProtocolError::InvalidErrorCode {
                found: json_type_name(other),
            });
        }
    };

    let message = match fields.get("message") {
        None => return Err(ProtocolError::MissingErrorMessage),
        Some(Value::String(message)) => message.clone(),
        Some(other) => {
            return Err(ProtocolError::InvalidErrorMessage {
                found: json_type_name(other),
            });
        }
    };

    Ok(RpcErrorObject {
        code: Some(ErrorCode::Number(code)),
        message,
        name: fields.get("name").and_then(Value::as_str).map(str::to_string),
        detail: fields.get("detail").cloned(),
        data: fields.get("data").cloned(),
    })
}
