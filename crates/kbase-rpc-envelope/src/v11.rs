//! JSON-RPC 1.1 envelope grammar.
//!
//! Requests carry `"version": "1.1"` and an array of objects as params.
//! Responses carry `result` (an array) or `error`; a member holding `null`
//! counts as absent, since 1.1 servers emit `"error": null` next to results.

use serde_json::{Map, Value};

use crate::error::{EnvelopeResult, ProtocolError, RequestError, json_type_name};
use crate::request::JsonRpc11Request;
use crate::response::{ErrorCode, ResponseEnvelope, ResponsePayload, RpcErrorObject};
use crate::types::{Dialect, RequestId};
use crate::{JSONRPC_11_VERSION, parse_object};

/// Build a 1.1 request, coercing params to a sequence of objects.
///
/// A lone object is wrapped in a one-element sequence and absent params
/// become an empty sequence.
pub fn build_request(method: &str, params: Option<Value>) -> Result<JsonRpc11Request, RequestError> {
    if method.is_empty() {
        return Err(RequestError::EmptyMethod);
    }

    let params = match params {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(object)) => vec![object],
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(object) => Ok(object),
                other => Err(RequestError::ParamNotObject {
                    index,
                    found: json_type_name(&other),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(RequestError::InvalidParams {
                found: json_type_name(&other),
            });
        }
    };

    Ok(JsonRpc11Request {
        version: JSONRPC_11_VERSION.to_string(),
        method: method.to_string(),
        id: RequestId::generate().to_string(),
        params,
    })
}

fn member<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

/// Parse and validate a 1.1 response body
pub fn parse_response(raw: &str) -> EnvelopeResult<ResponseEnvelope> {
    let object = parse_object(raw)?;

    match object.get("version") {
        None => {
            return Err(ProtocolError::MissingDiscriminator { field: "version" });
        }
        Some(Value::String(version)) if version == JSONRPC_11_VERSION => {}
        Some(other) => {
            return Err(ProtocolError::WrongDiscriminator {
                field: "version",
                expected: JSONRPC_11_VERSION,
                found: other.to_string(),
            });
        }
    }

    let id = object.get("id").ok_or(ProtocolError::MissingId)?;
    let id = RequestId::from_value(id, false).ok_or(ProtocolError::InvalidIdType {
        allowed: "string or number",
        found: json_type_name(id),
    })?;

    let payload = match (member(&object, "result"), member(&object, "error")) {
        (None, None) => return Err(ProtocolError::MissingResultOrError),
        (Some(_), Some(_)) => return Err(ProtocolError::BothResultAndError),
        (Some(result), None) => ResponsePayload::Result(result.clone()),
        (None, Some(error)) => ResponsePayload::Error(read_error(error)),
    };

    Ok(ResponseEnvelope {
        dialect: Dialect::V1_1,
        id,
        payload,
    })
}

// The 1.1 error member is not validated; read what is there.
fn read_error(error: &Value) -> RpcErrorObject {
    let Value::Object(fields) = error else {
        let message = match error {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        return RpcErrorObject {
            code: None,
            message,
            name: None,
            detail: None,
            data: None,
        };
    };

    let code = match fields.get("code") {
        Some(Value::Number(number)) => Some(
            number
                .as_i64()
                .map(ErrorCode::Number)
                .unwrap_or_else(|| ErrorCode::Text(number.to_string())),
        ),
        Some(Value::String(text)) => Some(ErrorCode::Text(text.clone())),
        _ => None,
    };
    let name = fields.get("name").and_then(Value::as_str).map(str::to_string);
    let message = fields
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| name.clone())
        .unwrap_or_else(|| error.to_string());
    // KBase servers put the server-side traceback under "error"
    let data = member(fields, "data").or_else(|| member(fields, "error")).cloned();

    RpcErrorObject {
        code,
        message,
        name,
        detail: member(fields, "detail").cloned(),
        data,
    }
}
