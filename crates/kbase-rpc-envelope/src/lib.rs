//! # JSON-RPC Envelope Codecs
//!
//! Pure, transport-agnostic builders and validators for the two JSON-RPC
//! dialects spoken by KBase services:
//!
//! - **1.1**: `{"version": "1.1", "method", "id", "params": [{...}]}`, results
//!   wrapped in an array
//! - **2.0**: `{"jsonrpc": "2.0", "method", "id", "params"?}`
//!
//! The two grammars are validated independently. Response validation is
//! ordered and reports the first violated rule as a distinct
//! [`ProtocolError`] variant.
//!
//! ```rust
//! use kbase_rpc_envelope::{Dialect, ResponsePayload};
//! use serde_json::json;
//!
//! let request = Dialect::V2_0.build_request("Echo.say", Some(json!({"text": "hi"}))).unwrap();
//! assert_eq!(request.method(), "Echo.say");
//!
//! let response = Dialect::V2_0
//!     .parse_response(r#"{"jsonrpc":"2.0","id":"1","result":"hi"}"#)
//!     .unwrap();
//! assert_eq!(response.payload, ResponsePayload::Result(json!("hi")));
//! ```

pub mod codec;
pub mod error;
pub mod prelude;
pub mod request;
pub mod response;
pub mod types;
pub mod v11;
pub mod v20;

use serde_json::{Map, Value};

// Re-export main types
pub use error::{EnvelopeResult, ProtocolError, RequestError};
pub use request::{JsonRpc11Request, JsonRpc20Request, RequestEnvelope};
pub use response::{ErrorCode, ResponseEnvelope, ResponsePayload, RpcErrorObject};
pub use types::{Dialect, RequestId};

/// Discriminator value of the 1.1 dialect
pub const JSONRPC_11_VERSION: &str = "1.1";

/// Discriminator value of the 2.0 dialect
pub const JSONRPC_20_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}

/// Checks shared by both grammars: the body is JSON and it is an object
pub(crate) fn parse_object(raw: &str) -> EnvelopeResult<Map<String, Value>> {
    let value: Value = serde_json::from_str(raw).map_err(|e| ProtocolError::Parse {
        message: e.to_string(),
        body: raw.to_string(),
    })?;

    match value {
        Value::Object(object) => Ok(object),
        other => Err(ProtocolError::NotAnObject {
            found: error::json_type_name(&other),
        }),
    }
}
