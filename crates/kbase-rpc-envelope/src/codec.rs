use serde_json::Value;

use crate::error::{EnvelopeResult, RequestError};
use crate::request::RequestEnvelope;
use crate::response::ResponseEnvelope;
use crate::types::Dialect;
use crate::{v11, v20};

impl Dialect {
    /// Build the request envelope for `method` in this dialect
    pub fn build_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<RequestEnvelope, RequestError> {
        match self {
            Dialect::V1_1 => v11::build_request(method, params).map(RequestEnvelope::V11),
            Dialect::V2_0 => v20::build_request(method, params).map(RequestEnvelope::V20),
        }
    }

    /// Parse a raw response body against this dialect's grammar
    pub fn parse_response(&self, raw: &str) -> EnvelopeResult<ResponseEnvelope> {
        match self {
            Dialect::V1_1 => v11::parse_response(raw),
            Dialect::V2_0 => v20::parse_response(raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use serde_json::json;

    #[test]
    fn test_dialects_do_not_accept_each_other() {
        let v11_body = r#"{"version":"1.1","id":"a","result":[1]}"#;
        let v20_body = r#"{"jsonrpc":"2.0","id":"a","result":[1]}"#;

        assert!(Dialect::V1_1.parse_response(v11_body).is_ok());
        assert!(Dialect::V2_0.parse_response(v20_body).is_ok());
        assert_eq!(
            Dialect::V2_0.parse_response(v11_body),
            Err(ProtocolError::MissingDiscriminator { field: "jsonrpc" })
        );
        assert_eq!(
            Dialect::V1_1.parse_response(v20_body),
            Err(ProtocolError::MissingDiscriminator { field: "version" })
        );
    }

    #[test]
    fn test_missing_result_and_error_in_both_dialects() {
        for dialect in [Dialect::V1_1, Dialect::V2_0] {
            let body = json!({
                (dialect.discriminator_field()): dialect.version(),
                "id": "a"
            });
            assert_eq!(
                dialect.parse_response(&body.to_string()),
                Err(ProtocolError::MissingResultOrError)
            );
        }
    }

    #[test]
    fn test_both_result_and_error_in_both_dialects() {
        for dialect in [Dialect::V1_1, Dialect::V2_0] {
            let body = json!({
                (dialect.discriminator_field()): dialect.version(),
                "id": "a",
                "result": [{"x": 1}],
                "error": {"code": -32000, "message": "m"}
            });
            assert_eq!(
                dialect.parse_response(&body.to_string()),
                Err(ProtocolError::BothResultAndError)
            );
        }
    }

    #[test]
    fn test_build_request_tags_envelope() {
        let v11 = Dialect::V1_1
            .build_request("Mod.f", Some(json!({"a": 1})))
            .unwrap();
        let wire: Value = serde_json::from_str(&v11.to_json().unwrap()).unwrap();
        assert_eq!(wire["version"], "1.1");
        assert_eq!(wire["params"], json!([{"a": 1}]));

        let v20 = Dialect::V2_0
            .build_request("Mod.f", Some(json!({"a": 1})))
            .unwrap();
        let wire: Value = serde_json::from_str(&v20.to_json().unwrap()).unwrap();
        assert_eq!(wire["jsonrpc"], "2.0");
        assert_eq!(wire["params"], json!({"a": 1}));
        assert!(wire.get("version").is_none());
    }
}
