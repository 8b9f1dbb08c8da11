//! Wire contract
//!
//! The externally observed request/response JSON shapes and the codec
//! that maps a captured [`ExecutionOutcome`] onto them. The response
//! always carries exactly one of `result`/`error`; partial results are
//! never emitted, and encoding itself never fails: an internal
//! encoding problem degrades to the host-fault error shape.

use base64::engine::general_purpose::STANDARD;
use base64::engine::Engine;
use serde::{Deserialize, Serialize};

use crate::config::types::{EngineError, ExecutionOutcome, Result};

/// A code-execution request as decoded by the network entry point.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireRequest {
    #[serde(rename = "codeBase64")]
    pub code_base64: String,
    pub input: serde_json::Value,
}

impl WireRequest {
    /// Recover the submitted source text. Request decoding is strict:
    /// this is the service boundary, not guest data, so malformed
    /// base64 is an invalid request rather than a lossy value.
    pub fn decode_source(&self) -> Result<String> {
        let bytes = STANDARD
            .decode(self.code_base64.trim())
            .map_err(|e| EngineError::type_error(format!("codeBase64 is not valid base64: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|_| EngineError::type_error("codeBase64 does not decode to UTF-8 text"))
    }
}

/// Error half of the wire response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// The response is exactly one of `{result}` or `{error}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireResponse {
    Result { result: serde_json::Value },
    Error { error: WireError },
}

/// Maps captured outcomes to the wire contract.
pub struct ResultCodec;

impl ResultCodec {
    /// Encode an outcome. Never fails.
    pub fn encode(outcome: &ExecutionOutcome) -> WireResponse {
        match outcome {
            ExecutionOutcome::Success { value } => WireResponse::Result {
                result: value.clone(),
            },
            ExecutionOutcome::GuestError {
                kind,
                code,
                message,
            } => WireResponse::Error {
                error: WireError {
                    error_type: kind.clone(),
                    message: message.clone(),
                    code: code.clone(),
                },
            },
            ExecutionOutcome::HostFault { kind, message } => WireResponse::Error {
                error: WireError {
                    error_type: kind.clone(),
                    message: message.clone(),
                    code: None,
                },
            },
        }
    }

    /// Encode straight to a JSON value. An internal serialization
    /// failure degrades to the host-fault shape instead of escaping.
    pub fn encode_json(outcome: &ExecutionOutcome) -> serde_json::Value {
        match serde_json::to_value(Self::encode(outcome)) {
            Ok(value) => value,
            Err(err) => serde_json::json!({
                "error": {
                    "type": "InternalError",
                    "message": format!("response encoding failed: {}", err),
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_maps_to_result() {
        let outcome = ExecutionOutcome::success(json!({"sum": 42}));
        let encoded = ResultCodec::encode_json(&outcome);
        assert_eq!(encoded, json!({"result": {"sum": 42}}));
    }

    #[test]
    fn guest_error_maps_to_typed_error() {
        let err = EngineError::out_of_range("\"offset\" is out of range");
        let outcome = ExecutionOutcome::from_engine_error(&err);
        let encoded = ResultCodec::encode_json(&outcome);
        assert_eq!(encoded["error"]["type"], "RangeError");
        assert_eq!(encoded["error"]["code"], "ERR_OUT_OF_RANGE");
        assert!(encoded.get("result").is_none());
    }

    #[test]
    fn host_fault_uses_generic_type() {
        let outcome = ExecutionOutcome::from_engine_error(&EngineError::host_fault("timeout"));
        let encoded = ResultCodec::encode_json(&outcome);
        assert_eq!(encoded["error"]["type"], "InternalError");
        assert!(encoded["error"].get("code").is_none());
    }

    #[test]
    fn response_round_trips_through_serde() {
        let response = WireResponse::Error {
            error: WireError {
                error_type: "SecurityError".to_string(),
                message: "use of denied capability 'Proxy' at offset 4".to_string(),
                code: None,
            },
        };
        let text = serde_json::to_string(&response).unwrap();
        let back: WireResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(back, response);
    }

    #[test]
    fn request_source_decoding() {
        let request = WireRequest {
            code_base64: STANDARD.encode("const x = 1"),
            input: json!({}),
        };
        assert_eq!(request.decode_source().unwrap(), "const x = 1");

        let bad = WireRequest {
            code_base64: "!!!not base64!!!".to_string(),
            input: json!({}),
        };
        assert_eq!(bad.decode_source().unwrap_err().kind(), "TypeError");
    }
}
