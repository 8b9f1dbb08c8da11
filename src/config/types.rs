/// Core types shared across the snipbox engine
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable machine-readable codes carried by range errors.
///
/// The wire `type` of a range error stays `RangeError`; the code rides
/// alongside it so collaborators can branch without parsing messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeCode {
    /// Offset, length, or value outside its domain
    OutOfRange,
    /// Encoding conversion hit an unrepresentable unit
    TranscodeFailed,
}

impl RangeCode {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeCode::OutOfRange => "ERR_OUT_OF_RANGE",
            RangeCode::TranscodeFailed => "ERR_TRANSCODE_FAILED",
        }
    }
}

/// Capability classes the screener rejects
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Reflective object construction or invocation
    ReflectiveConstruction,
    /// Dynamic proxying of built-ins
    DynamicProxy,
}

/// A single screener finding: which capability, where, and what matched
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// Denylisted capability name as submitted
    pub capability: String,
    /// Exact source text that triggered the rejection
    pub matched_text: String,
    /// Byte offset of the match within the submitted text
    pub position: usize,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "use of denied capability '{}' at offset {}",
            self.capability, self.position
        )
    }
}

/// Engine error taxonomy
///
/// Everything the codecs, BufferCore, or the screener can raise. The
/// sandbox host converts these into guest-attributable wire errors;
/// only `HostFault` is ever reported as an internal failure.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Type(String),

    #[error("[{}] {message}", .code.as_str())]
    Range { code: RangeCode, message: String },

    #[error("{0}")]
    Security(Violation),

    #[error("host fault: {0}")]
    HostFault(String),
}

impl EngineError {
    pub fn type_error(message: impl Into<String>) -> Self {
        EngineError::Type(message.into())
    }

    pub fn out_of_range(message: impl Into<String>) -> Self {
        EngineError::Range {
            code: RangeCode::OutOfRange,
            message: message.into(),
        }
    }

    pub fn transcode_failed(message: impl Into<String>) -> Self {
        EngineError::Range {
            code: RangeCode::TranscodeFailed,
            message: message.into(),
        }
    }

    pub fn host_fault(message: impl Into<String>) -> Self {
        EngineError::HostFault(message.into())
    }

    /// Wire-visible error class name
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Type(_) => "TypeError",
            EngineError::Range { .. } => "RangeError",
            EngineError::Security(_) => "SecurityError",
            EngineError::HostFault(_) => "InternalError",
        }
    }

    /// Stable code, when the class carries one
    pub fn code(&self) -> Option<&'static str> {
        match self {
            EngineError::Range { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    /// Message as shown to the submitter
    pub fn guest_message(&self) -> String {
        match self {
            EngineError::Type(m) => m.clone(),
            EngineError::Range { message, .. } => message.clone(),
            EngineError::Security(v) => v.to_string(),
            EngineError::HostFault(m) => m.clone(),
        }
    }
}

/// Captured outcome of one sandbox invocation
///
/// Produced exactly once per invocation and consumed exactly once by the
/// result codec. Guest-attributable failures (including screener
/// rejections) are `GuestError`; resource/internal failures that cannot
/// be blamed on guest logic are `HostFault`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    Success {
        value: serde_json::Value,
    },
    GuestError {
        kind: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        message: String,
    },
    HostFault {
        kind: String,
        message: String,
    },
}

impl ExecutionOutcome {
    pub fn success(value: serde_json::Value) -> Self {
        ExecutionOutcome::Success { value }
    }

    /// Classify an engine error into the outcome it produces
    pub fn from_engine_error(err: &EngineError) -> Self {
        match err {
            EngineError::HostFault(message) => ExecutionOutcome::HostFault {
                kind: "InternalError".to_string(),
                message: message.clone(),
            },
            other => ExecutionOutcome::GuestError {
                kind: other.kind().to_string(),
                code: other.code().map(str::to_string),
                message: other.guest_message(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success { .. })
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_error_carries_stable_code() {
        let err = EngineError::out_of_range("\"offset\" is out of range");
        assert_eq!(err.kind(), "RangeError");
        assert_eq!(err.code(), Some("ERR_OUT_OF_RANGE"));
    }

    #[test]
    fn host_fault_never_classified_as_guest_error() {
        let outcome = ExecutionOutcome::from_engine_error(&EngineError::host_fault("oom"));
        assert!(matches!(outcome, ExecutionOutcome::HostFault { .. }));
    }

    #[test]
    fn security_error_names_capability() {
        let violation = Violation {
            kind: ViolationKind::DynamicProxy,
            capability: "Proxy".to_string(),
            matched_text: "new Proxy".to_string(),
            position: 12,
        };
        let err = EngineError::Security(violation);
        assert_eq!(err.kind(), "SecurityError");
        assert!(err.guest_message().contains("Proxy"));
    }
}
