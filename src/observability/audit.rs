/// Audit event framework for the snipbox engine
///
/// Structured logging of security-relevant events for compliance and
/// incident response: screener rejections, invocation lifecycle, and
/// host faults, each correlated by request/run identifiers.
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

use crate::config::types::Violation;

/// Audit event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditSeverity {
    Critical,
    High,
    Medium,
    Low,
}

/// Types of events we track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEventType {
    // Lifecycle events
    ExecutionStart,
    ExecutionEnd,

    // Screener events
    ScanStart,
    ScreenerRejection,

    // Failure events
    HostFault,
}

impl AuditEventType {
    /// Default severity for this event type
    pub fn default_severity(self) -> AuditSeverity {
        match self {
            AuditEventType::ExecutionStart => AuditSeverity::Low,
            AuditEventType::ExecutionEnd => AuditSeverity::Low,
            AuditEventType::ScanStart => AuditSeverity::Low,
            AuditEventType::ScreenerRejection => AuditSeverity::High,
            AuditEventType::HostFault => AuditSeverity::Critical,
        }
    }
}

/// Correlation identifiers for event tracking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationIds {
    /// Unique request identifier
    pub request_id: String,
    /// Unique identifier for this execution attempt
    pub run_id: String,
}

impl CorrelationIds {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            run_id: Uuid::new_v4().to_string(),
        }
    }
}

impl Default for CorrelationIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Individual audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: AuditEventType,
    pub severity: AuditSeverity,
    pub timestamp: SystemTime,
    pub correlation: CorrelationIds,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<Violation>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, correlation: CorrelationIds, details: String) -> Self {
        Self {
            event_type,
            severity: event_type.default_severity(),
            timestamp: SystemTime::now(),
            correlation,
            details,
            violation: None,
        }
    }

    pub fn with_violation(mut self, violation: Violation) -> Self {
        self.violation = Some(violation);
        self
    }

    /// Emit as one structured JSON line through the log facade.
    pub fn emit(&self) {
        let line = serde_json::to_string(self)
            .unwrap_or_else(|e| format!("{{\"audit_serialize_error\":\"{}\"}}", e));
        match self.severity {
            AuditSeverity::Critical | AuditSeverity::High => warn!(target: "snipbox::audit", "{}", line),
            AuditSeverity::Medium | AuditSeverity::Low => info!(target: "snipbox::audit", "{}", line),
        }
    }
}

/// Convenience constructors for the events the host emits
pub mod events {
    use super::*;

    pub fn scan_start(correlation: &CorrelationIds, source_len: usize) {
        AuditEvent::new(
            AuditEventType::ScanStart,
            correlation.clone(),
            format!("screening {} bytes of source", source_len),
        )
        .emit();
    }

    pub fn screener_rejection(correlation: &CorrelationIds, violation: &Violation) {
        AuditEvent::new(
            AuditEventType::ScreenerRejection,
            correlation.clone(),
            violation.to_string(),
        )
        .with_violation(violation.clone())
        .emit();
    }

    pub fn execution_start(correlation: &CorrelationIds) {
        AuditEvent::new(
            AuditEventType::ExecutionStart,
            correlation.clone(),
            "guest evaluation started".to_string(),
        )
        .emit();
    }

    pub fn execution_end(correlation: &CorrelationIds, outcome_kind: &str) {
        AuditEvent::new(
            AuditEventType::ExecutionEnd,
            correlation.clone(),
            format!("guest evaluation finished: {}", outcome_kind),
        )
        .emit();
    }

    pub fn host_fault(correlation: &CorrelationIds, message: &str) {
        AuditEvent::new(
            AuditEventType::HostFault,
            correlation.clone(),
            message.to_string(),
        )
        .emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::ViolationKind;

    #[test]
    fn correlation_ids_are_unique_per_run() {
        let a = CorrelationIds::new();
        let b = CorrelationIds::new();
        assert_ne!(a.request_id, b.request_id);
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn severity_defaults_follow_event_type() {
        assert_eq!(
            AuditEventType::ScreenerRejection.default_severity(),
            AuditSeverity::High
        );
        assert_eq!(
            AuditEventType::HostFault.default_severity(),
            AuditSeverity::Critical
        );
    }

    #[test]
    fn events_serialize_as_json() {
        let event = AuditEvent::new(
            AuditEventType::ScreenerRejection,
            CorrelationIds::new(),
            "detail".to_string(),
        )
        .with_violation(Violation {
            kind: ViolationKind::DynamicProxy,
            capability: "Proxy".to_string(),
            matched_text: "Proxy".to_string(),
            position: 4,
        });
        let line = serde_json::to_string(&event).unwrap();
        assert!(line.contains("ScreenerRejection"));
        assert!(line.contains("Proxy"));
    }
}
