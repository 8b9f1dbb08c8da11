//! Sandbox hosting seam
//!
//! Owns the per-invocation flow: screen the text, assemble the guest
//! scope from the allowlist, hand both to the embedded interpreter, and
//! capture the outcome. The interpreter itself is an external
//! collaborator behind [`GuestInterpreter`]; this module guarantees the
//! obligations around it: the screener runs before any evaluation,
//! denylisted names are absent from scope, and every invocation yields
//! exactly one [`ExecutionOutcome`].

pub mod scope;

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::limits::EngineConfig;
use crate::config::types::{EngineError, ExecutionOutcome, Result};
use crate::observability::audit::{events, CorrelationIds};
use crate::screen::{Screener, SecurityVerdict};
use self::scope::GuestScope;

/// The embedded interpreter the service links in.
///
/// Implementations evaluate the guest body against the prepared scope
/// and either return the guest's result value or an engine-classified
/// error. Anything that escapes (panic included) is attributed to the
/// host, not the guest.
pub trait GuestInterpreter {
    fn evaluate(&mut self, source: &str, scope: &GuestScope) -> Result<serde_json::Value>;
}

/// One interpreter instance per invocation; no state crosses runs.
pub struct SandboxHost<I: GuestInterpreter> {
    interpreter: I,
    config: EngineConfig,
    screener: Screener,
}

impl<I: GuestInterpreter> SandboxHost<I> {
    pub fn new(interpreter: I, config: EngineConfig) -> Self {
        SandboxHost {
            interpreter,
            config,
            screener: Screener::new(),
        }
    }

    /// Run one submitted program against one input value.
    pub fn run(&mut self, source: &str, input: serde_json::Value) -> ExecutionOutcome {
        let correlation = CorrelationIds::new();

        if source.len() > self.config.max_source_len {
            let err = EngineError::out_of_range(format!(
                "Source length {} exceeds the {} byte limit",
                source.len(),
                self.config.max_source_len
            ));
            return ExecutionOutcome::from_engine_error(&err);
        }

        if self.config.screener_enabled {
            if self.config.audit_verbose {
                events::scan_start(&correlation, source.len());
            }
            if let SecurityVerdict::Rejected(violation) = self.screener.scan(source) {
                events::screener_rejection(&correlation, &violation);
                return ExecutionOutcome::from_engine_error(&EngineError::Security(violation));
            }
        }

        let guest_scope = GuestScope::allowlisted().with_input(input);
        if self.config.audit_verbose {
            events::execution_start(&correlation);
        }

        let evaluated = catch_unwind(AssertUnwindSafe(|| {
            self.interpreter.evaluate(source, &guest_scope)
        }));

        let outcome = match evaluated {
            Ok(Ok(value)) => ExecutionOutcome::success(value),
            Ok(Err(err)) => {
                if let EngineError::HostFault(message) = &err {
                    events::host_fault(&correlation, message);
                }
                ExecutionOutcome::from_engine_error(&err)
            }
            Err(panic) => {
                let message = panic_message(&panic);
                events::host_fault(&correlation, &message);
                ExecutionOutcome::HostFault {
                    kind: "InternalError".to_string(),
                    message,
                }
            }
        };

        if self.config.audit_verbose {
            events::execution_end(&correlation, outcome_label(&outcome));
        }
        outcome
    }
}

fn outcome_label(outcome: &ExecutionOutcome) -> &'static str {
    match outcome {
        ExecutionOutcome::Success { .. } => "success",
        ExecutionOutcome::GuestError { .. } => "guest_error",
        ExecutionOutcome::HostFault { .. } => "host_fault",
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("interpreter panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("interpreter panicked: {}", s)
    } else {
        "interpreter panicked".to_string()
    }
}
