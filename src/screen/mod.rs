//! Static security screening
//!
//! Inspects submitted text before execution and rejects
//! sandbox-escaping constructs with a distinguishable error class. The
//! screener is one of two layers: the sandbox host independently strips
//! the same capability names from the injected scope, so a static miss
//! cannot be parlayed into a live capability. Both layers consult
//! [`DENYLIST`].

pub mod scanner;

use serde::{Deserialize, Serialize};

use crate::config::types::{EngineError, Result, Violation, ViolationKind};

/// Capability names denied to guest programs, with the class of escape
/// each one enables. Single source of truth for the screener and for
/// scope stripping.
pub const DENYLIST: &[(&str, ViolationKind)] = &[
    ("Reflect", ViolationKind::ReflectiveConstruction),
    ("Proxy", ViolationKind::DynamicProxy),
];

/// Look up a name on the denylist.
pub fn denied_capability(name: &str) -> Option<ViolationKind> {
    DENYLIST
        .iter()
        .find(|(denied, _)| *denied == name)
        .map(|&(_, kind)| kind)
}

/// Verdict for one submitted text; produced once, consumed immediately.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SecurityVerdict {
    Allowed,
    Rejected(Violation),
}

impl SecurityVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SecurityVerdict::Allowed)
    }

    pub fn violation(&self) -> Option<&Violation> {
        match self {
            SecurityVerdict::Allowed => None,
            SecurityVerdict::Rejected(v) => Some(v),
        }
    }
}

/// Static screener over raw submitted text.
///
/// Literal-aware: a denylisted name inside a string, template body, or
/// comment is prose, not capability use, and must not reject an
/// otherwise safe program.
#[derive(Clone, Copy, Debug, Default)]
pub struct Screener;

impl Screener {
    pub fn new() -> Self {
        Screener
    }

    /// Scan submitted text. The first denylisted identifier reference
    /// rejects the whole submission.
    pub fn scan(&self, source: &str) -> SecurityVerdict {
        for ident in scanner::identifiers(source) {
            // Property access resolves against the object, not the
            // global; scope stripping covers that path.
            if ident.member_access {
                continue;
            }
            if let Some(kind) = denied_capability(ident.name) {
                return SecurityVerdict::Rejected(Violation {
                    kind,
                    capability: ident.name.to_string(),
                    matched_text: ident.name.to_string(),
                    position: ident.position,
                });
            }
        }
        SecurityVerdict::Allowed
    }

    /// Scan and convert a rejection into the engine error taxonomy.
    pub fn check(&self, source: &str) -> Result<()> {
        match self.scan(source) {
            SecurityVerdict::Allowed => Ok(()),
            SecurityVerdict::Rejected(violation) => Err(EngineError::Security(violation)),
        }
    }
}
