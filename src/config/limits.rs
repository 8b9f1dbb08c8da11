/// Engine limits and configuration
use serde::{Deserialize, Serialize};

/// Hard maximum byte length of any single buffer or arena.
///
/// Allocations at or beyond this constant are rejected with a range
/// error before any memory is reserved.
pub const MAX_LENGTH: usize = 0xFFFF_FFFF;

/// Per-invocation engine configuration
///
/// Invocation-scoped; nothing here is shared mutably across invocations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum accepted source text length in bytes
    pub max_source_len: usize,
    /// Maximum single buffer allocation in bytes (<= MAX_LENGTH)
    pub max_alloc_len: usize,
    /// Reject submissions instead of executing when the screener matches
    pub screener_enabled: bool,
    /// Emit audit events for every invocation, not just rejections
    pub audit_verbose: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_source_len: 256 * 1024,        // 256 KiB of source
            max_alloc_len: 64 * 1024 * 1024,   // 64 MiB per buffer
            screener_enabled: true,
            audit_verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_fit_under_hard_maximum() {
        let config = EngineConfig::default();
        assert!(config.max_alloc_len <= MAX_LENGTH);
        assert!(config.max_source_len > 0);
    }
}
