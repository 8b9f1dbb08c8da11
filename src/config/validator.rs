/// Config-to-enforcement validation
///
/// Checks an [`EngineConfig`] for values the engine cannot enforce and
/// for combinations that silently weaken the sandbox contract.
use crate::config::limits::{EngineConfig, MAX_LENGTH};
use crate::config::types::{EngineError, Result};

/// Validation result with detailed errors and advisory warnings
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate an engine configuration and report every finding.
pub fn validate_config(config: &EngineConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.max_alloc_len == 0 {
        result
            .errors
            .push("max_alloc_len cannot be zero".to_string());
    }
    if config.max_alloc_len > MAX_LENGTH {
        result.errors.push(format!(
            "max_alloc_len {} exceeds hard maximum {}",
            config.max_alloc_len, MAX_LENGTH
        ));
    }
    if config.max_source_len == 0 {
        result
            .errors
            .push("max_source_len cannot be zero".to_string());
    }

    if !config.screener_enabled {
        result.warnings.push(
            "screener disabled: scope stripping is the only remaining capability barrier"
                .to_string(),
        );
    }
    if config.max_alloc_len > 512 * 1024 * 1024 {
        result.warnings.push(format!(
            "max_alloc_len {} is unusually large for a multi-tenant deployment",
            config.max_alloc_len
        ));
    }

    result
}

/// Fail-fast validation for startup paths.
pub fn validate_strict(config: &EngineConfig) -> Result<()> {
    let result = validate_config(config);
    if result.is_valid() {
        Ok(())
    } else {
        Err(EngineError::type_error(result.errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_default_config() {
        let config = EngineConfig::default();
        let result = validate_config(&config);
        assert!(result.is_valid());
    }

    #[test]
    fn test_zero_alloc_limit() {
        let mut config = EngineConfig::default();
        config.max_alloc_len = 0;

        let result = validate_config(&config);
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("max_alloc_len cannot be zero")));
        assert!(validate_strict(&config).is_err());
    }

    #[test]
    fn test_alloc_limit_over_hard_maximum() {
        let mut config = EngineConfig::default();
        config.max_alloc_len = MAX_LENGTH + 1;

        let result = validate_config(&config);
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("exceeds hard maximum")));
    }

    #[test]
    fn test_disabled_screener_warns() {
        let mut config = EngineConfig::default();
        config.screener_enabled = false;

        let result = validate_config(&config);
        assert!(result.is_valid());
        assert!(!result.warnings.is_empty());
    }
}
