//! Configuration validation

use crate::{ConfigError, Result, SourcingConfig};
use rust_decimal::Decimal;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
pub fn validate_config(config: &SourcingConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.numbering.rfq_prefix.is_empty() {
        errors.push(ValidationError::new(
            "numbering.rfq_prefix",
            "prefix cannot be empty",
        ));
    }

    if config.numbering.bid_prefix.is_empty() {
        errors.push(ValidationError::new(
            "numbering.bid_prefix",
            "prefix cannot be empty",
        ));
    }

    if config.numbering.rfq_prefix == config.numbering.bid_prefix {
        errors.push(ValidationError::new(
            "numbering.bid_prefix",
            "rfq and bid prefixes must differ",
        ));
    }

    if !(1..=9).contains(&config.numbering.pad_width) {
        errors.push(ValidationError::new(
            "numbering.pad_width",
            "must be between 1 and 9",
        ));
    }

    if config.evaluation.weight_tolerance <= Decimal::ZERO {
        errors.push(ValidationError::new(
            "evaluation.weight_tolerance",
            "must be greater than 0",
        ));
    }

    if config.evaluation.compliance_threshold < Decimal::ZERO
        || config.evaluation.compliance_threshold > Decimal::ONE_HUNDRED
    {
        errors.push(ValidationError::new(
            "evaluation.compliance_threshold",
            "must be between 0 and 100",
        ));
    }

    if config.lifecycle.default_validity_period_days <= 0 {
        errors.push(ValidationError::new(
            "lifecycle.default_validity_period_days",
            "must be greater than 0",
        ));
    }

    if config.lifecycle.default_validity_period_days > config.lifecycle.max_validity_period_days {
        errors.push(ValidationError::new(
            "lifecycle.default_validity_period_days",
            "cannot exceed max_validity_period_days",
        ));
    }

    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&SourcingConfig::default()).is_ok());
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let mut config = SourcingConfig::default();
        config.numbering.rfq_prefix.clear();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn identical_prefixes_are_rejected() {
        let mut config = SourcingConfig::default();
        config.numbering.bid_prefix = config.numbering.rfq_prefix.clone();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn bad_pad_width_is_rejected() {
        let mut config = SourcingConfig::default();
        config.numbering.pad_width = 0;
        assert!(validate_config(&config).is_err());

        config.numbering.pad_width = 10;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_tolerance_is_rejected() {
        let mut config = SourcingConfig::default();
        config.evaluation.weight_tolerance = Decimal::ZERO;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn validity_default_above_max_is_rejected() {
        let mut config = SourcingConfig::default();
        config.lifecycle.default_validity_period_days = 400;
        assert!(validate_config(&config).is_err());
    }
}
