//! Core configuration structures for the RFQ sourcing engine

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourcingConfig {
    /// Document numbering
    #[serde(default)]
    pub numbering: NumberingConfig,

    /// Evaluation constants
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    /// Lifecycle windows
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

/// Document numbering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumberingConfig {
    /// Prefix for RFQ numbers, year and sequence appended
    #[serde(default = "default_rfq_prefix")]
    pub rfq_prefix: String,

    /// Prefix for bid numbers, year and sequence appended
    #[serde(default = "default_bid_prefix")]
    pub bid_prefix: String,

    /// Zero-padding width of the sequence part
    #[serde(default = "default_pad_width")]
    pub pad_width: usize,
}

/// Evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Tolerance on the criteria weight sum, in percentage points
    #[serde(default = "default_weight_tolerance")]
    pub weight_tolerance: Decimal,

    /// Minimum compliance rate for a bid to count as compliant
    #[serde(default = "default_compliance_threshold")]
    pub compliance_threshold: Decimal,
}

/// Lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Validity period applied when none is given, in days
    #[serde(default = "default_validity_period_days")]
    pub default_validity_period_days: i64,

    /// Upper bound on validity periods, in days
    #[serde(default = "default_max_validity_period_days")]
    pub max_validity_period_days: i64,
}

// Default value functions
fn default_rfq_prefix() -> String {
    "RFQ-".to_string()
}

fn default_bid_prefix() -> String {
    "BID-".to_string()
}

fn default_pad_width() -> usize {
    4
}

fn default_weight_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

fn default_compliance_threshold() -> Decimal {
    Decimal::from(80)
}

fn default_validity_period_days() -> i64 {
    30
}

fn default_max_validity_period_days() -> i64 {
    365
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            rfq_prefix: default_rfq_prefix(),
            bid_prefix: default_bid_prefix(),
            pad_width: default_pad_width(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            weight_tolerance: default_weight_tolerance(),
            compliance_threshold: default_compliance_threshold(),
        }
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            default_validity_period_days: default_validity_period_days(),
            max_validity_period_days: default_max_validity_period_days(),
        }
    }
}
