use rust_decimal::Decimal;
use rfq_sourcing_types::EvaluationCriteria;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CriteriaError {
    #[error("evaluation criteria weights sum to {total}, expected 100")]
    WeightSumMismatch { total: Decimal },

    #[error("weight {weight} for {field} is outside 0-100")]
    WeightOutOfRange { field: String, weight: Decimal },

    #[error("specific criterion name cannot be empty")]
    EmptyCriterionName,

    #[error("duplicate specific criterion: {criterion}")]
    DuplicateCriterion { criterion: String },
}

/// Gate every RFQ save: the four standardized weights plus all specific
/// criterion weights must sum to 100 within `tolerance` percentage points
/// (0.01 under the default configuration), each weight must lie in 0-100,
/// and specific criterion names must be non-empty and unique.
pub fn validate_criteria_weights(
    criteria: &EvaluationCriteria,
    tolerance: Decimal,
) -> Result<(), CriteriaError> {
    let dimensions = [
        ("technical_weight", criteria.technical_weight),
        ("financial_weight", criteria.financial_weight),
        ("delivery_weight", criteria.delivery_weight),
        ("quality_weight", criteria.quality_weight),
    ];

    let mut total = Decimal::ZERO;
    for (field, weight) in dimensions {
        check_weight_range(field, weight)?;
        total += weight;
    }

    let mut seen = HashSet::new();
    for specific in &criteria.specific_criteria {
        if specific.criterion.trim().is_empty() {
            return Err(CriteriaError::EmptyCriterionName);
        }
        if !seen.insert(specific.criterion.as_str()) {
            return Err(CriteriaError::DuplicateCriterion {
                criterion: specific.criterion.clone(),
            });
        }
        check_weight_range(&specific.criterion, specific.weight)?;
        total += specific.weight;
    }

    if (total - Decimal::ONE_HUNDRED).abs() > tolerance {
        return Err(CriteriaError::WeightSumMismatch { total });
    }

    Ok(())
}

fn check_weight_range(field: &str, weight: Decimal) -> Result<(), CriteriaError> {
    if weight < Decimal::ZERO || weight > Decimal::ONE_HUNDRED {
        return Err(CriteriaError::WeightOutOfRange {
            field: field.to_string(),
            weight,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfq_sourcing_types::SpecificCriterion;
    use std::str::FromStr;

    fn tolerance() -> Decimal {
        Decimal::new(1, 2)
    }

    fn criteria(technical: i64, financial: i64, delivery: i64, quality: i64) -> EvaluationCriteria {
        EvaluationCriteria {
            technical_weight: Decimal::from(technical),
            financial_weight: Decimal::from(financial),
            delivery_weight: Decimal::from(delivery),
            quality_weight: Decimal::from(quality),
            specific_criteria: Vec::new(),
        }
    }

    #[test]
    fn default_criteria_pass() {
        assert!(validate_criteria_weights(&EvaluationCriteria::default(), tolerance()).is_ok());
    }

    #[test]
    fn sum_below_hundred_fails() {
        let result = validate_criteria_weights(&criteria(30, 30, 20, 10), tolerance());
        assert!(matches!(
            result,
            Err(CriteriaError::WeightSumMismatch { total }) if total == Decimal::from(90)
        ));
    }

    #[test]
    fn specific_criteria_count_toward_sum() {
        let mut c = criteria(30, 30, 20, 10);
        c.specific_criteria.push(SpecificCriterion {
            criterion: "warranty".to_string(),
            weight: Decimal::from(10),
        });
        assert!(validate_criteria_weights(&c, tolerance()).is_ok());
    }

    #[test]
    fn sum_within_tolerance_passes() {
        let mut c = criteria(30, 30, 20, 20);
        c.quality_weight = Decimal::from_str("19.995").unwrap();
        assert!(validate_criteria_weights(&c, tolerance()).is_ok());

        c.quality_weight = Decimal::from_str("19.98").unwrap();
        assert!(matches!(
            validate_criteria_weights(&c, tolerance()),
            Err(CriteriaError::WeightSumMismatch { .. })
        ));
    }

    #[test]
    fn wider_tolerance_admits_larger_drift() {
        let mut c = criteria(30, 30, 20, 20);
        c.quality_weight = Decimal::from_str("19.6").unwrap();
        assert!(validate_criteria_weights(&c, tolerance()).is_err());
        // 0.5 percentage points of slack
        assert!(validate_criteria_weights(&c, Decimal::new(5, 1)).is_ok());
    }

    #[test]
    fn negative_weight_fails() {
        let mut c = criteria(30, 30, 20, 20);
        c.technical_weight = Decimal::from(-30);
        assert!(matches!(
            validate_criteria_weights(&c, tolerance()),
            Err(CriteriaError::WeightOutOfRange { .. })
        ));
    }

    #[test]
    fn empty_criterion_name_fails() {
        let mut c = criteria(30, 30, 20, 10);
        c.specific_criteria.push(SpecificCriterion {
            criterion: "  ".to_string(),
            weight: Decimal::from(10),
        });
        assert!(matches!(
            validate_criteria_weights(&c, tolerance()),
            Err(CriteriaError::EmptyCriterionName)
        ));
    }

    #[test]
    fn duplicate_criterion_fails() {
        let mut c = criteria(30, 30, 20, 0);
        for _ in 0..2 {
            c.specific_criteria.push(SpecificCriterion {
                criterion: "warranty".to_string(),
                weight: Decimal::from(10),
            });
        }
        assert!(matches!(
            validate_criteria_weights(&c, tolerance()),
            Err(CriteriaError::DuplicateCriterion { .. })
        ));
    }
}
