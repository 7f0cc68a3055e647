use rfq_sourcing_award::AwardError;
use rfq_sourcing_evaluation::EvaluationError;
use rfq_sourcing_lifecycle::{ReferentialError, StateTransitionError, ValidationError};
use rfq_sourcing_store::StoreError;
use thiserror::Error;

/// Everything a service operation can fail with
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    StateTransition(#[from] StateTransitionError),

    #[error(transparent)]
    Referential(#[from] ReferentialError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Award(AwardError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("concurrent update on {entity} {id}, reload and retry")]
    Conflict { entity: &'static str, id: String },

    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            StoreError::VersionConflict { entity, id, .. } => EngineError::Conflict { entity, id },
            other => EngineError::Store(other),
        }
    }
}

impl From<AwardError> for EngineError {
    fn from(e: AwardError) -> Self {
        match e {
            AwardError::StateTransition(e) => EngineError::StateTransition(e),
            AwardError::Referential(e) => EngineError::Referential(e),
            other => EngineError::Award(other),
        }
    }
}
