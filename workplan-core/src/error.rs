use crate::store::PlanId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkPlanError {
    #[error("Priority conflict: every enabled step must have a different priority")]
    PriorityConflict,

    #[error("At least one step must be enabled")]
    EmptyPlan,

    #[error("Coding requires the assembly step to be enabled")]
    UnsatisfiedDependency,

    #[error("Unsupported image type '{0}': please choose an image file")]
    UnsupportedImageType(String),

    #[error("Image of {size} bytes exceeds the {limit} byte limit")]
    ImageTooLarge { size: usize, limit: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Work plan '{0}' not found")]
    PlanNotFound(PlanId),

    #[error("No work plan at row {0}")]
    RowNotFound(usize),

    #[error("No work plan is being edited")]
    NoActiveSession,

    #[error("A work plan is already being edited")]
    SessionInProgress,

    #[error("Invalid stored configuration: {0}")]
    InvalidSnapshot(String),

    #[error("Malformed data URI: {0}")]
    InvalidDataUri(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to write CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),
}

impl WorkPlanError {
    /// Advisories report rejected input without blocking anything; the state
    /// they refer to is left unchanged.
    pub fn is_advisory(&self) -> bool {
        matches!(self, WorkPlanError::InvalidInput(_))
    }

    /// Errors raised by the commit-time checks of a configuration.
    pub fn blocks_save(&self) -> bool {
        matches!(
            self,
            WorkPlanError::PriorityConflict
                | WorkPlanError::EmptyPlan
                | WorkPlanError::UnsatisfiedDependency
        )
    }
}
