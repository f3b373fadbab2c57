use thiserror::Error;

#[derive(Debug, Error)]
pub enum HomeLedgerError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Scenario '{name}' did not complete")]
    ScenarioAborted { name: String },
}

impl HomeLedgerError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        HomeLedgerError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
