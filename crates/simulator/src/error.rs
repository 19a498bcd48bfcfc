use analytics::AnalyticsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter '{0}': {1}")]
    InvalidParameter(String, String),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl SimulationError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        SimulationError::InvalidParameter(name.to_string(), reason.into())
    }
}
