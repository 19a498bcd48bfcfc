use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: {0}")]
    NotEnoughData(String),

    #[error("Invalid parameter '{0}': {1}")]
    InvalidParameter(String, String),
}

impl AnalyticsError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        AnalyticsError::InvalidParameter(name.to_string(), reason.into())
    }
}
