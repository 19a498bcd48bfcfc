use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("Analytics calculation error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("Robot received invalid parameters: {0}")]
    InvalidParameter(String),

    #[error("Rejected bar: {0}")]
    InvalidBar(#[from] core_types::CoreError),

    #[error("Not enough bars for a custody run: {0}")]
    InsufficientData(String),
}
