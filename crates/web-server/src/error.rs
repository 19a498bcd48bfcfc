use analytics::AnalyticsError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use backtester::BacktestError;
use core_types::CoreError;
use serde_json::json;
use simulator::SimulationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Analytics(#[from] AnalyticsError),
    #[error("{0}")]
    Backtest(#[from] BacktestError),
    #[error("{0}")]
    Simulation(#[from] SimulationError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for AppError {
    fn from(error: CoreError) -> Self {
        AppError::InvalidInput(error.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Analytics(e) => analytics_status(e),
            AppError::Backtest(BacktestError::Analytics(e)) => analytics_status(e),
            AppError::Backtest(
                BacktestError::InvalidParameter(_) | BacktestError::InvalidBar(_),
            ) => StatusCode::BAD_REQUEST,
            AppError::Backtest(BacktestError::InsufficientData(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Simulation(SimulationError::Analytics(e)) => analytics_status(e),
            AppError::Simulation(SimulationError::InvalidParameter(..)) => StatusCode::BAD_REQUEST,
            AppError::Simulation(SimulationError::InsufficientData(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn analytics_status(error: &AnalyticsError) -> StatusCode {
    match error {
        AnalyticsError::InvalidParameter(..) => StatusCode::BAD_REQUEST,
        AnalyticsError::NotEnoughData(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Converts our custom `AppError` into the `{"success": false, "error": ...}` envelope.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed.");
            "An internal error occurred".to_string()
        } else {
            tracing::warn!(error = %self, "Rejected request.");
            self.to_string()
        };

        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}
