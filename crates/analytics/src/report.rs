use crate::indicators::{BollingerBand, Gap};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A standardized report of how a value series (equity or price) performed.
///
/// Ratios are plain fractions: a `total_return` of `0.12` means +12% and a
/// `max_drawdown` of `-0.08` means the series spent time 8% below its peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    // I. Period
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub observations: usize,
    pub initial_value: f64,
    pub final_value: f64,

    // II. Growth
    pub total_return: f64,
    pub cagr: f64,

    // III. Risk
    pub annualized_volatility: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: Option<f64>, // Option<> for series that never drew down
}

impl PerformanceReport {
    /// Creates a new, zeroed-out report.
    /// This is what a series too short to measure produces.
    pub fn new() -> Self {
        Self {
            start_date: None,
            end_date: None,
            observations: 0,
            initial_value: 0.0,
            final_value: 0.0,
            total_return: 0.0,
            cagr: 0.0,
            annualized_volatility: 0.0,
            max_drawdown: 0.0,
            sharpe_ratio: 0.0,
            sortino_ratio: 0.0,
            calmar_ratio: None,
        }
    }
}

impl Default for PerformanceReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Volatility and drawdown of an asset's compounded daily returns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub annualized_volatility: f64,
    pub max_drawdown: f64,
    /// Set when volatility exceeds 100% a year, which for an agricultural
    /// future almost always means broken data (unadjusted rolls, bad ticks).
    pub suspect_data: bool,
}

/// Every per-bar indicator the feature screens plot, aligned with the input bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub atr: Vec<f64>,
    pub rsi_wilder: Vec<f64>,
    pub rsi_sma: Vec<f64>,
    pub bollinger: Vec<Option<BollingerBand>>,
    pub liquidity_pressure: Vec<f64>,
    /// Rolling annualized volatility, `None` until the window is full.
    pub realized_volatility: Vec<Option<f64>>,
    pub gaps: Vec<Gap>,
    /// Closes with every detected gap removed by shifting the older prices.
    pub adjusted_closes: Vec<f64>,
}
