use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily OHLCV bar of a futures contract.
///
/// Prices are plain `f64` because every consumer of a bar is a floating-point
/// formula (returns, true range, indicators).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Outstanding contracts. Exchanges that do not report it leave it at zero.
    #[serde(default)]
    pub open_interest: f64,
}

impl Bar {
    /// The high-low span of the bar.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// True when every price and volume field is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume, self.open_interest]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Checks that the bar is internally consistent.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.is_finite() {
            return Err(CoreError::InvalidInput(
                self.date.to_string(),
                "non-finite price or volume".to_string(),
            ));
        }
        if !(self.open > 0.0 && self.high > 0.0 && self.low > 0.0 && self.close > 0.0) {
            return Err(CoreError::InvalidInput(
                self.date.to_string(),
                format!(
                    "prices must be positive (open {}, high {}, low {}, close {})",
                    self.open, self.high, self.low, self.close
                ),
            ));
        }
        if self.high < self.low {
            return Err(CoreError::InvalidInput(
                self.date.to_string(),
                format!("high {} is below low {}", self.high, self.low),
            ));
        }
        if self.volume < 0.0 || self.open_interest < 0.0 {
            return Err(CoreError::InvalidInput(
                self.date.to_string(),
                "negative volume or open interest".to_string(),
            ));
        }
        Ok(())
    }
}

/// One point of a dated value series, e.g. an equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Extracts the closing prices of a bar slice.
pub fn closes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Turns a bar slice into a close-price series.
pub fn close_series(bars: &[Bar]) -> Vec<SeriesPoint> {
    bars.iter().map(|b| SeriesPoint::new(b.date, b.close)).collect()
}
