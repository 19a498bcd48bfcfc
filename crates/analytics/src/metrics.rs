//! Closed-form performance metrics.
//!
//! These helpers never fail: insufficient or degenerate input yields `0.0`,
//! which is what the dashboards display for "not enough history yet".

use crate::stats;
use chrono::NaiveDate;

/// Calendar days per year used by [`cagr`].
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Annualized Sharpe ratio with a zero risk-free rate.
///
/// `mean(returns) / std(returns) * sqrt(periods_per_year)` using the sample
/// standard deviation. Fewer than two returns or a flat series give `0.0`.
pub fn sharpe(returns: &[f64], periods_per_year: f64) -> f64 {
    sharpe_with_rf(returns, 0.0, periods_per_year)
}

/// Annualized Sharpe ratio of returns in excess of `risk_free_per_period`.
pub fn sharpe_with_rf(returns: &[f64], risk_free_per_period: f64, periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let (Some(mean), Some(std)) = (stats::mean(returns), stats::sample_std(returns)) else {
        return 0.0;
    };
    if std <= f64::EPSILON || !std.is_finite() {
        return 0.0;
    }
    (mean - risk_free_per_period) / std * periods_per_year.max(0.0).sqrt()
}

/// Annualized Sortino ratio: like Sharpe, but only losses count as risk.
///
/// Returns `0.0` when there are fewer than two returns or no losing period.
pub fn sortino(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let Some(mean) = stats::mean(returns) else {
        return 0.0;
    };
    let downside_sq: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| r * r).sum();
    let downside_dev = (downside_sq / returns.len() as f64).sqrt();
    if downside_dev <= f64::EPSILON {
        return 0.0;
    }
    mean / downside_dev * periods_per_year.max(0.0).sqrt()
}

/// Deepest peak-to-trough decline as a fraction of the running peak.
///
/// The result is always `<= 0`: `-0.25` means the series fell 25% below its
/// high-water mark. A non-decreasing or empty series gives `0.0`. Points where
/// the running peak is not positive are ignored.
pub fn max_drawdown(values: &[f64]) -> f64 {
    drawdown_series(values).into_iter().fold(0.0, f64::min)
}

/// Drawdown of every point relative to the running peak (same length as input).
pub fn drawdown_series(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&v| {
            if v > peak {
                peak = v;
            }
            if peak > 0.0 {
                ((v - peak) / peak).min(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Compound annual growth rate between two values `days` calendar days apart.
///
/// Returns `0.0` when `start`, `end` or `days` is not positive.
pub fn cagr(start: f64, end: f64, days: f64) -> f64 {
    if start <= 0.0 || end <= 0.0 || days <= 0.0 {
        return 0.0;
    }
    (end / start).powf(DAYS_PER_YEAR / days) - 1.0
}

/// [`cagr`] over the calendar span between two dates.
pub fn cagr_between(start: f64, end: f64, from: NaiveDate, to: NaiveDate) -> f64 {
    cagr(start, end, (to - from).num_days() as f64)
}

/// Simple return from `start` to `end`; `0.0` when `start` is not positive.
pub fn total_return(start: f64, end: f64) -> f64 {
    if start <= 0.0 {
        return 0.0;
    }
    end / start - 1.0
}

/// Sample standard deviation of returns scaled to a yearly horizon.
pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> f64 {
    stats::sample_std(returns)
        .map(|std| std * periods_per_year.max(0.0).sqrt())
        .unwrap_or(0.0)
}

/// Growth per unit of drawdown. `None` when there was no drawdown.
pub fn calmar(cagr: f64, max_drawdown: f64) -> Option<f64> {
    if max_drawdown >= 0.0 {
        return None;
    }
    Some(cagr / max_drawdown.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharpe_insufficient_data_is_zero() {
        assert_eq!(sharpe(&[], 252.0), 0.0);
        assert_eq!(sharpe(&[0.05], 252.0), 0.0);
    }

    #[test]
    fn test_sharpe_flat_returns_is_zero() {
        assert_eq!(sharpe(&[0.01, 0.01, 0.01], 252.0), 0.0);
    }

    #[test]
    fn test_sharpe_annualizes_by_sqrt_periods() {
        let returns = [0.01, 0.02, -0.01, 0.015, 0.005];
        let daily = sharpe(&returns, 1.0);
        let annual = sharpe(&returns, 252.0);
        assert!(daily > 0.0);
        assert!((annual - daily * 252.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_sharpe_risk_free_lowers_ratio() {
        let returns = [0.01, 0.02, -0.01, 0.015, 0.005];
        assert!(sharpe_with_rf(&returns, 0.002, 252.0) < sharpe(&returns, 252.0));
    }

    #[test]
    fn test_sortino_without_losses_is_zero() {
        assert_eq!(sortino(&[0.01, 0.02, 0.03], 252.0), 0.0);
        assert!(sortino(&[0.03, -0.01, 0.02, -0.005], 252.0) > 0.0);
    }

    #[test]
    fn test_max_drawdown_known_value() {
        let equity = [100.0, 110.0, 105.0, 120.0, 90.0, 115.0];
        assert!((max_drawdown(&equity) - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_max_drawdown_non_decreasing_is_zero() {
        assert_eq!(max_drawdown(&[100.0, 100.0, 101.0, 130.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_max_drawdown_is_never_positive() {
        let series = [5.0, 1.0, 9.0, 3.0, 12.0, 0.5, 7.0];
        let dd = max_drawdown(&series);
        assert!(dd <= 0.0);
        assert!(drawdown_series(&series).iter().all(|d| *d <= 0.0));
    }

    #[test]
    fn test_drawdown_series_keeps_length() {
        let series = [100.0, 80.0, 120.0];
        let dd = drawdown_series(&series);
        assert_eq!(dd.len(), 3);
        assert!((dd[1] + 0.2).abs() < 1e-12);
        assert_eq!(dd[2], 0.0);
    }

    #[test]
    fn test_cagr_guards() {
        assert_eq!(cagr(0.0, 110.0, 365.0), 0.0);
        assert_eq!(cagr(100.0, -1.0, 365.0), 0.0);
        assert_eq!(cagr(100.0, 110.0, 0.0), 0.0);
        assert_eq!(cagr(-5.0, 110.0, -3.0), 0.0);
    }

    #[test]
    fn test_cagr_one_year_equals_total_return() {
        assert!((cagr(100.0, 110.0, 365.0) - 0.10).abs() < 1e-12);
        assert!((cagr(100.0, 121.0, 730.0) - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_cagr_between_dates() {
        let from = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!((cagr_between(100.0, 110.0, from, to) - 0.10).abs() < 1e-12);
        assert_eq!(cagr_between(100.0, 110.0, to, from), 0.0);
    }

    #[test]
    fn test_calmar() {
        assert_eq!(calmar(0.2, 0.0), None);
        assert_eq!(calmar(0.2, -0.1), Some(2.0));
    }

    #[test]
    fn test_total_return_and_volatility() {
        assert!((total_return(100.0, 125.0) - 0.25).abs() < 1e-12);
        assert_eq!(total_return(0.0, 125.0), 0.0);
        assert_eq!(annualized_volatility(&[0.01], 252.0), 0.0);
        assert!(annualized_volatility(&[0.01, -0.01], 252.0) > 0.0);
    }
}
