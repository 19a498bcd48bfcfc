use crate::error::AnalyticsError;
use crate::report::{IndicatorSet, PerformanceReport, RiskProfile};
use crate::{indicators, metrics, stats, volatility};
use configuration::AnalyticsSettings;
use core_types::{closes, Bar, SeriesPoint};

/// Annualized volatility above which a risk profile is flagged as suspect.
pub const SUSPECT_VOLATILITY: f64 = 1.0;

/// A stateless calculator for deriving performance metrics from value series.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    settings: AnalyticsSettings,
}

impl AnalyticsEngine {
    pub fn new(settings: AnalyticsSettings) -> Self {
        Self { settings }
    }

    /// The main entry point for calculating performance metrics.
    ///
    /// # Arguments
    ///
    /// * `curve` - A dated value series in ascending date order, e.g. an equity curve.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `PerformanceReport` or an `AnalyticsError`.
    pub fn calculate(&self, curve: &[SeriesPoint]) -> Result<PerformanceReport, AnalyticsError> {
        let mut report = PerformanceReport::new();

        if curve.is_empty() {
            return Ok(report);
        }
        Self::check_curve(curve)?;

        let values: Vec<f64> = curve.iter().map(|p| p.value).collect();

        self.calculate_growth(curve, &mut report);
        self.calculate_drawdown(&values, &mut report);
        self.calculate_ratios(&values, &mut report);

        tracing::debug!(
            observations = report.observations,
            total_return = report.total_return,
            sharpe = report.sharpe_ratio,
            "Performance report calculated."
        );
        Ok(report)
    }

    fn check_curve(curve: &[SeriesPoint]) -> Result<(), AnalyticsError> {
        if let Some(bad) = curve.iter().find(|p| !p.value.is_finite()) {
            return Err(AnalyticsError::invalid(
                "series",
                format!("non-finite value on {}", bad.date),
            ));
        }
        if let Some(w) = curve.windows(2).find(|w| w[1].date < w[0].date) {
            return Err(AnalyticsError::invalid(
                "series",
                format!("dates must be ascending ({} follows {})", w[1].date, w[0].date),
            ));
        }
        Ok(())
    }

    /// Calculates period and growth metrics.
    fn calculate_growth(&self, curve: &[SeriesPoint], report: &mut PerformanceReport) {
        let (first, last) = (curve[0], curve[curve.len() - 1]);
        report.start_date = Some(first.date);
        report.end_date = Some(last.date);
        report.observations = curve.len();
        report.initial_value = first.value;
        report.final_value = last.value;
        report.total_return = metrics::total_return(first.value, last.value);
        report.cagr = metrics::cagr_between(first.value, last.value, first.date, last.date);
    }

    /// Calculates maximum drawdown from the value series.
    fn calculate_drawdown(&self, values: &[f64], report: &mut PerformanceReport) {
        report.max_drawdown = metrics::max_drawdown(values);
    }

    /// Calculates all ratio-based metrics like Sharpe and Calmar.
    fn calculate_ratios(&self, values: &[f64], report: &mut PerformanceReport) {
        let periods = self.settings.periods_per_year;
        let returns = stats::pct_returns(values);

        report.annualized_volatility = metrics::annualized_volatility(&returns, periods);
        report.sharpe_ratio =
            metrics::sharpe_with_rf(&returns, self.settings.risk_free_rate, periods);
        report.sortino_ratio = metrics::sortino(&returns, periods);
        report.calmar_ratio = metrics::calmar(report.cagr, report.max_drawdown);
    }

    /// Volatility and drawdown of the compounded close-to-close returns.
    pub fn risk_profile(&self, bars: &[Bar]) -> RiskProfile {
        let returns = stats::pct_returns(&closes(bars));
        let annualized_volatility =
            metrics::annualized_volatility(&returns, self.settings.periods_per_year);
        let growth = stats::cumulative_growth(&returns);

        RiskProfile {
            annualized_volatility,
            max_drawdown: metrics::max_drawdown(&growth),
            suspect_data: annualized_volatility > SUSPECT_VOLATILITY,
        }
    }

    /// Computes every per-bar indicator with the configured periods.
    ///
    /// Gap detection is skipped (empty) for series shorter than two bars.
    pub fn indicator_set(&self, bars: &[Bar]) -> Result<IndicatorSet, AnalyticsError> {
        let s = &self.settings;
        let close_prices = closes(bars);

        let gaps = if bars.len() >= 2 {
            indicators::detect_gaps(bars, s.gap_threshold_multiplier)?
        } else {
            Vec::new()
        };

        let adjusted_closes = indicators::back_adjust(&close_prices, &gaps)?;

        Ok(IndicatorSet {
            atr: volatility::atr(bars, s.atr_period)?,
            rsi_wilder: indicators::rsi_wilder(&close_prices, s.rsi_period)?,
            rsi_sma: indicators::rsi_sma(&close_prices, s.rsi_period)?,
            bollinger: indicators::bollinger(
                &close_prices,
                s.bollinger_period,
                s.bollinger_std_dev,
            )?,
            liquidity_pressure: indicators::liquidity_pressure(bars, s.liquidity_pressure_cap)?,
            realized_volatility: volatility::realized_volatility(
                &close_prices,
                s.volatility_window,
                s.periods_per_year,
            )?,
            gaps,
            adjusted_closes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn curve(values: &[f64]) -> Vec<SeriesPoint> {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint::new(start + chrono::Duration::days(i as i64), *v))
            .collect()
    }

    #[test]
    fn test_empty_curve_gives_zeroed_report() {
        let engine = AnalyticsEngine::default();
        assert_eq!(engine.calculate(&[]).unwrap(), PerformanceReport::new());
    }

    #[test]
    fn test_single_point_has_no_ratios() {
        let engine = AnalyticsEngine::default();
        let report = engine.calculate(&curve(&[100.0])).unwrap();
        assert_eq!(report.observations, 1);
        assert_eq!(report.total_return, 0.0);
        assert_eq!(report.cagr, 0.0);
        assert_eq!(report.sharpe_ratio, 0.0);
        assert_eq!(report.calmar_ratio, None);
    }

    #[test]
    fn test_report_metrics() {
        let engine = AnalyticsEngine::default();
        let report = engine.calculate(&curve(&[100.0, 110.0, 99.0, 120.0])).unwrap();
        assert_eq!(report.observations, 4);
        assert!((report.total_return - 0.2).abs() < 1e-12);
        assert!((report.max_drawdown - (-0.1)).abs() < 1e-12);
        assert!(report.cagr > report.total_return);
        assert!(report.sharpe_ratio > 0.0);
        assert!(report.calmar_ratio.unwrap() > 0.0);
        assert_eq!(report.end_date, NaiveDate::from_ymd_opt(2023, 1, 4));
    }

    #[test]
    fn test_rejects_unsorted_or_non_finite_curves() {
        let engine = AnalyticsEngine::default();
        let mut points = curve(&[100.0, 101.0]);
        points.swap(0, 1);
        assert!(engine.calculate(&points).is_err());
        assert!(engine.calculate(&curve(&[100.0, f64::NAN])).is_err());
    }

    #[test]
    fn test_risk_profile_flags_broken_data() {
        let engine = AnalyticsEngine::default();
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let bars: Vec<Bar> = [100.0, 180.0, 90.0, 200.0, 80.0]
            .iter()
            .enumerate()
            .map(|(i, c)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: *c,
                high: *c,
                low: *c,
                close: *c,
                volume: 1.0,
                open_interest: 1.0,
            })
            .collect();
        let profile = engine.risk_profile(&bars);
        assert!(profile.suspect_data);
        assert!(profile.max_drawdown < -0.5);
    }

    #[test]
    fn test_indicator_set_is_aligned_with_bars() {
        let engine = AnalyticsEngine::default();
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let bars: Vec<Bar> = (0..30)
            .map(|i| {
                let c = 100.0 + (i as f64).sin();
                Bar {
                    date: start + chrono::Duration::days(i),
                    open: c,
                    high: c + 0.5,
                    low: c - 0.5,
                    close: c,
                    volume: 500.0,
                    open_interest: 1000.0,
                }
            })
            .collect();
        let set = engine.indicator_set(&bars).unwrap();
        assert_eq!(set.atr.len(), 30);
        assert_eq!(set.rsi_wilder.len(), 30);
        assert_eq!(set.rsi_sma.len(), 30);
        assert_eq!(set.bollinger.len(), 30);
        assert_eq!(set.liquidity_pressure.len(), 30);
        assert_eq!(set.realized_volatility.len(), 30);
        assert!(set.realized_volatility[19].is_none());
        assert!(set.realized_volatility[20].is_some());
        assert_eq!(set.adjusted_closes, closes(&bars));

        let single = engine.indicator_set(&bars[..1]).unwrap();
        assert!(single.gaps.is_empty());
        assert_eq!(single.adjusted_closes, vec![bars[0].close]);
    }

    #[test]
    fn test_indicator_set_back_adjusts_rollover_gaps() {
        let engine = AnalyticsEngine::default();
        let start = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        let bars: Vec<Bar> = (0..40)
            .map(|i| {
                let wiggle = if i % 2 == 0 { 1.0 } else { -1.0 };
                let c = if i < 20 { 2600.0 + wiggle } else { 2800.0 + wiggle };
                Bar {
                    date: start + chrono::Duration::days(i),
                    open: c,
                    high: c + 2.0,
                    low: c - 2.0,
                    close: c,
                    volume: 1e5,
                    open_interest: 5e5,
                }
            })
            .collect();
        let set = engine.indicator_set(&bars).unwrap();
        assert_eq!(set.gaps.len(), 1);
        assert_eq!(set.gaps[0].index, 20);

        // The roll disappears and the latest prices are untouched.
        let jump = set.adjusted_closes[20] - set.adjusted_closes[19];
        assert!(jump.abs() < 5.0, "{jump}");
        assert_eq!(set.adjusted_closes[39], bars[39].close);
    }
}
