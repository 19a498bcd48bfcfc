//! Technical indicators used by the feature-engineering and data-audit screens.

use crate::error::AnalyticsError;
use crate::stats;
use chrono::NaiveDate;
use core_types::Bar;
use serde::{Deserialize, Serialize};

/// RSI reported while there is not enough history for a reading.
pub const NEUTRAL_RSI: f64 = 50.0;

/// RSI whose average gain and loss are simple means over the last `period` moves.
///
/// This is the lighter formula the dashboard charts use. It reacts faster
/// (and noisier) than Wilder's smoothing. Bars without a full window read 50.
pub fn rsi_sma(closes: &[f64], period: usize) -> Result<Vec<f64>, AnalyticsError> {
    check_period(period)?;
    let (gains, losses) = split_moves(closes);
    let mut out = vec![NEUTRAL_RSI; closes.len()];
    // Move `k` is the change into close `k + 1`.
    for i in period..closes.len() {
        let window = i - period..i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;
        out[i] = rsi_value(avg_gain, avg_loss);
    }
    Ok(out)
}

/// RSI with Wilder's smoothing (an EMA with `alpha = 1 / period`).
///
/// The averages are seeded with the first move; the first bar reads 50.
pub fn rsi_wilder(closes: &[f64], period: usize) -> Result<Vec<f64>, AnalyticsError> {
    check_period(period)?;
    let alpha = 1.0 / period as f64;
    let (gains, losses) = split_moves(closes);
    let mut out = Vec::with_capacity(closes.len());
    if closes.is_empty() {
        return Ok(out);
    }
    out.push(NEUTRAL_RSI);

    let mut avg: Option<(f64, f64)> = None;
    for (gain, loss) in gains.iter().zip(&losses) {
        let (g, l) = match avg {
            None => (*gain, *loss),
            Some((g, l)) => (g + alpha * (gain - g), l + alpha * (loss - l)),
        };
        avg = Some((g, l));
        out.push(rsi_value(g, l));
    }
    Ok(out)
}

fn check_period(period: usize) -> Result<(), AnalyticsError> {
    if period == 0 {
        return Err(AnalyticsError::invalid("period", "RSI period must be at least 1"));
    }
    Ok(())
}

/// Gains and losses (both non-negative) of each consecutive close pair.
fn split_moves(closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
    closes
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            (delta.max(0.0), (-delta).max(0.0))
        })
        .unzip()
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        return if avg_gain <= 0.0 { NEUTRAL_RSI } else { 100.0 };
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

/// One reading of the Bollinger bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBand {
    pub middle: f64,
    pub upper: f64,
    pub lower: f64,
}

/// Bollinger bands over a trailing window using the population standard deviation.
pub fn bollinger(
    closes: &[f64],
    period: usize,
    k: f64,
) -> Result<Vec<Option<BollingerBand>>, AnalyticsError> {
    if !(k > 0.0) {
        return Err(AnalyticsError::invalid("k", "band width must be positive"));
    }
    let means = stats::rolling_mean(closes, period)?;
    let stds = stats::rolling_std(closes, period)?;
    Ok(means
        .into_iter()
        .zip(stds)
        .map(|(m, s)| {
            let (middle, std) = (m?, s?);
            Some(BollingerBand {
                middle,
                upper: middle + k * std,
                lower: middle - k * std,
            })
        })
        .collect())
}

/// Volume divided by open interest, capped at `cap`.
///
/// During contract rollovers the reported open interest collapses and the raw
/// ratio explodes; those bars (and bars without open interest) read `cap`.
pub fn liquidity_pressure(bars: &[Bar], cap: f64) -> Result<Vec<f64>, AnalyticsError> {
    if !(cap > 0.0) {
        return Err(AnalyticsError::invalid("cap", "must be positive"));
    }
    Ok(bars
        .iter()
        .map(|b| {
            if b.open_interest <= 0.0 {
                cap
            } else {
                (b.volume / b.open_interest).min(cap)
            }
        })
        .collect())
}

/// A close-to-close move far larger than the series' typical move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// Index of the bar that opened after the gap.
    pub index: usize,
    pub date: NaiveDate,
    /// Absolute price jump `close[index] - close[index - 1]`.
    pub gap: f64,
    pub pct_change: f64,
}

/// Finds rollover gaps.
///
/// The threshold is `threshold_mult` times the mean absolute close-to-close
/// percentage change of the whole series.
pub fn detect_gaps(bars: &[Bar], threshold_mult: f64) -> Result<Vec<Gap>, AnalyticsError> {
    if !(threshold_mult > 0.0) {
        return Err(AnalyticsError::invalid("threshold_mult", "must be positive"));
    }
    if bars.len() < 2 {
        return Err(AnalyticsError::NotEnoughData(
            "gap detection needs at least two bars".to_string(),
        ));
    }

    let moves: Vec<Option<f64>> = bars
        .windows(2)
        .map(|w| (w[0].close != 0.0).then(|| (w[1].close - w[0].close) / w[0].close))
        .collect();
    let abs_moves: Vec<f64> = moves.iter().flatten().map(|m| m.abs()).collect();
    let Some(avg_move) = stats::mean(&abs_moves) else {
        return Ok(Vec::new());
    };
    let threshold = avg_move * threshold_mult;

    let gaps: Vec<Gap> = moves
        .iter()
        .enumerate()
        .filter_map(|(k, m)| {
            let pct = (*m)?;
            (pct.abs() > threshold).then(|| Gap {
                index: k + 1,
                date: bars[k + 1].date,
                gap: bars[k + 1].close - bars[k].close,
                pct_change: pct,
            })
        })
        .collect();

    tracing::debug!(count = gaps.len(), threshold, "Gap scan finished.");
    Ok(gaps)
}

/// Back-adjusts a continuous-contract close series.
///
/// Every price before a gap is shifted by the size of that gap, so the jump
/// disappears while the latest prices stay untouched.
pub fn back_adjust(closes: &[f64], gaps: &[Gap]) -> Result<Vec<f64>, AnalyticsError> {
    let mut adjusted = closes.to_vec();
    for gap in gaps {
        if gap.index == 0 || gap.index >= closes.len() {
            return Err(AnalyticsError::invalid(
                "gaps",
                format!("gap index {} is outside the series", gap.index),
            ));
        }
        for price in &mut adjusted[..gap.index] {
            *price += gap.gap;
        }
    }
    Ok(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 1000.0,
                open_interest: 100.0,
            })
            .collect()
    }

    #[test]
    fn test_rsi_bounds_and_length() {
        let closes = [44.0, 44.3, 44.1, 43.6, 44.3, 44.8, 45.1, 45.4, 45.8, 46.1, 45.9, 46.2];
        for rsi in [rsi_sma(&closes, 5).unwrap(), rsi_wilder(&closes, 5).unwrap()] {
            assert_eq!(rsi.len(), closes.len());
            assert!(rsi.iter().all(|v| (0.0..=100.0).contains(v)));
        }
    }

    #[test]
    fn test_rsi_sma_warmup_is_neutral() {
        let closes = [1.0, 2.0, 3.0, 4.0];
        let rsi = rsi_sma(&closes, 3).unwrap();
        assert_eq!(rsi[..3], [50.0, 50.0, 50.0]);
        // Only gains in the window.
        assert_eq!(rsi[3], 100.0);
    }

    #[test]
    fn test_rsi_known_sma_value() {
        // Moves: +2, -1, +1 -> avg gain 1, avg loss 1/3 -> RS 3 -> RSI 75
        let rsi = rsi_sma(&[10.0, 12.0, 11.0, 12.0], 3).unwrap();
        assert!((rsi[3] - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_wilder_smooths_from_first_move() {
        let rsi = rsi_wilder(&[10.0, 11.0, 10.0], 2).unwrap();
        assert_eq!(rsi[0], 50.0);
        assert_eq!(rsi[1], 100.0);
        // avg gain 1 -> 0.5, avg loss 0 -> 0.5
        assert!((rsi[2] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_flat_series_is_neutral() {
        let rsi = rsi_wilder(&[5.0; 6], 3).unwrap();
        assert!(rsi.iter().all(|v| *v == 50.0));
        assert!(rsi_wilder(&[], 3).unwrap().is_empty());
        assert!(rsi_sma(&[1.0], 0).is_err());
    }

    #[test]
    fn test_bollinger_bands_bracket_the_mean() {
        let closes = [1.0, 2.0, 3.0, 4.0, 5.0];
        let bands = bollinger(&closes, 3, 2.0).unwrap();
        assert_eq!(bands.len(), 5);
        assert!(bands[1].is_none());
        let b = bands[4].unwrap();
        assert_eq!(b.middle, 4.0);
        assert!(b.upper > b.middle && b.lower < b.middle);
        assert!(((b.upper - b.middle) - (b.middle - b.lower)).abs() < 1e-12);
    }

    #[test]
    fn test_nan_widths_and_thresholds_are_rejected() {
        let closes = [1.0, 2.0, 3.0];
        assert!(bollinger(&closes, 2, f64::NAN).is_err());
        assert!(bollinger(&closes, 2, 0.0).is_err());
        let bars = bars_from_closes(&closes);
        assert!(liquidity_pressure(&bars, f64::NAN).is_err());
        assert!(detect_gaps(&bars, f64::NAN).is_err());
    }

    #[test]
    fn test_liquidity_pressure_caps_rollover_holes() {
        let mut bars = bars_from_closes(&[100.0, 101.0, 102.0]);
        bars[1].open_interest = 10.0; // 1000 / 10 = 100 -> capped
        bars[2].open_interest = 0.0;
        let lp = liquidity_pressure(&bars, 50.0).unwrap();
        assert_eq!(lp, vec![10.0, 50.0, 50.0]);
        assert!(liquidity_pressure(&bars, 0.0).is_err());
    }

    #[test]
    fn test_detect_gaps_finds_rollover_jump() {
        let mut closes: Vec<f64> = (0..40)
            .map(|i| 3000.0 + if i % 2 == 0 { 5.0 } else { -5.0 })
            .collect();
        for c in closes.iter_mut().skip(20) {
            *c += 200.0;
        }
        let bars = bars_from_closes(&closes);
        let gaps = detect_gaps(&bars, 4.0).unwrap();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].index, 20);
        assert!((gaps[0].gap - 210.0).abs() < 1e-9);
        assert_eq!(gaps[0].date, bars[20].date);
    }

    #[test]
    fn test_detect_gaps_needs_two_bars() {
        let bars = bars_from_closes(&[1.0]);
        assert!(matches!(
            detect_gaps(&bars, 4.0),
            Err(AnalyticsError::NotEnoughData(_))
        ));
    }

    #[test]
    fn test_back_adjust_removes_the_jump() {
        let closes = [100.0, 101.0, 301.0, 302.0];
        let bars = bars_from_closes(&closes);
        let gap = Gap {
            index: 2,
            date: bars[2].date,
            gap: 200.0,
            pct_change: 200.0 / 101.0,
        };
        let adjusted = back_adjust(&closes, &[gap]).unwrap();
        assert_eq!(adjusted, vec![300.0, 301.0, 301.0, 302.0]);

        let bad = Gap { index: 9, ..gap };
        assert!(back_adjust(&closes, &[bad]).is_err());
    }
}
