use crate::error::AnalyticsError;
use crate::stats;
use core_types::Bar;

/// True range of every bar.
///
/// The first bar has no previous close, so its true range is `high - low`.
/// Afterwards it is `max(high - low, |high - prev_close|, |low - prev_close|)`.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut prev_close: Option<f64> = None;
    bars.iter()
        .map(|bar| {
            let tr = match prev_close {
                Some(pc) => bar
                    .range()
                    .max((bar.high - pc).abs())
                    .max((bar.low - pc).abs()),
                None => bar.range(),
            };
            prev_close = Some(bar.close);
            tr
        })
        .collect()
}

/// Average true range as a trailing simple mean of [`true_range`].
///
/// While fewer than `period` bars are available the mean runs over what there
/// is, so the output always has one value per bar and starts with the first
/// true range.
pub fn atr(bars: &[Bar], period: usize) -> Result<Vec<f64>, AnalyticsError> {
    if period == 0 {
        return Err(AnalyticsError::invalid("period", "ATR period must be at least 1"));
    }
    let tr = true_range(bars);
    let mut out = Vec::with_capacity(tr.len());
    let mut window_sum = 0.0;
    for i in 0..tr.len() {
        window_sum += tr[i];
        if i >= period {
            window_sum -= tr[i - period];
        }
        let n = (i + 1).min(period);
        out.push(window_sum / n as f64);
    }
    Ok(out)
}

/// Rolling annualized volatility of simple returns.
///
/// Element `i` covers the returns ending at close `i`; it is `None` until
/// `window` returns are available, and index 0 is always `None`.
pub fn realized_volatility(
    closes: &[f64],
    window: usize,
    periods_per_year: f64,
) -> Result<Vec<Option<f64>>, AnalyticsError> {
    if window < 2 {
        return Err(AnalyticsError::invalid("window", "needs at least 2 returns"));
    }
    let scale = periods_per_year.max(0.0).sqrt();
    let mut out = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i < window {
            out.push(None);
            continue;
        }
        let returns = stats::pct_returns(&closes[i - window..=i]);
        out.push(stats::sample_std(&returns).map(|s| s * scale));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 1.0,
            open_interest: 1.0,
        }
    }

    fn sample_bars() -> Vec<Bar> {
        vec![
            bar(1, 10.0, 8.0, 9.0),
            bar(2, 12.0, 11.0, 11.5), // gap up: |12 - 9| = 3
            bar(3, 11.0, 10.0, 10.5), // |10 - 11.5| = 1.5
            bar(4, 10.8, 10.2, 10.6), // 0.6 vs |10.2-10.5| = 0.3
        ]
    }

    #[test]
    fn test_true_range_uses_previous_close() {
        let tr = true_range(&sample_bars());
        assert_eq!(tr.len(), 4);
        assert!((tr[0] - 2.0).abs() < 1e-12);
        assert!((tr[1] - 3.0).abs() < 1e-12);
        assert!((tr[2] - 1.5).abs() < 1e-12);
        assert!((tr[3] - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_atr_length_and_first_element() {
        let bars = sample_bars();
        let values = atr(&bars, 2).unwrap();
        assert_eq!(values.len(), bars.len());
        assert_eq!(values[0], true_range(&bars)[0]);
        assert!((values[1] - 2.5).abs() < 1e-12);
        assert!((values[2] - 2.25).abs() < 1e-12);
        assert!((values[3] - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_atr_empty_and_zero_period() {
        assert!(atr(&[], 14).unwrap().is_empty());
        assert!(atr(&sample_bars(), 0).is_err());
    }

    #[test]
    fn test_realized_volatility_shape() {
        let closes = [100.0, 101.0, 99.0, 102.0, 100.0];
        let vol = realized_volatility(&closes, 3, 252.0).unwrap();
        assert_eq!(vol.len(), closes.len());
        assert!(vol[..3].iter().all(Option::is_none));
        assert!(vol[3].unwrap() > 0.0);
        assert!(realized_volatility(&closes, 1, 252.0).is_err());
    }
}
