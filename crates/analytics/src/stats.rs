//! Basic statistics over `f64` slices.
//!
//! Everything here is a pure function. Windowed helpers return one output per
//! input so their results can be zipped with the bars they came from.

use crate::error::AnalyticsError;

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (n denominator).
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / values.len() as f64).sqrt())
}

/// Sample standard deviation (n-1 denominator); `None` when fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Simple returns `(p[i] - p[i-1]) / p[i-1]`. Pairs starting at zero are skipped.
pub fn pct_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Log returns `ln(p[i] / p[i-1])`. Pairs with a non-positive price are skipped.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|w| w[0] > 0.0 && w[1] > 0.0)
        .map(|w| (w[1] / w[0]).ln())
        .collect()
}

/// Trailing mean over `window` values; `None` until the window is full.
pub fn rolling_mean(values: &[f64], window: usize) -> Result<Vec<Option<f64>>, AnalyticsError> {
    rolling(values, window, mean)
}

/// Trailing population standard deviation over `window` values.
pub fn rolling_std(values: &[f64], window: usize) -> Result<Vec<Option<f64>>, AnalyticsError> {
    rolling(values, window, population_std)
}

fn rolling(
    values: &[f64],
    window: usize,
    f: fn(&[f64]) -> Option<f64>,
) -> Result<Vec<Option<f64>>, AnalyticsError> {
    if window == 0 {
        return Err(AnalyticsError::invalid("window", "must be at least 1"));
    }
    Ok((0..values.len())
        .map(|i| {
            if i + 1 < window {
                None
            } else {
                f(&values[i + 1 - window..=i])
            }
        })
        .collect())
}

/// Compounds a return series into a growth path that starts at 1.0.
///
/// The output has one more element than the input.
pub fn cumulative_growth(returns: &[f64]) -> Vec<f64> {
    let mut path = Vec::with_capacity(returns.len() + 1);
    let mut level = 1.0;
    path.push(level);
    for r in returns {
        level *= 1.0 + r;
        path.push(level);
    }
    path
}

/// Root-mean-square error over the common prefix of two series.
pub fn rmse(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n == 0 {
        return None;
    }
    let sum_sq: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    Some((sum_sq / n as f64).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&values), Some(5.0));
        assert_eq!(population_std(&values), Some(2.0));
        let sample = sample_std(&values).unwrap();
        assert!((sample - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_std(&[]), None);
        assert_eq!(sample_std(&[1.0]), None);
        assert!(pct_returns(&[100.0]).is_empty());
        assert_eq!(rmse(&[], &[1.0]), None);
    }

    #[test]
    fn test_returns_skip_degenerate_prices() {
        let r = pct_returns(&[100.0, 110.0, 0.0, 5.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 1.0).abs() < 1e-12);

        let lr = log_returns(&[100.0, 0.0, 50.0, 100.0]);
        assert_eq!(lr.len(), 1);
        assert!((lr[0] - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_keeps_input_length() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let means = rolling_mean(&values, 3).unwrap();
        assert_eq!(means.len(), values.len());
        assert_eq!(means[..2], [None, None]);
        assert_eq!(means[2], Some(2.0));
        assert_eq!(means[4], Some(4.0));

        let stds = rolling_std(&values, 2).unwrap();
        assert_eq!(stds[0], None);
        assert_eq!(stds[1], Some(0.5));
    }

    #[test]
    fn test_rolling_window_larger_than_input() {
        let means = rolling_mean(&[1.0, 2.0], 5).unwrap();
        assert_eq!(means, vec![None, None]);
    }

    #[test]
    fn test_rolling_rejects_zero_window() {
        assert!(matches!(
            rolling_mean(&[1.0], 0),
            Err(AnalyticsError::InvalidParameter(_, _))
        ));
    }

    #[test]
    fn test_cumulative_growth() {
        let path = cumulative_growth(&[0.1, -0.5]);
        assert_eq!(path.len(), 3);
        assert!((path[1] - 1.1).abs() < 1e-12);
        assert!((path[2] - 0.55).abs() < 1e-12);
    }
}
