use crate::stats;
use serde::{Deserialize, Serialize};

/// Annualized parameters of a Merton jump-diffusion model.
///
/// Agricultural prices drift with inflation and jump on weather news, which a
/// mean-reverting model misses; the jump component captures the latter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpDiffusionParams {
    /// Annualized drift of log returns.
    pub mu: f64,
    /// Annualized diffusion volatility.
    pub sigma: f64,
    /// Expected number of jumps per year.
    pub lambda: f64,
    pub jump_mean: f64,
    pub jump_vol: f64,
}

/// Fits jump-diffusion parameters with the method of moments.
///
/// Log returns beyond `jump_sigmas` standard deviations are treated as jumps.
/// Returns `None` when fewer than two log returns are available.
pub fn fit_merton(
    closes: &[f64],
    periods_per_year: f64,
    jump_sigmas: f64,
) -> Option<JumpDiffusionParams> {
    let returns = stats::log_returns(closes);
    if returns.len() < 2 || periods_per_year <= 0.0 {
        return None;
    }

    let mean = stats::mean(&returns)?;
    let std = stats::population_std(&returns)?;

    // A flat return series has no scale to measure jumps against.
    let jumps: Vec<f64> = if std > f64::EPSILON {
        let threshold = jump_sigmas * std;
        returns.iter().copied().filter(|r| r.abs() > threshold).collect()
    } else {
        Vec::new()
    };
    let years = returns.len() as f64 / periods_per_year;

    Some(JumpDiffusionParams {
        mu: mean * periods_per_year,
        sigma: std * periods_per_year.sqrt(),
        lambda: jumps.len() as f64 / years,
        jump_mean: stats::mean(&jumps).unwrap_or(0.0),
        jump_vol: stats::population_std(&jumps).unwrap_or(0.0),
    })
}
