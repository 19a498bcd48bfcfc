use crate::error::SimulationError;
use analytics::{fit_merton, stats, JumpDiffusionParams};
use core_types::{closes, Bar};
use rand::Rng;
use rand_distr::{Distribution, Poisson, StandardNormal};
use serde::Serialize;

/// Level both paths are rescaled to before they are compared.
const NORMALIZED_START: f64 = 100.0;

/// Simulates a Merton jump-diffusion price path with daily steps.
///
/// Each step applies the GBM log return `(mu - sigma^2 / 2) dt + sigma sqrt(dt) z`
/// plus the sum of `Poisson(lambda dt)` normal jumps. The path has `days + 1`
/// prices and starts at `start`.
pub fn simulate_merton_path<R: Rng + ?Sized>(
    start: f64,
    days: usize,
    params: &JumpDiffusionParams,
    periods_per_year: f64,
    rng: &mut R,
) -> Result<Vec<f64>, SimulationError> {
    if !(start > 0.0 && start.is_finite()) {
        return Err(SimulationError::invalid("start", "must be a positive price"));
    }
    if periods_per_year <= 0.0 {
        return Err(SimulationError::invalid("periods_per_year", "must be positive"));
    }
    if params.sigma < 0.0 || params.lambda < 0.0 || params.jump_vol < 0.0 {
        return Err(SimulationError::invalid(
            "params",
            "sigma, lambda and jump_vol must be non-negative",
        ));
    }

    let dt = 1.0 / periods_per_year;
    let drift = (params.mu - 0.5 * params.sigma.powi(2)) * dt;
    let diffusion = params.sigma * dt.sqrt();
    let jump_rate = params.lambda * dt;
    let jumps = if jump_rate > 0.0 {
        let poisson = Poisson::new(jump_rate)
            .map_err(|e| SimulationError::invalid("lambda", e.to_string()))?;
        Some(poisson)
    } else {
        None
    };

    let mut path = Vec::with_capacity(days + 1);
    let mut price = start;
    path.push(price);
    for _ in 0..days {
        let z: f64 = rng.sample(StandardNormal);
        let mut log_return = drift + diffusion * z;
        if let Some(poisson) = &jumps {
            let count: f64 = poisson.sample(rng);
            for _ in 0..count as u64 {
                let j: f64 = rng.sample(StandardNormal);
                log_return += params.jump_mean + params.jump_vol * j;
            }
        }
        price *= log_return.exp();
        path.push(price);
    }
    Ok(path)
}

/// Out-of-sample check of the jump-diffusion model on real bars.
#[derive(Debug, Clone, Serialize)]
pub struct NumericalTest {
    pub params: JumpDiffusionParams,
    /// RMSE between the real and simulated test paths, both rescaled to start at 100.
    pub rmse: f64,
    pub train_size: usize,
    pub test_size: usize,
    /// Evenly spaced points of the simulated path, at most `sample_points` of them.
    pub sample_path: Vec<f64>,
}

/// Fits the model on the first `train_ratio` of the closes, simulates a path
/// as long as the remaining test slice and compares the two.
pub fn numerical_test<R: Rng + ?Sized>(
    bars: &[Bar],
    train_ratio: f64,
    periods_per_year: f64,
    jump_sigmas: f64,
    sample_points: usize,
    rng: &mut R,
) -> Result<NumericalTest, SimulationError> {
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(SimulationError::invalid("train_ratio", "must lie strictly between 0 and 1"));
    }
    let prices = closes(bars);
    let split = (prices.len() as f64 * train_ratio) as usize;
    let (train, test) = prices.split_at(split);
    if test.is_empty() {
        return Err(SimulationError::InsufficientData("the test slice is empty".to_string()));
    }
    let params = fit_merton(train, periods_per_year, jump_sigmas).ok_or_else(|| {
        SimulationError::InsufficientData(format!(
            "the training slice has {} closes, at least 3 are needed",
            train.len()
        ))
    })?;

    let path = simulate_merton_path(test[0], test.len(), &params, periods_per_year, rng)?;

    let real = normalize(test);
    let simulated = normalize(&path[..path.len() - 1]);
    let rmse = stats::rmse(&real, &simulated).ok_or_else(|| {
        SimulationError::InsufficientData("no overlapping points to compare".to_string())
    })?;

    let step = path.len().div_ceil(sample_points.max(1)).max(1);
    let sample_path = path.iter().copied().step_by(step).collect();

    tracing::info!(
        train = train.len(),
        test = test.len(),
        rmse,
        lambda = params.lambda,
        "Jump-diffusion numerical test finished."
    );
    Ok(NumericalTest {
        params,
        rmse,
        train_size: train.len(),
        test_size: test.len(),
        sample_path,
    })
}

fn normalize(prices: &[f64]) -> Vec<f64> {
    match prices.first() {
        Some(&first) if first != 0.0 => {
            prices.iter().map(|p| p / first * NORMALIZED_START).collect()
        }
        _ => Vec::new(),
    }
}
