use crate::{error::AppError, AppState};
use analytics::{AnalyticsEngine, IndicatorSet, PerformanceReport, RiskProfile};
use axum::{extract::State, Json};
use backtester::{CustodyReport, CustodyRunner};
use chrono::NaiveDate;
use core_types::{Bar, Scenario, SeriesPoint};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use simulator::{numerical_test, NumericalTest, ScenarioGenerator};
use std::sync::Arc;

/// Longest date range a single scenario request may generate.
const MAX_SCENARIO_DAYS: i64 = 366 * 30;

/// # GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "online",
        "version": env!("CARGO_PKG_VERSION"),
        "mode": "STRICT_ROBUST",
    }))
}

/// # GET /health
/// Simple health check for monitoring systems.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub series: Vec<SeriesPoint>,
}

/// # POST /api/analytics/report
/// Performance metrics of a dated value series (an equity curve or closes).
pub async fn performance_report(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<PerformanceReport>, AppError> {
    let engine = AnalyticsEngine::new(state.config.analytics.clone());
    Ok(Json(engine.calculate(&request.series)?))
}

#[derive(Debug, Deserialize)]
pub struct IndicatorRequest {
    pub bars: Vec<Bar>,
    pub rsi_period: Option<usize>,
    pub atr_period: Option<usize>,
    pub gap_threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct IndicatorResponse {
    #[serde(flatten)]
    pub indicators: IndicatorSet,
    pub risk_profile: RiskProfile,
}

/// # POST /api/analytics/indicators
/// Per-bar ATR, both RSI flavours, Bollinger bands, liquidity pressure, rollover
/// gaps and the risk profile. Periods default to the configured ones.
pub async fn indicators(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IndicatorRequest>,
) -> Result<Json<IndicatorResponse>, AppError> {
    validate_bars(&request.bars)?;

    let mut settings = state.config.analytics.clone();
    if let Some(period) = request.rsi_period {
        settings.rsi_period = period;
    }
    if let Some(period) = request.atr_period {
        settings.atr_period = period;
    }
    if let Some(threshold) = request.gap_threshold {
        settings.gap_threshold_multiplier = threshold;
    }
    let engine = AnalyticsEngine::new(settings);

    Ok(Json(IndicatorResponse {
        indicators: engine.indicator_set(&request.bars)?,
        risk_profile: engine.risk_profile(&request.bars),
    }))
}

#[derive(Debug, Deserialize)]
pub struct BarsRequest {
    pub bars: Vec<Bar>,
    pub seed: Option<u64>,
}

/// # POST /api/backtest/custody
/// Runs Sentinel, Vector and Harvester on the bars after the training split.
pub async fn custody(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BarsRequest>,
) -> Result<Json<CustodyReport>, AppError> {
    validate_bars(&request.bars)?;
    let runner = CustodyRunner::new(
        state.config.custody.clone(),
        state.config.robots.clone(),
        AnalyticsEngine::new(state.config.analytics.clone()),
    );
    let report = tokio::task::spawn_blocking(move || runner.run(&request.bars))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct ScenarioRequest {
    pub scenario: Scenario,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ScenarioResponse {
    pub scenario: Scenario,
    pub seed: u64,
    pub bars: Vec<Bar>,
}

/// # POST /api/simulation/scenario
/// Generates a synthetic bar series. The seed used is echoed back so the
/// series can be reproduced.
pub async fn scenario(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScenarioRequest>,
) -> Result<Json<ScenarioResponse>, AppError> {
    if (request.to - request.from).num_days() > MAX_SCENARIO_DAYS {
        return Err(AppError::InvalidInput(format!(
            "date range is limited to {MAX_SCENARIO_DAYS} days"
        )));
    }
    let seed = state.seed(request.seed);
    let mut generator = ScenarioGenerator::new(state.config.simulation.clone(), seed);
    let bars = generator.generate(request.scenario, request.from, request.to)?;
    Ok(Json(ScenarioResponse {
        scenario: request.scenario,
        seed,
        bars,
    }))
}

#[derive(Debug, Serialize)]
pub struct JumpDiffusionResponse {
    pub seed: u64,
    #[serde(flatten)]
    pub test: NumericalTest,
}

/// # POST /api/simulation/jump-diffusion
/// Fits the jump-diffusion model on the training slice and scores a simulated
/// path against the held-out closes.
pub async fn jump_diffusion(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BarsRequest>,
) -> Result<Json<JumpDiffusionResponse>, AppError> {
    validate_bars(&request.bars)?;
    let seed = state.seed(request.seed);
    let config = &state.config;
    let (train_ratio, periods, sigmas, points) = (
        config.custody.train_ratio,
        config.analytics.periods_per_year,
        config.analytics.jump_threshold_sigmas,
        config.simulation.sample_points,
    );
    let test = tokio::task::spawn_blocking(move || {
        let mut rng = StdRng::seed_from_u64(seed);
        numerical_test(&request.bars, train_ratio, periods, sigmas, points, &mut rng)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(Json(JumpDiffusionResponse { seed, test }))
}

/// Rejects malformed bars up front so every endpoint reports them the same way.
fn validate_bars(bars: &[Bar]) -> Result<(), AppError> {
    for bar in bars {
        bar.validate()?;
    }
    if bars.windows(2).any(|w| w[1].date <= w[0].date) {
        return Err(AppError::InvalidInput(
            "bars must be in strictly ascending date order".to_string(),
        ));
    }
    Ok(())
}
