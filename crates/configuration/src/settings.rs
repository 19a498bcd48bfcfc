use crate::error::ConfigError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// The root configuration structure for the entire application.
///
/// Every section falls back to its defaults, so an empty or missing
/// `config.toml` still yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub analytics: AnalyticsSettings,
    pub custody: CustodySettings,
    pub robots: RobotSettings,
    pub simulation: SimulationSettings,
}

impl Config {
    /// Rejects values that would make the numeric routines meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analytics.validate()?;
        self.custody.validate()?;
        self.robots.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

/// Where the HTTP service listens.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body in bytes.
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            body_limit_bytes: 1024 * 1024 * 50,
        }
    }
}

/// Output format of the console log layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            directory: None,
            file_prefix: "quantagrify.log".to_string(),
        }
    }
}

/// Parameters shared by every metric and indicator calculation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Trading periods per year used to annualize (252 for daily bars).
    pub periods_per_year: f64,
    /// Risk-free rate per period, subtracted from returns in the Sharpe ratio.
    pub risk_free_rate: f64,
    pub atr_period: usize,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_std_dev: f64,
    /// Returns per window of the rolling realized volatility.
    pub volatility_window: usize,
    /// A bar is a gap when its move exceeds this multiple of the average move.
    pub gap_threshold_multiplier: f64,
    /// Upper bound for volume / open interest.
    pub liquidity_pressure_cap: f64,
    /// Returns beyond this many standard deviations count as jumps.
    pub jump_threshold_sigmas: f64,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            periods_per_year: 252.0,
            risk_free_rate: 0.0,
            atr_period: 14,
            rsi_period: 14,
            bollinger_period: 20,
            bollinger_std_dev: 2.0,
            volatility_window: 20,
            gap_threshold_multiplier: 4.0,
            liquidity_pressure_cap: 50.0,
            jump_threshold_sigmas: 3.0,
        }
    }
}

impl AnalyticsSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.periods_per_year > 0.0) {
            return Err(invalid("analytics.periods_per_year must be positive"));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(invalid("analytics.risk_free_rate must be a number"));
        }
        if self.atr_period == 0 || self.rsi_period == 0 || self.bollinger_period == 0 {
            return Err(invalid("analytics indicator periods cannot be zero"));
        }
        if self.volatility_window < 2 {
            return Err(invalid("analytics.volatility_window must be at least 2"));
        }
        if !(self.bollinger_std_dev > 0.0
            && self.gap_threshold_multiplier > 0.0
            && self.jump_threshold_sigmas > 0.0)
        {
            return Err(invalid("analytics band width and thresholds must be positive"));
        }
        if !(self.liquidity_pressure_cap > 0.0) {
            return Err(invalid("analytics.liquidity_pressure_cap must be positive"));
        }
        Ok(())
    }
}

/// Parameters for the out-of-sample custody backtest.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CustodySettings {
    pub initial_capital: Decimal,
    /// Commission charged on traded notional. 0.0001 corresponds to 1bp.
    pub commission_rate: Decimal,
    /// Fraction of the history used for modelling; the rest is traded.
    pub train_ratio: f64,
    /// Minimum number of bars skipped before robots may trade.
    pub warmup_bars: usize,
}

impl Default for CustodySettings {
    fn default() -> Self {
        Self {
            initial_capital: dec!(1000000),
            commission_rate: dec!(0.0001),
            train_ratio: 0.7,
            warmup_bars: 50,
        }
    }
}

impl CustodySettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(invalid("custody.initial_capital must be positive"));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate >= Decimal::ONE {
            return Err(invalid("custody.commission_rate must be in [0, 1)"));
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(invalid("custody.train_ratio must be in (0, 1)"));
        }
        Ok(())
    }
}

/// Contains the parameter sets for all custody robots.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RobotSettings {
    pub sentinel: SentinelParams,
    pub vector: VectorParams,
    pub harvester: HarvesterParams,
}

impl RobotSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.sentinel.bb_period < 2 || self.sentinel.bb_std_dev <= 0.0 {
            return Err(invalid("robots.sentinel needs bb_period >= 2 and a positive bb_std_dev"));
        }
        if !(self.sentinel.position_fraction > 0.0 && self.sentinel.position_fraction <= 1.0) {
            return Err(invalid("robots.sentinel.position_fraction must be in (0, 1]"));
        }
        if self.vector.lookback == 0 {
            return Err(invalid("robots.vector.lookback cannot be zero"));
        }
        if !(self.vector.capital_fraction > 0.0 && self.vector.capital_fraction <= 1.0) {
            return Err(invalid("robots.vector.capital_fraction must be in (0, 1]"));
        }
        if self.harvester.lookback < 3 {
            return Err(invalid("robots.harvester.lookback must be at least 3"));
        }
        if !(self.harvester.target_volatility > 0.0 && self.harvester.max_leverage > 0.0) {
            return Err(invalid(
                "robots.harvester needs positive target_volatility and max_leverage",
            ));
        }
        Ok(())
    }
}

/// Bollinger band mean-reversion robot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentinelParams {
    pub bb_period: usize,
    pub bb_std_dev: f64,
    /// Share of equity committed when buying the lower band.
    pub position_fraction: f64,
}

impl Default for SentinelParams {
    fn default() -> Self {
        Self {
            bb_period: 20,
            bb_std_dev: 2.0,
            position_fraction: 0.5,
        }
    }
}

/// Dual Thrust breakout robot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorParams {
    /// Bars used to measure the breakout range.
    pub lookback: usize,
    pub k1: f64,
    pub k2: f64,
    /// Share of equity committed on each flip.
    pub capital_fraction: f64,
}

impl Default for VectorParams {
    fn default() -> Self {
        Self {
            lookback: 4,
            k1: 0.7,
            k2: 0.7,
            capital_fraction: 0.9,
        }
    }
}

/// Volatility-targeted trend robot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvesterParams {
    pub lookback: usize,
    /// Annualized volatility the position is sized for.
    pub target_volatility: f64,
    pub max_leverage: f64,
    /// Changes smaller than this share of equity are not traded.
    pub rebalance_buffer: f64,
    /// Periods per year used to annualize the realized volatility.
    pub annualization_periods: f64,
}

impl Default for HarvesterParams {
    fn default() -> Self {
        Self {
            lookback: 60,
            target_volatility: 0.15,
            max_leverage: 2.0,
            rebalance_buffer: 0.05,
            annualization_periods: 252.0,
        }
    }
}

/// Parameters of the synthetic data generator and the jump-diffusion test.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub start_price: f64,
    pub base_volume: f64,
    pub base_open_interest: f64,
    /// Fixed seed for reproducible runs; a random seed is drawn when absent.
    pub seed: Option<u64>,
    /// Number of points kept from a simulated path in reports.
    pub sample_points: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            start_price: 3000.0,
            base_volume: 100_000.0,
            base_open_interest: 500_000.0,
            seed: None,
            sample_points: 50,
        }
    }
}

impl SimulationSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.start_price <= 0.0 {
            return Err(invalid("simulation.start_price must be positive"));
        }
        if self.base_volume < 0.0 || self.base_open_interest < 0.0 {
            return Err(invalid("simulation volumes cannot be negative"));
        }
        if self.sample_points == 0 {
            return Err(invalid("simulation.sample_points cannot be zero"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.custody.commission_rate, dec!(0.0001));
    }

    #[test]
    fn test_train_ratio_must_be_a_fraction() {
        let mut config = Config::default();
        config.custody.train_ratio = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_zero_atr_period_is_rejected() {
        let mut config = Config::default();
        config.analytics.atr_period = 0;
        assert!(config.validate().is_err());
    }
}
