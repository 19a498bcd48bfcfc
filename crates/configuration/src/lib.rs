use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    AnalyticsSettings, Config, CustodySettings, HarvesterParams, LogFormat, LoggingSettings,
    RobotSettings, SentinelParams, ServerSettings, SimulationSettings, VectorParams,
};

/// Prefix of the environment variables that override file settings,
/// e.g. `QUANTAGRIFY__CUSTODY__TRAIN_RATIO=0.6`.
pub const ENV_PREFIX: &str = "QUANTAGRIFY";

/// Loads the application configuration.
///
/// Sources are layered as built-in defaults, then the TOML file at `path` (if it
/// exists), then `QUANTAGRIFY__*` environment variables. The plain `PORT`
/// variable, as set by most hosting platforms, wins over everything for the
/// server port. The result is validated before it is returned.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port
            .parse()
            .map_err(|_| {
                ConfigError::ValidationError(format!("PORT is not a valid port: {}", port))
            })?;
        builder = builder.set_override("server.port", port)?;
    }

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.build()?.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(path = %path.display(), "Configuration loaded.");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.analytics.periods_per_year, 252.0);
        assert_eq!(config.robots.harvester.lookback, 60);
    }

    #[test]
    fn test_file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[custody]
initial_capital = 250000
commission_rate = 0.0005
train_ratio = 0.6

[robots.vector]
lookback = 8
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.custody.initial_capital, dec!(250000));
        assert_eq!(config.custody.commission_rate, dec!(0.0005));
        assert_eq!(config.custody.train_ratio, 0.6);
        assert_eq!(config.robots.vector.lookback, 8);
        // Untouched keys in the same section keep their defaults.
        assert_eq!(config.robots.vector.k1, 0.7);
    }

    #[test]
    fn test_invalid_file_values_fail_validation() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[analytics]\nrsi_period = 0").unwrap();

        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_nan_thresholds_fail_validation() {
        let lines = [
            "bollinger_std_dev = nan",
            "gap_threshold_multiplier = nan",
            "volatility_window = 1",
        ];
        for line in lines {
            let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            writeln!(file, "[analytics]\n{line}").unwrap();
            assert!(
                matches!(load_config(file.path()), Err(ConfigError::ValidationError(_))),
                "{line}"
            );
        }
    }
}
