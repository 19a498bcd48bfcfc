use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies one of the custody robots run by the backtester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotId {
    /// Bollinger band mean reversion.
    Sentinel,
    /// Dual Thrust breakout.
    Vector,
    /// Volatility-targeted trend following.
    Harvester,
}

impl RobotId {
    pub const ALL: [RobotId; 3] = [RobotId::Sentinel, RobotId::Vector, RobotId::Harvester];

    pub fn as_str(&self) -> &'static str {
        match self {
            RobotId::Sentinel => "sentinel",
            RobotId::Vector => "vector",
            RobotId::Harvester => "harvester",
        }
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RobotId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sentinel" => Ok(RobotId::Sentinel),
            "vector" => Ok(RobotId::Vector),
            "harvester" => Ok(RobotId::Harvester),
            other => Err(CoreError::Parse("robot".to_string(), other.to_string())),
        }
    }
}

/// The market regimes the synthetic data generator can script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Summer weather shock with compounding gains (soybean meal drought).
    BullShock,
    /// Autumn harvest pressure ending in capitulation volume (corn).
    BearHarvest,
    /// Choppy market with a contract-switch price gap in May (palm oil).
    RolloverGap,
    /// Month-driven planting / drought / harvest script with OI rollover holes.
    Seasonal,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::BullShock,
        Scenario::BearHarvest,
        Scenario::RolloverGap,
        Scenario::Seasonal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::BullShock => "bull-shock",
            Scenario::BearHarvest => "bear-harvest",
            Scenario::RolloverGap => "rollover-gap",
            Scenario::Seasonal => "seasonal",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Scenario::ALL
            .into_iter()
            .find(|sc| sc.as_str() == normalized)
            .ok_or_else(|| CoreError::Parse("scenario".to_string(), s.to_string()))
    }
}
