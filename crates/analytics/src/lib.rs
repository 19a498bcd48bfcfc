//! # Quantagrify Analytics
//!
//! The numerical core: return statistics, risk metrics, volatility measures,
//! technical indicators and the jump-diffusion fit used for agricultural futures.
//!
//! ## Architectural Principles
//!
//! - **Pure logic:** no I/O. Inputs are `core-types` bars and series, outputs are
//!   plain numbers or serializable reports.
//! - **Stateless calculation:** the `AnalyticsEngine` only holds its settings. It
//!   takes a value series and produces a `PerformanceReport`.
//! - **Aligned outputs:** every per-bar indicator returns one value per input bar,
//!   so callers can zip results back onto their dates.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: performance reports, risk profiles and indicator sets.
//! - `stats`, `metrics`, `volatility`, `indicators`, `jump_diffusion`: the free functions
//!   the engine is built from, usable on their own.
//! - `AnalyticsError`: the error type returned from this crate.

pub mod engine;
pub mod error;
pub mod indicators;
pub mod jump_diffusion;
pub mod metrics;
pub mod report;
pub mod stats;
pub mod volatility;

pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use indicators::{BollingerBand, Gap};
pub use jump_diffusion::{fit_merton, JumpDiffusionParams};
pub use report::{IndicatorSet, PerformanceReport, RiskProfile};
