//! # Quantagrify Simulator
//!
//! Synthetic market data for audits and what-if runs:
//!
//! - `ScenarioGenerator` writes stylized bar series (summer drought, harvest
//!   pressure, contract rollover, the seasonal corn script).
//! - `simulate_merton_path` and `numerical_test` drive the jump-diffusion model
//!   fitted by the analytics crate.
//!
//! All randomness flows through a caller-supplied seed or RNG so runs repeat.

pub mod error;
pub mod jump_diffusion;
pub mod scenario;

pub use error::SimulationError;
pub use jump_diffusion::{numerical_test, simulate_merton_path, NumericalTest};
pub use scenario::{business_days, ScenarioGenerator};
