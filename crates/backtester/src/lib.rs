//! # Quantagrify Custody Backtester
//!
//! Runs the three pipeline robots out-of-sample on the bars held back from
//! training and scores them with the analytics engine.
//!
//! ## Architectural Principles
//!
//! - **Robot agnostic runner:** the `CustodyRunner` drives any `Robot` through the
//!   same bar loop, so adding a robot means a new module, a `RobotId` variant and
//!   a `factory` arm.
//! - **No look-ahead:** a robot decides on a bar with indicators built from the
//!   bars before it; the bar is fed to its indicators only afterwards.
//! - **Pure computation:** no I/O, every run is independent.
//!
//! ## Public API
//!
//! - `Robot`: the trait all robots implement.
//! - `Sentinel`, `Vector`, `Harvester`: the concrete robots.
//! - `create_robot`: the factory function.
//! - `CustodyRunner`, `CustodyReport`, `RobotResult`: the out-of-sample run.
//! - `Account`: cash and position bookkeeping with commission.

pub mod account;
pub mod custody;
pub mod error;
pub mod factory;
pub mod harvester;
pub mod sentinel;
pub mod vector;

pub use account::Account;
pub use custody::{CustodyReport, CustodyRunner, RobotResult};
pub use error::BacktestError;
pub use factory::create_robot;
pub use harvester::Harvester;
pub use sentinel::Sentinel;
pub use vector::Vector;

use core_types::{Bar, RobotId};

/// The core trait that all custody robots implement.
///
/// Robots keep their own indicator state, hence `&mut self`. The `Send` bound
/// lets runs move across threads in the CLI and the web server.
pub trait Robot: Send {
    fn id(&self) -> RobotId;

    /// Bars that must be observed before the robot can decide anything.
    fn warmup(&self) -> usize;

    /// Trades the current bar's close using only previously observed bars.
    fn on_bar(&mut self, bar: &Bar, account: &mut Account);

    /// Feeds a finished bar into the robot's indicators.
    fn observe(&mut self, bar: &Bar);
}
