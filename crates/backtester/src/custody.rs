use crate::account::Account;
use crate::error::BacktestError;
use crate::factory::create_robot;
use crate::Robot;
use analytics::{metrics, AnalyticsEngine, PerformanceReport};
use chrono::NaiveDate;
use configuration::{CustodySettings, RobotSettings};
use core_types::{Bar, RobotId, SeriesPoint};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use uuid::Uuid;

/// Outcome of one robot over the held-out slice.
#[derive(Debug, Clone, Serialize)]
pub struct RobotResult {
    pub id: RobotId,
    pub roi: f64,
    pub max_drawdown: f64,
    pub final_equity: f64,
    pub fills: usize,
    pub commission_paid: f64,
    /// One point per traded bar.
    pub equity: Vec<SeriesPoint>,
    pub report: PerformanceReport,
}

/// Everything a custody run produced.
#[derive(Debug, Clone, Serialize)]
pub struct CustodyReport {
    pub run_id: Uuid,
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub train_size: usize,
    pub test_size: usize,
    pub first_trade_date: NaiveDate,
    pub last_trade_date: NaiveDate,
    /// Return of simply holding the contract over the traded bars.
    pub buy_and_hold_roi: f64,
    pub results: Vec<RobotResult>,
}

impl CustodyReport {
    /// The robot with the highest ROI.
    pub fn best(&self) -> Option<&RobotResult> {
        self.results.iter().max_by(|a, b| a.roi.total_cmp(&b.roi))
    }

    pub fn result(&self, id: RobotId) -> Option<&RobotResult> {
        self.results.iter().find(|r| r.id == id)
    }
}

/// Runs the robots out-of-sample on the bars after the training split.
///
/// Each robot gets its own account with the configured capital. Indicators are
/// fed from the first test bar, and trading starts once the longest warm-up
/// (or `warmup_bars`, if larger) has passed, so all robots trade the same bars.
pub struct CustodyRunner {
    custody: CustodySettings,
    robots: RobotSettings,
    engine: AnalyticsEngine,
    roster: Vec<RobotId>,
}

impl CustodyRunner {
    pub fn new(custody: CustodySettings, robots: RobotSettings, engine: AnalyticsEngine) -> Self {
        Self {
            custody,
            robots,
            engine,
            roster: RobotId::ALL.to_vec(),
        }
    }

    /// Restricts the run to the given robots, in that order.
    pub fn with_robots(mut self, ids: &[RobotId]) -> Self {
        self.roster = ids.to_vec();
        self
    }

    pub fn run(&self, bars: &[Bar]) -> Result<CustodyReport, BacktestError> {
        let capital = self
            .custody
            .initial_capital
            .to_f64()
            .filter(|c| *c > 0.0)
            .ok_or_else(|| invalid("initial_capital must be positive"))?;
        let commission_rate = self
            .custody
            .commission_rate
            .to_f64()
            .filter(|c| *c >= 0.0)
            .ok_or_else(|| invalid("commission_rate must be non-negative"))?;
        let train_ratio = self.custody.train_ratio;
        if !(train_ratio > 0.0 && train_ratio < 1.0) {
            return Err(BacktestError::InvalidParameter(format!(
                "train_ratio {train_ratio} must lie strictly between 0 and 1"
            )));
        }
        if self.roster.is_empty() {
            return Err(invalid("no robots to run"));
        }
        for bar in bars {
            bar.validate()?;
        }

        let split = (bars.len() as f64 * train_ratio) as usize;
        let test = &bars[split..];

        let mut robots = self
            .roster
            .iter()
            .map(|id| create_robot(*id, &self.robots))
            .collect::<Result<Vec<_>, _>>()?;
        let start = robots
            .iter()
            .map(|r| r.warmup())
            .max()
            .unwrap_or(0)
            .max(self.custody.warmup_bars);

        if test.len() <= start {
            return Err(BacktestError::InsufficientData(format!(
                "{} bars leave {} for testing, but trading starts after {} bars of warm-up",
                bars.len(),
                test.len(),
                start
            )));
        }
        let traded = &test[start..];
        let (first, last) = (traded[0], traded[traded.len() - 1]);

        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            train = split,
            test = test.len(),
            warmup = start,
            "Starting custody run."
        );

        let results = robots
            .iter_mut()
            .map(|robot| self.run_robot(robot.as_mut(), test, start, capital, commission_rate))
            .collect::<Result<Vec<_>, _>>()?;

        for r in &results {
            tracing::info!(
                %run_id,
                robot = %r.id,
                roi = r.roi,
                max_drawdown = r.max_drawdown,
                fills = r.fills,
                "Robot finished."
            );
        }

        Ok(CustodyReport {
            run_id,
            initial_capital: capital,
            commission_rate,
            train_size: split,
            test_size: test.len(),
            first_trade_date: first.date,
            last_trade_date: last.date,
            buy_and_hold_roi: metrics::total_return(first.close, last.close),
            results,
        })
    }

    fn run_robot(
        &self,
        robot: &mut dyn Robot,
        test: &[Bar],
        start: usize,
        capital: f64,
        commission_rate: f64,
    ) -> Result<RobotResult, BacktestError> {
        let mut account = Account::new(capital, commission_rate);
        let mut equity = Vec::with_capacity(test.len() - start);

        for (i, bar) in test.iter().enumerate() {
            if i >= start {
                robot.on_bar(bar, &mut account);
                equity.push(SeriesPoint::new(bar.date, account.equity(bar.close)));
            }
            robot.observe(bar);
        }

        let values: Vec<f64> = equity.iter().map(|p| p.value).collect();
        let final_equity = values.last().copied().unwrap_or(capital);
        let report = self.engine.calculate(&equity)?;

        Ok(RobotResult {
            id: robot.id(),
            roi: (final_equity - capital) / capital,
            max_drawdown: metrics::max_drawdown(&values),
            final_equity,
            fills: account.fills,
            commission_paid: account.commission_paid,
            equity,
            report,
        })
    }
}

fn invalid(message: &str) -> BacktestError {
    BacktestError::InvalidParameter(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bars(closes: impl Iterator<Item = f64>) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        closes
            .enumerate()
            .map(|(i, c)| Bar {
                date: start + chrono::Duration::days(i as i64),
                open: c,
                high: c * 1.005,
                low: c * 0.995,
                close: c,
                volume: 1e5,
                open_interest: 5e5,
            })
            .collect()
    }

    fn runner() -> CustodyRunner {
        CustodyRunner::new(
            CustodySettings::default(),
            RobotSettings::default(),
            AnalyticsEngine::default(),
        )
    }

    #[test]
    fn test_equity_has_one_point_per_traded_bar() {
        let data = bars((0..400).map(|i| 3000.0 + 50.0 * (i as f64 / 9.0).sin()));
        let report = runner().run(&data).unwrap();
        assert_eq!(report.train_size, 280);
        assert_eq!(report.test_size, 120);
        assert_eq!(report.results.len(), 3);
        for r in &report.results {
            // Harvester's 60-bar warm-up dominates the 50-bar default.
            assert_eq!(r.equity.len(), 60);
            assert!(r.max_drawdown <= 0.0);
            assert_eq!(r.report.observations, 60);
        }
        assert_eq!(report.first_trade_date, data[340].date);
    }

    #[test]
    fn test_idle_robot_keeps_its_capital() {
        // A flat market never leaves the Bollinger bands.
        let data = bars(std::iter::repeat_n(2500.0, 300));
        let report = runner().with_robots(&[RobotId::Sentinel]).run(&data).unwrap();
        let sentinel = report.result(RobotId::Sentinel).unwrap();
        assert_eq!(sentinel.fills, 0);
        assert_eq!(sentinel.roi, 0.0);
        assert_eq!(sentinel.max_drawdown, 0.0);
        assert_eq!(report.buy_and_hold_roi, 0.0);
    }

    #[test]
    fn test_commission_is_charged_on_every_fill() {
        let data = bars((0..400).map(|i| 3000.0 + 80.0 * (i as f64 / 5.0).sin()));
        let report = runner().run(&data).unwrap();
        let traded: Vec<&RobotResult> = report.results.iter().filter(|r| r.fills > 0).collect();
        assert!(!traded.is_empty());
        for r in traded {
            assert!(r.commission_paid > 0.0);
        }
    }

    #[test]
    fn test_rejects_short_or_misconfigured_runs() {
        let data = bars((0..100).map(|i| 100.0 + i as f64));
        assert!(matches!(runner().run(&data), Err(BacktestError::InsufficientData(_))));

        let custody = CustodySettings {
            initial_capital: dec!(0),
            ..CustodySettings::default()
        };
        let zero_capital =
            CustodyRunner::new(custody, RobotSettings::default(), AnalyticsEngine::default());
        assert!(matches!(
            zero_capital.run(&bars((0..400).map(|i| 100.0 + i as f64))),
            Err(BacktestError::InvalidParameter(_))
        ));
    }
}
