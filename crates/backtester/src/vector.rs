use crate::account::Account;
use crate::error::BacktestError;
use crate::Robot;
use configuration::VectorParams;
use core_types::{Bar, RobotId};
use ta::indicators::{Maximum, Minimum};
use ta::Next;

/// Vector: Dual Thrust breakout that flips between long and short.
///
/// The range is the highest high minus the lowest low of the previous
/// `lookback` bars. Closing above `prev_close + k1 * range` goes long with
/// `capital_fraction` of equity (covering any short); closing below
/// `prev_close - k2 * range` goes short the same way.
pub struct Vector {
    params: VectorParams,
    highest: Maximum,
    lowest: Minimum,
    range_high: f64,
    range_low: f64,
    prev_close: f64,
    seen: usize,
}

impl Vector {
    pub fn new(params: VectorParams) -> Result<Self, BacktestError> {
        if params.k1 <= 0.0 || params.k2 <= 0.0 {
            return Err(BacktestError::InvalidParameter(
                "Vector k1 and k2 must be positive".to_string(),
            ));
        }
        if !(params.capital_fraction > 0.0 && params.capital_fraction <= 1.0) {
            return Err(BacktestError::InvalidParameter(
                "Vector capital_fraction must lie in (0, 1]".to_string(),
            ));
        }
        let highest = Maximum::new(params.lookback).map_err(|e| {
            BacktestError::InvalidParameter(format!("Failed to initialize Maximum: {:?}", e))
        })?;
        let lowest = Minimum::new(params.lookback).map_err(|e| {
            BacktestError::InvalidParameter(format!("Failed to initialize Minimum: {:?}", e))
        })?;
        Ok(Self {
            params,
            highest,
            lowest,
            range_high: 0.0,
            range_low: 0.0,
            prev_close: 0.0,
            seen: 0,
        })
    }

    /// Buy and sell trigger lines for the next bar.
    fn thrust_lines(&self) -> (f64, f64) {
        let range = self.range_high - self.range_low;
        (
            self.prev_close + self.params.k1 * range,
            self.prev_close - self.params.k2 * range,
        )
    }
}

impl Robot for Vector {
    fn id(&self) -> RobotId {
        RobotId::Vector
    }

    fn warmup(&self) -> usize {
        self.params.lookback
    }

    fn on_bar(&mut self, bar: &Bar, account: &mut Account) {
        if self.seen < self.params.lookback {
            return;
        }
        let (buy_line, sell_line) = self.thrust_lines();
        let price = bar.close;
        let stake = account.equity(price) * self.params.capital_fraction / price;

        if price > buy_line && account.position <= 0.0 {
            let cover = (-account.position).max(0.0);
            tracing::debug!(date = %bar.date, price, buy_line, "Vector breaks out long.");
            account.buy(stake + cover, price);
        } else if price < sell_line && account.position >= 0.0 {
            let close_long = account.position.max(0.0);
            tracing::debug!(date = %bar.date, price, sell_line, "Vector breaks out short.");
            account.sell(stake + close_long, price);
        }
    }

    fn observe(&mut self, bar: &Bar) {
        self.range_high = self.highest.next(bar.high);
        self.range_low = self.lowest.next(bar.low);
        self.prev_close = bar.close;
        self.seen += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(i: i64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap() + chrono::Duration::days(i),
            open: close,
            high,
            low,
            close,
            volume: 1.0,
            open_interest: 1.0,
        }
    }

    fn warmed_up() -> Vector {
        let mut robot = Vector::new(VectorParams {
            lookback: 2,
            k1: 0.5,
            k2: 0.5,
            capital_fraction: 0.9,
        })
        .unwrap();
        robot.observe(&bar(0, 102.0, 98.0, 100.0));
        robot.observe(&bar(1, 101.0, 99.0, 100.0));
        robot
    }

    #[test]
    fn test_thrust_lines_use_prior_range() {
        let robot = warmed_up();
        // Range 102 - 98 = 4 around a prior close of 100.
        assert_eq!(robot.thrust_lines(), (102.0, 98.0));
    }

    #[test]
    fn test_breakout_goes_long_then_flips_short() {
        let mut robot = warmed_up();
        let mut account = Account::new(1_000.0, 0.0);

        let up = bar(2, 105.0, 100.0, 104.0);
        robot.on_bar(&up, &mut account);
        assert!((account.position - 900.0 / 104.0).abs() < 1e-9);
        robot.observe(&up);

        // Range is now 105 - 99 = 6 around 104: sell line at 101.
        let down = bar(3, 104.0, 90.0, 95.0);
        let long = account.position;
        let equity = account.equity(95.0);
        robot.on_bar(&down, &mut account);
        let expected_short = equity * 0.9 / 95.0;
        assert!((account.position + expected_short).abs() < 1e-9);
        assert!(account.position < 0.0 && long > 0.0);
        assert_eq!(account.fills, 2);
    }

    #[test]
    fn test_quiet_bar_does_nothing() {
        let mut robot = warmed_up();
        let mut account = Account::new(1_000.0, 0.0);
        robot.on_bar(&bar(2, 101.0, 99.0, 100.5), &mut account);
        assert!(account.is_flat());
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let bad = VectorParams {
            lookback: 0,
            k1: 0.7,
            k2: 0.7,
            capital_fraction: 0.9,
        };
        assert!(Vector::new(bad.clone()).is_err());
        assert!(Vector::new(VectorParams { lookback: 4, k1: 0.0, ..bad }).is_err());
    }
}
