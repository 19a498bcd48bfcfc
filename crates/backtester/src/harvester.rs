use crate::account::Account;
use crate::error::BacktestError;
use crate::Robot;
use configuration::HarvesterParams;
use core_types::{Bar, RobotId};
use ta::indicators::{SimpleMovingAverage as Sma, StandardDeviation};
use ta::Next;

/// Realized volatility used when the lookback window is perfectly flat.
const MIN_REALIZED_VOL: f64 = 0.01;

/// Harvester: volatility-targeted trend following.
///
/// Direction is the sign of the close against the SMA of the previous
/// `lookback` closes. Exposure is `target_volatility / realized_volatility`
/// times equity, capped at `max_leverage`. The position is only rebalanced when
/// the change is worth more than `rebalance_buffer` of equity.
pub struct Harvester {
    params: HarvesterParams,
    sma: Sma,
    return_std: StandardDeviation,
    trend_level: f64,
    realized_std: f64,
    prev_close: Option<f64>,
    seen: usize,
}

impl Harvester {
    pub fn new(params: HarvesterParams) -> Result<Self, BacktestError> {
        if params.lookback < 3 {
            return Err(BacktestError::InvalidParameter(
                "Harvester lookback must be at least 3".to_string(),
            ));
        }
        if !(params.target_volatility > 0.0
            && params.max_leverage > 0.0
            && params.annualization_periods > 0.0)
        {
            return Err(BacktestError::InvalidParameter(
                "Harvester volatility target, leverage cap and annualization must be positive"
                    .to_string(),
            ));
        }
        let sma = Sma::new(params.lookback).map_err(|e| {
            BacktestError::InvalidParameter(format!("Failed to initialize SMA: {:?}", e))
        })?;
        // `lookback` closes hold `lookback - 1` returns.
        let return_std = StandardDeviation::new(params.lookback - 1).map_err(|e| {
            BacktestError::InvalidParameter(format!("Failed to initialize StdDev: {:?}", e))
        })?;
        Ok(Self {
            sma,
            return_std,
            params,
            trend_level: 0.0,
            realized_std: 0.0,
            prev_close: None,
            seen: 0,
        })
    }

    /// Annualized volatility of the returns in the lookback window.
    fn realized_volatility(&self) -> f64 {
        let vol = self.realized_std * self.params.annualization_periods.sqrt();
        if vol > f64::EPSILON { vol } else { MIN_REALIZED_VOL }
    }

    /// Leverage the position should carry.
    fn leverage(&self) -> f64 {
        (self.params.target_volatility / self.realized_volatility()).min(self.params.max_leverage)
    }
}

impl Robot for Harvester {
    fn id(&self) -> RobotId {
        RobotId::Harvester
    }

    fn warmup(&self) -> usize {
        self.params.lookback
    }

    fn on_bar(&mut self, bar: &Bar, account: &mut Account) {
        if self.seen < self.params.lookback {
            return;
        }
        let price = bar.close;
        let direction = if price > self.trend_level { 1.0 } else { -1.0 };
        let equity = account.equity(price);
        let target = equity * self.leverage() * direction / price;

        if (target - account.position).abs() > equity * self.params.rebalance_buffer / price {
            tracing::debug!(
                date = %bar.date,
                price,
                from = account.position,
                to = target,
                "Harvester rebalances."
            );
            account.rebalance_to(target, price);
        }
    }

    fn observe(&mut self, bar: &Bar) {
        self.trend_level = self.sma.next(bar.close);
        if let Some(prev) = self.prev_close
            && prev != 0.0
        {
            self.realized_std = self.return_std.next((bar.close - prev) / prev);
        }
        self.prev_close = Some(bar.close);
        self.seen += 1;
    }
}
