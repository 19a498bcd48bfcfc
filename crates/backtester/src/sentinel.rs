use crate::account::Account;
use crate::error::BacktestError;
use crate::Robot;
use configuration::SentinelParams;
use core_types::{Bar, RobotId};
use ta::indicators::{BollingerBands, BollingerBandsOutput};
use ta::Next;

/// Sentinel: Bollinger band mean reversion, long only.
///
/// Bands are built from the closes before the current bar. A close below the
/// lower band buys `position_fraction` of equity when flat; a close above the
/// upper band sells everything.
pub struct Sentinel {
    params: SentinelParams,
    bands: BollingerBands,
    last: Option<BollingerBandsOutput>,
    seen: usize,
}

impl Sentinel {
    pub fn new(params: SentinelParams) -> Result<Self, BacktestError> {
        if !(params.position_fraction > 0.0 && params.position_fraction <= 1.0) {
            return Err(BacktestError::InvalidParameter(
                "Sentinel position_fraction must lie in (0, 1]".to_string(),
            ));
        }
        let bands = BollingerBands::new(params.bb_period, params.bb_std_dev).map_err(|e| {
            let message = format!("Failed to initialize Bollinger Bands: {:?}", e);
            BacktestError::InvalidParameter(message)
        })?;
        Ok(Self {
            params,
            bands,
            last: None,
            seen: 0,
        })
    }
}

impl Robot for Sentinel {
    fn id(&self) -> RobotId {
        RobotId::Sentinel
    }

    fn warmup(&self) -> usize {
        self.params.bb_period
    }

    fn on_bar(&mut self, bar: &Bar, account: &mut Account) {
        if self.seen < self.params.bb_period {
            return;
        }
        let Some(BollingerBandsOutput { lower, upper, .. }) = self.last.as_ref() else {
            return;
        };
        let (lower, upper) = (*lower, *upper);
        let price = bar.close;
        if price < lower && account.is_flat() {
            let quantity = account.equity(price) * self.params.position_fraction / price;
            tracing::debug!(date = %bar.date, price, lower, "Sentinel buys the dip.");
            account.buy(quantity, price);
        } else if price > upper && account.position > 0.0 {
            tracing::debug!(date = %bar.date, price, upper, "Sentinel takes profit.");
            account.liquidate(price);
        }
    }

    fn observe(&mut self, bar: &Bar) {
        self.last = Some(self.bands.next(bar.close));
        self.seen += 1;
    }
}
