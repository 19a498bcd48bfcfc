//! Synthetic daily bars for auditing the analytics and the robots.
//!
//! Each scenario replays a stylized agricultural market event so the audit
//! knows what the indicators and strategies should find.

use crate::error::SimulationError;
use chrono::{Datelike, NaiveDate, Weekday};
use configuration::SimulationSettings;
use core_types::{Bar, Scenario};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Size of the contract-switch jump in the rollover scenario, in price points.
pub const ROLLOVER_GAP_POINTS: f64 = 200.0;

/// The seasonal script never lets price fall below this share of its start
/// (2000 on a 2600 corn contract).
const SEASONAL_FLOOR_RATIO: f64 = 2000.0 / 2600.0;

/// Per-day dynamics of one generated bar before OHLC construction.
struct Step {
    trend: f64,
    noise: f64,
    volume_mult: f64,
    shock: bool,
}

/// Seeded generator of scenario bar series.
pub struct ScenarioGenerator {
    settings: SimulationSettings,
    rng: StdRng,
}

impl ScenarioGenerator {
    pub fn new(settings: SimulationSettings, seed: u64) -> Self {
        Self {
            settings,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generates one bar per business day (Monday to Friday) in `from..=to`.
    pub fn generate(
        &mut self,
        scenario: Scenario,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Bar>, SimulationError> {
        if from > to {
            return Err(SimulationError::invalid(
                "to",
                format!("end date {to} is before start date {from}"),
            ));
        }
        if self.settings.start_price <= 0.0 {
            return Err(SimulationError::invalid("start_price", "must be positive"));
        }

        let bars = match scenario {
            Scenario::Seasonal => self.seasonal(from, to),
            _ => self.event_driven(scenario, from, to),
        };
        tracing::debug!(scenario = %scenario, bars = bars.len(), "Scenario generated.");
        Ok(bars)
    }

    /// Bull shock, bear harvest and rollover gap share one dynamic:
    /// `price = price * (1 + trend) + noise` with scenario-specific trend and noise.
    fn event_driven(&mut self, scenario: Scenario, from: NaiveDate, to: NaiveDate) -> Vec<Bar> {
        let mut price = self.settings.start_price;
        let mut trend = 0.0;
        let mut last_gap_year: Option<i32> = None;
        let mut bars = Vec::new();

        for (i, date) in business_days(from, to).enumerate() {
            let day_of_year = date.ordinal();
            let step = match scenario {
                Scenario::BullShock => {
                    // Drought over the growing season: the daily gain itself compounds.
                    if (150..=240).contains(&day_of_year) {
                        trend += 0.005;
                        Step { trend, noise: self.normal(25.0), volume_mult: 2.5, shock: true }
                    } else {
                        trend = (trend - 0.002).max(0.0);
                        Step { trend, noise: self.normal(10.0), volume_mult: 1.0, shock: false }
                    }
                }
                Scenario::BearHarvest => {
                    if (270..=330).contains(&day_of_year) {
                        // Capitulation volume at the very bottom.
                        let volume_mult = if day_of_year > 320 { 3.0 } else { 0.8 };
                        Step {
                            trend: -0.003,
                            noise: self.normal(8.0),
                            volume_mult,
                            shock: false,
                        }
                    } else {
                        Step {
                            trend: 0.0,
                            noise: self.normal(10.0),
                            volume_mult: 1.0,
                            shock: false,
                        }
                    }
                }
                _ => {
                    let mut volume_mult = 1.0;
                    // First business day on or after 15 May switches contracts.
                    let gap_day = NaiveDate::from_ymd_opt(date.year(), 5, 15)
                        .is_some_and(|d| date >= d)
                        && last_gap_year != Some(date.year());
                    if gap_day {
                        price += ROLLOVER_GAP_POINTS;
                        volume_mult = 5.0;
                        last_gap_year = Some(date.year());
                    }
                    Step {
                        trend: (i as f64 / 10.0).sin() * 0.001,
                        noise: self.normal(12.0),
                        volume_mult,
                        shock: false,
                    }
                }
            };

            price = price * (1.0 + step.trend) + step.noise;
            let jitter = 1.0 + self.rng.random::<f64>();
            let volume = self.settings.base_volume * step.volume_mult * jitter;
            let oi_mult = if step.shock { 1.2 } else { 0.9 };
            let open_interest = self.settings.base_open_interest * oi_mult;
            let range_pct = if step.shock { 0.02 } else { 0.01 };
            bars.push(self.build_bar(date, price, range_pct, volume, open_interest));
        }
        bars
    }

    /// The month-driven DCE corn script: quiet winter, planting drift, a July
    /// drought pump, a harvest dump and open interest collapsing around the
    /// May and September rollovers.
    fn seasonal(&mut self, from: NaiveDate, to: NaiveDate) -> Vec<Bar> {
        let floor = self.settings.start_price * SEASONAL_FLOOR_RATIO;
        let mut price = self.settings.start_price;
        let mut bars = Vec::new();

        for date in business_days(from, to) {
            let month = date.month();
            let u = self.rng.random::<f64>();
            let mut noise = (self.rng.random::<f64>() - 0.5) * 15.0;
            let trend = match month {
                1..=3 => (u - 0.45) * 2.0,
                4..=5 => (u - 0.4) * 5.0,
                6..=7 => {
                    noise = (self.rng.random::<f64>() - 0.5) * 40.0;
                    if month == 7 { (u + 0.2) * 10.0 } else { (u - 0.2) * 8.0 }
                }
                8..=9 => (u - 0.8) * 6.0,
                _ => (u - 0.4) * 3.0,
            };
            price = (price + trend + noise).max(floor);

            let rollover = matches!(month, 5 | 9) && (11..=19).contains(&date.day());
            let open_interest = self.settings.base_open_interest * if rollover { 0.1 } else { 1.0 };
            let volume = self.settings.base_volume * (1.0 + self.rng.random::<f64>());
            bars.push(self.build_bar(date, price, 0.01, volume, open_interest));
        }
        bars
    }

    /// Builds OHLC around `close` with a normal open and wicks of half the daily range.
    fn build_bar(
        &mut self,
        date: NaiveDate,
        close: f64,
        range_pct: f64,
        volume: f64,
        open_interest: f64,
    ) -> Bar {
        let half_range = close.abs() * range_pct / 2.0;
        let open = close + self.normal(half_range);
        let high = open.max(close) + self.normal(half_range).abs();
        let low = open.min(close) - self.normal(half_range).abs();
        Bar {
            date,
            open: round2(open),
            high: round2(high),
            low: round2(low),
            close: round2(close),
            volume: volume.floor(),
            open_interest: open_interest.floor(),
        }
    }

    fn normal(&mut self, std_dev: f64) -> f64 {
        let z: f64 = self.rng.sample(StandardNormal);
        z * std_dev
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Every Monday-to-Friday date in `from..=to`.
pub fn business_days(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days()
        .take_while(move |d| *d <= to)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
}
