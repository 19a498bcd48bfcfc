use serde::Serialize;

/// Cash and a single signed position in one contract.
///
/// A negative position is a short. Every fill pays `commission_rate` on its
/// traded notional, whichever side it is on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub cash: f64,
    pub position: f64,
    pub commission_rate: f64,
    pub commission_paid: f64,
    pub fills: usize,
}

impl Account {
    pub fn new(capital: f64, commission_rate: f64) -> Self {
        Self {
            cash: capital,
            position: 0.0,
            commission_rate,
            commission_paid: 0.0,
            fills: 0,
        }
    }

    /// Mark-to-market value at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.position * price
    }

    pub fn is_flat(&self) -> bool {
        self.position == 0.0
    }

    /// Buys `quantity` contracts. Non-positive quantities are ignored.
    pub fn buy(&mut self, quantity: f64, price: f64) {
        if quantity <= 0.0 {
            return;
        }
        let notional = quantity * price;
        let fee = notional * self.commission_rate;
        self.cash -= notional + fee;
        self.position += quantity;
        self.record_fill(fee);
    }

    /// Sells `quantity` contracts, going short when selling more than is held.
    pub fn sell(&mut self, quantity: f64, price: f64) {
        if quantity <= 0.0 {
            return;
        }
        let notional = quantity * price;
        let fee = notional * self.commission_rate;
        self.cash += notional - fee;
        self.position -= quantity;
        self.record_fill(fee);
    }

    /// Closes the whole position, long or short.
    pub fn liquidate(&mut self, price: f64) {
        let held = self.position;
        if held > 0.0 {
            self.sell(held, price);
        } else if held < 0.0 {
            self.buy(-held, price);
        }
        // Guards against a float residue after the closing fill.
        self.position = 0.0;
    }

    /// Trades towards `target` contracts.
    pub fn rebalance_to(&mut self, target: f64, price: f64) {
        let diff = target - self.position;
        if diff > 0.0 {
            self.buy(diff, price);
        } else {
            self.sell(-diff, price);
        }
    }

    fn record_fill(&mut self, fee: f64) {
        self.commission_paid += fee;
        self.fills += 1;
    }
}
