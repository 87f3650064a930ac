//! Weighted-average cost holdings.

use crate::core::model::{Transaction, TransactionKind};

/// Quantities below this are floating-point dust and are snapped to zero.
pub const DUST_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Holding {
    pub quantity: f64,
    pub avg_price: f64,
    pub total_cost: f64,
}

/// Running quantity and cost for one asset. Shared by the holding and the
/// realized-profit passes so both apply the same average-cost rule.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct CostState {
    pub quantity: f64,
    pub total_cost: f64,
}

impl CostState {
    pub fn avg_price(&self) -> f64 {
        if self.quantity > 0.0 {
            self.total_cost / self.quantity
        } else {
            0.0
        }
    }

    pub fn buy(&mut self, quantity: f64, total: f64) {
        self.quantity += quantity;
        self.total_cost += total;
    }

    /// Removes `quantity` at the current average cost and returns the cost
    /// basis that left the position.
    pub fn sell(&mut self, quantity: f64) -> f64 {
        let cost_basis = quantity * self.avg_price();
        self.total_cost -= cost_basis;
        self.quantity -= quantity;
        cost_basis
    }

    pub fn snap_dust(&mut self) {
        if self.quantity < DUST_EPSILON {
            self.quantity = 0.0;
            self.total_cost = 0.0;
        }
    }
}

/// Replays the transactions of `asset_id` in the order given and returns the
/// resulting position. A sell against an empty position changes nothing.
pub fn compute_holding(asset_id: &str, transactions: &[Transaction]) -> Holding {
    let mut state = CostState::default();

    for t in transactions.iter().filter(|t| t.asset_id == asset_id) {
        match t.kind {
            TransactionKind::Buy => state.buy(t.quantity, t.total),
            TransactionKind::Sell => {
                if state.quantity > 0.0 {
                    state.sell(t.quantity);
                }
            }
        }
    }

    state.snap_dust();

    Holding {
        quantity: state.quantity,
        avg_price: state.avg_price(),
        total_cost: state.total_cost,
    }
}
