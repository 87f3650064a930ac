//! Realized profit of each sale against the average cost at the time of sale.

use crate::core::holding::CostState;
use crate::core::model::{Transaction, TransactionKind};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RealizedProfit {
    pub profit: f64,
    pub profit_percent: f64,
}

/// Walks all transactions in ascending date order (stable for same-day
/// entries) keeping an independent running cost per asset, and records the
/// profit of every sell keyed by transaction id. Buys have no entry.
pub fn compute_realized_profits(transactions: &[Transaction]) -> HashMap<String, RealizedProfit> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|t| t.date);

    let mut positions: HashMap<&str, CostState> = HashMap::new();
    let mut results = HashMap::new();

    for t in sorted {
        let state = positions.entry(t.asset_id.as_str()).or_default();
        match t.kind {
            TransactionKind::Buy => state.buy(t.quantity, t.total),
            TransactionKind::Sell => {
                let cost_basis = state.sell(t.quantity);
                let profit = t.total - cost_basis;
                let profit_percent = if cost_basis > 0.0 {
                    (profit / cost_basis) * 100.0
                } else {
                    0.0
                };
                results.insert(
                    t.id.clone(),
                    RealizedProfit {
                        profit,
                        profit_percent,
                    },
                );
                state.snap_dust();
            }
        }
    }

    results
}
