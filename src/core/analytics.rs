//! Provides functions for aggregating holdings into a portfolio snapshot.
use crate::core::currency::CurrencyConverter;
use crate::core::holding::{Holding, compute_holding};
use crate::core::model::{Asset, Currency, Transaction};
use std::cmp::Ordering;
use tracing::debug;

/// The valuation of one asset with a positive holding.
#[derive(Debug, Clone)]
pub struct AssetPosition {
    pub asset: Asset,
    pub holding: Holding,
    /// Quantity times current price, in the asset's own currency.
    pub current_value: f64,
    pub current_value_display: f64,
    pub total_cost_display: f64,
    /// Unrealized profit in the asset's own currency.
    pub profit: f64,
    pub profit_percent: f64,
    pub allocation_percent: f64,
}

/// One line of the allocation breakdown; either an asset or the cash balance.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationItem {
    pub label: String,
    pub name: String,
    pub value_display: f64,
    pub percent: f64,
    pub is_cash: bool,
}

/// Aggregated figures, all expressed in `display_currency`.
#[derive(Debug, Clone)]
pub struct PortfolioSnapshot {
    pub display_currency: Currency,
    pub positions: Vec<AssetPosition>,
    pub total_invested: f64,
    pub total_assets_value: f64,
    pub cash: f64,
    pub cash_display: f64,
    pub total_net_worth: f64,
    pub total_profit: f64,
    pub total_profit_percent: f64,
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        (part / whole) * 100.0
    } else {
        0.0
    }
}

/// Values every asset with a positive holding at its current price and
/// combines the result with the cash balance. Assets without a position are
/// left out of the snapshot entirely.
pub fn compute_snapshot(
    assets: &[Asset],
    transactions: &[Transaction],
    cash: f64,
    converter: &CurrencyConverter,
) -> PortfolioSnapshot {
    let mut positions = Vec::new();
    let mut total_invested = 0.0;
    let mut total_value = 0.0;

    for asset in assets {
        let holding = compute_holding(&asset.id, transactions);
        if holding.quantity <= 0.0 {
            debug!("Skipping {} without position", asset.symbol);
            continue;
        }

        let current_value = holding.quantity * asset.current_price;
        let current_value_display = converter.convert_to_display(current_value, asset.currency);
        let total_cost_display = converter.convert_to_display(holding.total_cost, asset.currency);

        total_invested += total_cost_display;
        total_value += current_value_display;

        let profit = current_value - holding.total_cost;
        positions.push(AssetPosition {
            asset: asset.clone(),
            holding,
            current_value,
            current_value_display,
            total_cost_display,
            profit,
            profit_percent: percent_of(profit, holding.total_cost),
            allocation_percent: 0.0,
        });
    }

    let cash_display = converter.convert_to_display(cash, Currency::BASE);
    let total_net_worth = total_value + cash_display;
    let total_profit = total_value - total_invested;

    for position in &mut positions {
        position.allocation_percent = percent_of(position.current_value_display, total_net_worth);
    }

    PortfolioSnapshot {
        display_currency: converter.display,
        positions,
        total_invested,
        total_assets_value: total_value,
        cash,
        cash_display,
        total_net_worth,
        total_profit,
        total_profit_percent: percent_of(total_profit, total_invested),
    }
}

impl PortfolioSnapshot {
    pub fn cash_allocation_percent(&self) -> f64 {
        percent_of(self.cash_display, self.total_net_worth)
    }

    /// Assets plus the cash balance (when positive), largest first.
    pub fn allocation(&self) -> Vec<AllocationItem> {
        let mut items: Vec<AllocationItem> = self
            .positions
            .iter()
            .map(|p| AllocationItem {
                label: p.asset.symbol.clone(),
                name: p.asset.name.clone(),
                value_display: p.current_value_display,
                percent: p.allocation_percent,
                is_cash: false,
            })
            .collect();

        if self.cash > 0.0 {
            items.push(AllocationItem {
                label: "CASH".to_string(),
                name: "Available balance".to_string(),
                value_display: self.cash_display,
                percent: self.cash_allocation_percent(),
                is_cash: true,
            });
        }

        items.sort_by(|a, b| {
            b.value_display
                .partial_cmp(&a.value_display)
                .unwrap_or(Ordering::Equal)
        });
        items
    }

    /// The `n` largest positions by display value, cash excluded.
    pub fn top_positions(&self, n: usize) -> Vec<&AssetPosition> {
        let mut sorted: Vec<&AssetPosition> = self.positions.iter().collect();
        sorted.sort_by(|a, b| {
            b.current_value_display
                .partial_cmp(&a.current_value_display)
                .unwrap_or(Ordering::Equal)
        });
        sorted.truncate(n);
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::TransactionKind;
    use chrono::{NaiveDate, Utc};

    fn asset(id: &str, currency: Currency, price: f64) -> Asset {
        Asset {
            id: id.to_string(),
            symbol: id.to_uppercase(),
            name: format!("Asset {id}"),
            category: "Stock".to_string(),
            currency,
            current_price: price,
            created_at: Utc::now(),
        }
    }

    fn buy(asset_id: &str, qty: f64, total: f64) -> Transaction {
        Transaction {
            id: format!("{asset_id}-{qty}-{total}"),
            asset_id: asset_id.to_string(),
            kind: TransactionKind::Buy,
            quantity: qty,
            price: total / qty,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            total,
        }
    }

    #[test]
    fn test_single_asset_in_base_currency() {
        let assets = vec![asset("petr4", Currency::Brl, 40.0)];
        let txs = vec![buy("petr4", 10.0, 300.0)];
        let snap = compute_snapshot(&assets, &txs, 0.0, &CurrencyConverter::default());

        assert_eq!(snap.positions.len(), 1);
        assert_eq!(snap.total_invested, 300.0);
        assert_eq!(snap.total_assets_value, 400.0);
        assert_eq!(snap.total_net_worth, 400.0);
        assert_eq!(snap.total_profit, 100.0);
        assert!((snap.total_profit_percent - 33.333333).abs() < 1e-5);
        assert_eq!(snap.positions[0].allocation_percent, 100.0);
    }

    #[test]
    fn test_alternate_currency_asset_is_converted() {
        let assets = vec![asset("voo", Currency::Usd, 100.0)];
        let txs = vec![buy("voo", 1.0, 80.0)];
        let converter = CurrencyConverter::new(5.0, Currency::Brl);
        let snap = compute_snapshot(&assets, &txs, 0.0, &converter);

        let p = &snap.positions[0];
        assert_eq!(p.current_value, 100.0);
        assert_eq!(p.current_value_display, 500.0);
        assert_eq!(p.total_cost_display, 400.0);
        // Profit stays in the native currency
        assert_eq!(p.profit, 20.0);
        assert_eq!(p.profit_percent, 25.0);
        assert_eq!(snap.total_profit, 100.0);
    }

    #[test]
    fn test_cash_counts_towards_net_worth_and_allocation() {
        let assets = vec![asset("voo", Currency::Usd, 100.0)];
        let txs = vec![buy("voo", 2.0, 200.0)];
        let converter = CurrencyConverter::new(5.0, Currency::Usd);
        let snap = compute_snapshot(&assets, &txs, 1000.0, &converter);

        assert_eq!(snap.cash_display, 200.0);
        assert_eq!(snap.total_net_worth, 400.0);
        assert_eq!(snap.positions[0].allocation_percent, 50.0);
        assert_eq!(snap.cash_allocation_percent(), 50.0);

        let allocation = snap.allocation();
        assert_eq!(allocation.len(), 2);
        let total: f64 = allocation.iter().map(|i| i.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert!(allocation.iter().any(|i| i.is_cash));
    }

    #[test]
    fn test_assets_without_position_are_excluded() {
        let assets = vec![
            asset("a", Currency::Brl, 10.0),
            asset("b", Currency::Brl, 10.0),
        ];
        let mut sell = buy("b", 5.0, 50.0);
        sell.kind = TransactionKind::Sell;
        sell.id = "sell".to_string();
        let txs = vec![buy("a", 1.0, 10.0), buy("b", 5.0, 50.0), sell];
        let snap = compute_snapshot(&assets, &txs, 0.0, &CurrencyConverter::default());

        assert_eq!(snap.positions.len(), 1);
        assert_eq!(snap.positions[0].asset.id, "a");
    }

    #[test]
    fn test_empty_portfolio_has_zero_percentages() {
        let snap = compute_snapshot(&[], &[], 0.0, &CurrencyConverter::default());
        assert_eq!(snap.total_net_worth, 0.0);
        assert_eq!(snap.total_profit_percent, 0.0);
        assert_eq!(snap.cash_allocation_percent(), 0.0);
        assert!(snap.allocation().is_empty());
    }

    #[test]
    fn test_allocation_and_top_positions_are_sorted() {
        let assets = vec![
            asset("small", Currency::Brl, 1.0),
            asset("big", Currency::Brl, 100.0),
            asset("mid", Currency::Brl, 10.0),
            asset("tiny", Currency::Brl, 0.5),
        ];
        let txs = vec![
            buy("small", 1.0, 1.0),
            buy("big", 1.0, 100.0),
            buy("mid", 1.0, 10.0),
            buy("tiny", 1.0, 0.5),
        ];
        let snap = compute_snapshot(&assets, &txs, 50.0, &CurrencyConverter::default());

        let labels: Vec<String> = snap.allocation().into_iter().map(|i| i.label).collect();
        assert_eq!(labels, vec!["BIG", "CASH", "MID", "SMALL", "TINY"]);

        let top: Vec<&str> = snap
            .top_positions(3)
            .into_iter()
            .map(|p| p.asset.id.as_str())
            .collect();
        assert_eq!(top, vec!["big", "mid", "small"]);
    }
}
