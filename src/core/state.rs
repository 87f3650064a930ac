//! The in-memory portfolio state and the operations that mutate it.

use crate::core::analytics::{PortfolioSnapshot, compute_snapshot};
use crate::core::currency::{CurrencyConverter, DEFAULT_USD_RATE};
use crate::core::holding::{Holding, compute_holding};
use crate::core::model::{Asset, Currency, Transaction, TransactionKind, new_id, number_or_zero};
use crate::core::realized::{RealizedProfit, compute_realized_profits};
use anyhow::{Result, bail};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

// Missing or `null` rates load as NaN until `normalized` supplies the
// configured default.
fn rate_or_unset<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn unset_rate() -> f64 {
    f64::NAN
}

/// Everything that is persisted for the portfolio tracker. The serialized
/// shape is shared by the local store and the remote endpoint. A freshly
/// deserialized state must go through [`PortfolioState::normalized`] before
/// use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioState {
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub cash: f64,
    #[serde(default = "unset_rate", deserialize_with = "rate_or_unset")]
    pub usd_rate: f64,
    #[serde(default)]
    pub display_currency: Currency,
}

impl Default for PortfolioState {
    fn default() -> Self {
        Self::with_rate(DEFAULT_USD_RATE)
    }
}

impl PortfolioState {
    pub fn with_rate(usd_rate: f64) -> Self {
        Self {
            assets: Vec::new(),
            transactions: Vec::new(),
            cash: 0.0,
            usd_rate,
            display_currency: Currency::BASE,
        }
    }

    /// Replaces values that loaded as missing or unusable with defaults.
    pub fn normalized(mut self, default_rate: f64) -> Self {
        if !(self.usd_rate.is_finite() && self.usd_rate > 0.0) {
            debug!("Replacing usd rate {} with default {}", self.usd_rate, default_rate);
            self.usd_rate = default_rate;
        }
        if !self.cash.is_finite() {
            self.cash = 0.0;
        }
        self
    }

    pub fn converter(&self) -> CurrencyConverter {
        CurrencyConverter::new(self.usd_rate, self.display_currency)
    }

    pub fn holding(&self, asset_id: &str) -> Holding {
        compute_holding(asset_id, &self.transactions)
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        compute_snapshot(&self.assets, &self.transactions, self.cash, &self.converter())
    }

    pub fn realized_profits(&self) -> HashMap<String, RealizedProfit> {
        compute_realized_profits(&self.transactions)
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Looks an asset up by id first, then by symbol ignoring case.
    pub fn find_asset(&self, key: &str) -> Option<&Asset> {
        let key = key.trim();
        self.asset(key)
            .or_else(|| self.assets.iter().find(|a| a.symbol.eq_ignore_ascii_case(key)))
    }

    pub fn add_asset(
        &mut self,
        symbol: &str,
        name: &str,
        category: &str,
        currency: Currency,
        current_price: f64,
    ) -> Result<&Asset> {
        if symbol.trim().is_empty() {
            bail!("Asset symbol must not be empty");
        }
        if !(current_price.is_finite() && current_price >= 0.0) {
            bail!("Invalid price: {current_price}");
        }

        let asset = Asset {
            id: new_id(),
            symbol: symbol.trim().to_uppercase(),
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            currency,
            current_price,
            created_at: Utc::now(),
        };
        info!("Adding asset {} ({})", asset.symbol, asset.id);
        self.assets.push(asset);
        Ok(&self.assets[self.assets.len() - 1])
    }

    /// Records a buy or sell at `price` per unit. A sell larger than the
    /// current holding is rejected and leaves the state untouched.
    pub fn add_transaction(
        &mut self,
        asset_id: &str,
        kind: TransactionKind,
        quantity: f64,
        price: f64,
        date: NaiveDate,
    ) -> Result<&Transaction> {
        if self.asset(asset_id).is_none() {
            bail!("Unknown asset: {asset_id}");
        }
        if !(quantity.is_finite() && quantity > 0.0) {
            bail!("Quantity must be positive, got {quantity}");
        }
        if !(price.is_finite() && price >= 0.0) {
            bail!("Invalid unit price: {price}");
        }

        if kind == TransactionKind::Sell {
            let holding = self.holding(asset_id);
            if holding.quantity < quantity {
                bail!(
                    "You only hold {} of this asset. Cannot sell {}.",
                    holding.quantity,
                    quantity
                );
            }
        }

        let transaction = Transaction {
            id: new_id(),
            asset_id: asset_id.to_string(),
            kind,
            quantity,
            price,
            date,
            total: quantity * price,
        };
        info!(
            "Recording {} of {} units of {} on {}",
            kind, quantity, asset_id, date
        );
        self.transactions.push(transaction);
        Ok(&self.transactions[self.transactions.len() - 1])
    }

    pub fn delete_transaction(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        before != self.transactions.len()
    }

    pub fn update_price(&mut self, asset_id: &str, price: f64) -> Result<()> {
        if !(price.is_finite() && price >= 0.0) {
            bail!("Invalid price: {price}");
        }
        match self.assets.iter_mut().find(|a| a.id == asset_id) {
            Some(asset) => {
                debug!("Updating price of {} to {}", asset.symbol, price);
                asset.current_price = price;
                Ok(())
            }
            None => bail!("Unknown asset: {asset_id}"),
        }
    }

    pub fn set_cash(&mut self, amount: f64) -> Result<()> {
        if !amount.is_finite() {
            bail!("Invalid cash balance: {amount}");
        }
        self.cash = amount;
        Ok(())
    }

    pub fn set_display_currency(&mut self, currency: Currency) {
        self.display_currency = currency;
    }

    pub fn set_usd_rate(&mut self, rate: f64) -> Result<()> {
        if !(rate.is_finite() && rate > 0.0) {
            bail!("Exchange rate must be positive, got {rate}");
        }
        self.usd_rate = rate;
        Ok(())
    }

    /// Replaces the asset with the same id, or appends it.
    pub fn upsert_asset(&mut self, asset: Asset) {
        match self.assets.iter_mut().find(|a| a.id == asset.id) {
            Some(existing) => *existing = asset,
            None => self.assets.push(asset),
        }
    }

    /// Replaces the transaction with the same id, or appends it.
    pub fn upsert_transaction(&mut self, transaction: Transaction) {
        match self.transactions.iter_mut().find(|t| t.id == transaction.id) {
            Some(existing) => *existing = transaction,
            None => self.transactions.push(transaction),
        }
    }

    /// Transactions newest first, as they are listed and exported.
    pub fn transactions_by_date_desc(&self) -> Vec<&Transaction> {
        let mut sorted: Vec<&Transaction> = self.transactions.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }
}
