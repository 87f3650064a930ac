//! Liquidity-pair investments and the withdrawals taken out of them.

use crate::core::model::{new_id, parse_date};
use crate::core::number::parse_locale_number;
use crate::core::spreadsheet::{read_table, write_delimited};
use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt::Display;
use tracing::{debug, info};

pub const PAIRS_FILE_NAME: &str = "defi_pares.csv";
pub const WITHDRAWALS_FILE_NAME: &str = "defi_saques.csv";

pub const PAIR_HEADERS: [&str; 4] = ["ID", "Par", "Investido", "Data"];
pub const WITHDRAWAL_HEADERS: [&str; 4] = ["ID", "Data", "Valor", "Notas"];

// Older data used numeric timestamps as ids.
fn id_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {other}"))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefiTotals {
    pub invested: f64,
    pub withdrawn: f64,
    pub net_profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefiImportKind {
    Pairs,
    Withdrawals,
}

impl Display for DefiImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefiImportKind::Pairs => write!(f, "pairs"),
            DefiImportKind::Withdrawals => write!(f, "withdrawals"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefiState {
    #[serde(default)]
    pub pairs: Vec<Pair>,
    #[serde(default)]
    pub withdrawals: Vec<Withdrawal>,
}

impl DefiState {
    pub fn add_pair(&mut self, name: &str, amount: f64, date: NaiveDate) -> Result<&Pair> {
        if name.trim().is_empty() {
            bail!("Pair name must not be empty");
        }
        if !amount.is_finite() {
            bail!("Invalid amount: {amount}");
        }
        self.pairs.push(Pair {
            id: new_id(),
            name: name.trim().to_string(),
            amount,
            date,
        });
        Ok(&self.pairs[self.pairs.len() - 1])
    }

    pub fn add_withdrawal(
        &mut self,
        amount: f64,
        date: NaiveDate,
        notes: Option<String>,
    ) -> Result<&Withdrawal> {
        if !amount.is_finite() {
            bail!("Invalid amount: {amount}");
        }
        self.withdrawals.push(Withdrawal {
            id: new_id(),
            date,
            amount,
            notes: notes.filter(|n| !n.trim().is_empty()),
        });
        Ok(&self.withdrawals[self.withdrawals.len() - 1])
    }

    pub fn delete_pair(&mut self, id: &str) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|p| p.id != id);
        before != self.pairs.len()
    }

    pub fn delete_withdrawal(&mut self, id: &str) -> bool {
        let before = self.withdrawals.len();
        self.withdrawals.retain(|w| w.id != id);
        before != self.withdrawals.len()
    }

    pub fn totals(&self) -> DefiTotals {
        let invested: f64 = self.pairs.iter().map(|p| p.amount).sum();
        let withdrawn: f64 = self.withdrawals.iter().map(|w| w.amount).sum();
        DefiTotals {
            invested,
            withdrawn,
            net_profit: withdrawn - invested,
        }
    }

    pub fn withdrawals_by_date_desc(&self) -> Vec<&Withdrawal> {
        let mut sorted: Vec<&Withdrawal> = self.withdrawals.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
        sorted
    }

    pub fn export_pairs(&self) -> Result<String> {
        let rows: Vec<Vec<String>> = self
            .pairs
            .iter()
            .map(|p| {
                vec![
                    p.id.clone(),
                    p.name.clone(),
                    p.amount.to_string(),
                    p.date.format("%Y-%m-%d").to_string(),
                ]
            })
            .collect();
        write_delimited(&PAIR_HEADERS, &rows)
    }

    pub fn export_withdrawals(&self) -> Result<String> {
        let rows: Vec<Vec<String>> = self
            .withdrawals
            .iter()
            .map(|w| {
                vec![
                    w.id.clone(),
                    w.date.format("%Y-%m-%d").to_string(),
                    w.amount.to_string(),
                    w.notes.clone().unwrap_or_default(),
                ]
            })
            .collect();
        write_delimited(&WITHDRAWAL_HEADERS, &rows)
    }

    /// Replaces the pairs or the withdrawals wholesale with the rows of an
    /// exported file. Returns which list was replaced and how many rows it
    /// now holds. A file with only the header empties the list.
    pub fn import_csv(&mut self, content: &str) -> Result<(DefiImportKind, usize)> {
        let table = read_table(content, true)?;
        let delimiter = table.delimiter;

        if table.has_columns(&["Par", "Investido"]) {
            let pairs: Vec<Pair> = table
                .rows
                .iter()
                .filter_map(|cols| {
                    if cols.len() < PAIR_HEADERS.len() || cols[1].is_empty() {
                        return None;
                    }
                    let amount = parse_locale_number(&cols[2], delimiter);
                    let date = parse_date(&cols[3])?;
                    if amount.is_nan() {
                        debug!("Skipping pair {} with unparsable amount", cols[1]);
                        return None;
                    }
                    Some(Pair {
                        id: if cols[0].is_empty() { new_id() } else { cols[0].clone() },
                        name: cols[1].clone(),
                        amount,
                        date,
                    })
                })
                .collect();
            info!("Imported {} pairs", pairs.len());
            let count = pairs.len();
            self.pairs = pairs;
            Ok((DefiImportKind::Pairs, count))
        } else if table.has_columns(&["Valor", "Notas"]) {
            let withdrawals: Vec<Withdrawal> = table
                .rows
                .iter()
                .filter_map(|cols| {
                    if cols.len() < WITHDRAWAL_HEADERS.len() - 1 {
                        return None;
                    }
                    let date = parse_date(&cols[1])?;
                    let amount = parse_locale_number(&cols[2], delimiter);
                    if amount.is_nan() {
                        return None;
                    }
                    Some(Withdrawal {
                        id: if cols[0].is_empty() { new_id() } else { cols[0].clone() },
                        date,
                        amount,
                        notes: cols.get(3).filter(|n| !n.is_empty()).cloned(),
                    })
                })
                .collect();
            info!("Imported {} withdrawals", withdrawals.len());
            let count = withdrawals.len();
            self.withdrawals = withdrawals;
            Ok((DefiImportKind::Withdrawals, count))
        } else {
            bail!(
                "Unrecognized file format. Expected columns {} or {}",
                PAIR_HEADERS.join(";"),
                WITHDRAWAL_HEADERS.join(";")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn sample() -> DefiState {
        let mut state = DefiState::default();
        state.add_pair("ETH/USDC", 1000.0, day(1)).unwrap();
        state.add_pair("BTC/ETH", 500.0, day(2)).unwrap();
        state.add_withdrawal(300.0, day(5), None).unwrap();
        state
            .add_withdrawal(1400.0, day(20), Some("closing".to_string()))
            .unwrap();
        state
    }

    #[test]
    fn test_totals() {
        let totals = sample().totals();
        assert_eq!(totals.invested, 1500.0);
        assert_eq!(totals.withdrawn, 1700.0);
        assert_eq!(totals.net_profit, 200.0);
        assert_eq!(DefiState::default().totals().net_profit, 0.0);
    }

    #[test]
    fn test_delete() {
        let mut state = sample();
        let id = state.pairs[0].id.clone();
        assert!(state.delete_pair(&id));
        assert!(!state.delete_pair(&id));
        let wid = state.withdrawals[1].id.clone();
        assert!(state.delete_withdrawal(&wid));
        assert_eq!(state.totals().withdrawn, 300.0);
    }

    #[test]
    fn test_withdrawals_newest_first() {
        let state = sample();
        let dates: Vec<NaiveDate> = state
            .withdrawals_by_date_desc()
            .iter()
            .map(|w| w.date)
            .collect();
        assert_eq!(dates, vec![day(20), day(5)]);
    }

    #[test]
    fn test_numeric_ids_are_accepted() {
        let json = r#"{
            "pairs": [{"id": 1717200000000, "name": "ETH/USDC", "amount": 10, "date": "2024-06-01"}],
            "withdrawals": [{"id": "w1", "date": "2024-06-02", "amount": 2.5, "notes": ""}]
        }"#;
        let state: DefiState = serde_json::from_str(json).unwrap();
        assert_eq!(state.pairs[0].id, "1717200000000");
        assert_eq!(state.withdrawals[0].id, "w1");
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let state: DefiState = serde_json::from_str("{}").unwrap();
        assert!(state.pairs.is_empty());
        assert!(state.withdrawals.is_empty());
    }

    #[test]
    fn test_export_import_replaces_lists() {
        let original = sample();
        let pairs_csv = original.export_pairs().unwrap();
        let withdrawals_csv = original.export_withdrawals().unwrap();

        let mut restored = DefiState::default();
        restored.add_pair("stale", 1.0, day(1)).unwrap();

        let (kind, count) = restored.import_csv(&pairs_csv).unwrap();
        assert_eq!(kind, DefiImportKind::Pairs);
        assert_eq!(count, 2);
        let (kind, count) = restored.import_csv(&withdrawals_csv).unwrap();
        assert_eq!(kind, DefiImportKind::Withdrawals);
        assert_eq!(count, 2);

        assert_eq!(restored, original);
    }

    #[test]
    fn test_import_locale_amounts() {
        let csv = "ID;Par;Investido;Data\n;SOL/USDC;1.250,75;01/06/2024\n";
        let mut state = DefiState::default();
        state.import_csv(csv).unwrap();
        assert_eq!(state.pairs[0].amount, 1250.75);
        assert_eq!(state.pairs[0].date, day(1));
        assert!(!state.pairs[0].id.is_empty());
    }

    #[test]
    fn test_header_only_file_clears_list() {
        let mut state = sample();
        let empty_pairs = DefiState::default().export_pairs().unwrap();

        let (kind, count) = state.import_csv(&empty_pairs).unwrap();
        assert_eq!(kind, DefiImportKind::Pairs);
        assert_eq!(count, 0);
        assert!(state.pairs.is_empty());
        assert_eq!(state.withdrawals.len(), 2);

        assert!(state.import_csv("").is_err());
    }

    #[test]
    fn test_import_unknown_header() {
        let mut state = sample();
        let before = state.clone();
        assert!(state.import_csv("A;B\n1;2\n").is_err());
        assert_eq!(state, before);
    }
}
