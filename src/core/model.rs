//! Portfolio records as they are persisted and exchanged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// The two currencies the tracker knows about. `Brl` is the base currency;
/// cash is always stated in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Currency {
    #[default]
    Brl,
    Usd,
}

impl Currency {
    pub const BASE: Currency = Currency::Brl;

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Brl => "BRL",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Brl => "R$",
            Currency::Usd => "$",
        }
    }

    /// Lenient conversion used for imported and persisted data: anything that
    /// is not `USD` is treated as the base currency.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("USD") {
            Currency::Usd
        } else {
            Currency::Brl
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BRL" => Ok(Currency::Brl),
            "USD" => Ok(Currency::Usd),
            _ => Err(anyhow::anyhow!("Invalid currency: {} (expected BRL or USD)", s)),
        }
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Currency::from_label(&s)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> Self {
        c.code().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                TransactionKind::Buy => "buy",
                TransactionKind::Sell => "sell",
            }
        )
    }
}

impl FromStr for TransactionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(TransactionKind::Buy),
            "sell" => Ok(TransactionKind::Sell),
            _ => Err(anyhow::anyhow!("Invalid transaction type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub category: String,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default, deserialize_with = "number_or_zero")]
    pub current_price: f64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A buy or sell. `total` is stored rather than derived: imported rows may
/// carry a total that differs from `quantity * price` and profit math reads it
/// as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub asset_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(deserialize_with = "number_or_zero")]
    pub quantity: f64,
    #[serde(deserialize_with = "number_or_zero")]
    pub price: f64,
    #[serde(deserialize_with = "lenient_date")]
    pub date: NaiveDate,
    #[serde(deserialize_with = "number_or_zero")]
    pub total: f64,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Accepts ISO dates, the day-first form spreadsheets in `;` locales tend to
/// rewrite them into, and full RFC 3339 timestamps.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

// Non-finite numbers are written as `null` by JSON encoders; read them as 0.
pub(crate) fn number_or_zero<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}
