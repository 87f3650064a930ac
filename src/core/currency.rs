//! Fixed-rate conversion between the base currency and the alternate one.

use crate::core::model::Currency;
use tracing::debug;

pub const DEFAULT_USD_RATE: f64 = 5.00;

/// Converts amounts into the selected display currency. `usd_rate` is the
/// number of base units (BRL) per USD and is configuration, not market data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyConverter {
    pub usd_rate: f64,
    pub display: Currency,
}

impl CurrencyConverter {
    pub fn new(usd_rate: f64, display: Currency) -> Self {
        Self { usd_rate, display }
    }

    pub fn to_base(&self, value: f64, source: Currency) -> f64 {
        match source {
            Currency::Usd => value * self.usd_rate,
            Currency::Brl => value,
        }
    }

    pub fn to_usd(&self, value: f64, source: Currency) -> f64 {
        match source {
            Currency::Brl => value / self.usd_rate,
            Currency::Usd => value,
        }
    }

    /// Converts `value`, stated in `source`, into the display currency.
    /// Identity when `source` already is the display currency.
    pub fn convert_to_display(&self, value: f64, source: Currency) -> f64 {
        if source == self.display {
            return value;
        }
        let converted = match self.display {
            Currency::Brl => self.to_base(value, source),
            Currency::Usd => self.to_usd(value, source),
        };
        debug!(
            "Converted {value} from {source} to {} at rate {}: {converted}",
            self.display, self.usd_rate
        );
        converted
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(DEFAULT_USD_RATE, Currency::BASE)
    }
}
