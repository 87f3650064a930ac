//! Core business logic

pub mod analytics;
pub mod config;
pub mod currency;
pub mod defi;
pub mod holding;
pub mod log;
pub mod model;
pub mod number;
pub mod realized;
pub mod spreadsheet;
pub mod state;
pub mod store;

// Re-export main types for cleaner imports
pub use currency::CurrencyConverter;
pub use model::{Asset, Currency, Transaction, TransactionKind};
pub use state::PortfolioState;
pub use store::{StateBackend, UnreadableState};
