use anyhow::Result;
use assetbook::core::log::init_logging;
use assetbook::core::model::{Currency, TransactionKind};
use assetbook::{AppCommand, DefiCommand, PortfolioCommand};
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn parse_currency(s: &str) -> Result<Currency, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn parse_kind(s: &str) -> Result<TransactionKind, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the portfolio dashboard
    Summary,
    /// List assets with their holdings
    Assets,
    /// List transactions with realized profit
    Transactions,
    /// Register a new asset
    AddAsset {
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "Stock")]
        category: String,
        #[arg(long, default_value = "BRL", value_parser = parse_currency)]
        currency: Currency,
        #[arg(long)]
        price: f64,
    },
    /// Record a buy or sell
    AddTransaction {
        /// Asset id or symbol
        #[arg(long)]
        asset: String,
        #[arg(long, value_parser = parse_kind)]
        kind: TransactionKind,
        #[arg(long)]
        quantity: f64,
        /// Unit price in the asset's currency
        #[arg(long)]
        price: f64,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Delete a transaction by id
    DeleteTransaction { id: String },
    /// Set the current price of an asset
    UpdatePrice { asset: String, price: f64 },
    /// Set the cash balance (BRL)
    #[command(allow_negative_numbers = true)]
    SetCash { amount: f64 },
    /// Set the display currency
    SetCurrency {
        #[arg(value_parser = parse_currency)]
        currency: Currency,
    },
    /// Set the USD rate (BRL per 1 USD)
    SetRate { rate: f64 },
    /// Export assets and transactions as CSV
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Import assets or transactions CSV files
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Serve the data endpoint used as remote mirror
    Serve,
    /// Track DeFi liquidity pairs
    #[command(subcommand)]
    Defi(DefiCommands),
}

#[derive(Subcommand)]
enum DefiCommands {
    /// Display pairs, withdrawals and totals
    Summary,
    /// Register an invested pair
    AddPair {
        #[arg(long)]
        name: String,
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Register a withdrawal
    AddWithdrawal {
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a pair by id
    DeletePair { id: String },
    /// Delete a withdrawal by id
    DeleteWithdrawal { id: String },
    /// Export pairs and withdrawals as CSV
    Export {
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Replace pairs or withdrawals from CSV files
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl From<DefiCommands> for DefiCommand {
    fn from(cmd: DefiCommands) -> DefiCommand {
        match cmd {
            DefiCommands::Summary => DefiCommand::Summary,
            DefiCommands::AddPair { name, amount, date } => {
                DefiCommand::AddPair { name, amount, date }
            }
            DefiCommands::AddWithdrawal {
                amount,
                date,
                notes,
            } => DefiCommand::AddWithdrawal {
                amount,
                date,
                notes,
            },
            DefiCommands::DeletePair { id } => DefiCommand::DeletePair { id },
            DefiCommands::DeleteWithdrawal { id } => DefiCommand::DeleteWithdrawal { id },
            DefiCommands::Export { dir } => DefiCommand::Export { dir },
            DefiCommands::Import { files } => DefiCommand::Import { files },
        }
    }
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        let portfolio = match cmd {
            Commands::Setup => return AppCommand::Setup,
            Commands::Serve => return AppCommand::Serve,
            Commands::Defi(defi) => return AppCommand::Defi(defi.into()),
            Commands::Summary => PortfolioCommand::Summary,
            Commands::Assets => PortfolioCommand::Assets,
            Commands::Transactions => PortfolioCommand::Transactions,
            Commands::AddAsset {
                symbol,
                name,
                category,
                currency,
                price,
            } => PortfolioCommand::AddAsset {
                symbol,
                name,
                category,
                currency,
                price,
            },
            Commands::AddTransaction {
                asset,
                kind,
                quantity,
                price,
                date,
            } => PortfolioCommand::AddTransaction {
                asset,
                kind,
                quantity,
                price,
                date,
            },
            Commands::DeleteTransaction { id } => PortfolioCommand::DeleteTransaction { id },
            Commands::UpdatePrice { asset, price } => {
                PortfolioCommand::UpdatePrice { asset, price }
            }
            Commands::SetCash { amount } => PortfolioCommand::SetCash { amount },
            Commands::SetCurrency { currency } => PortfolioCommand::SetCurrency { currency },
            Commands::SetRate { rate } => PortfolioCommand::SetRate { rate },
            Commands::Export { dir } => PortfolioCommand::Export { dir },
            Commands::Import { files } => PortfolioCommand::Import { files },
        };
        AppCommand::Portfolio(portfolio)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(cmd) => assetbook::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
