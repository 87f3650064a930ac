pub mod cli;
pub mod core;
pub mod server;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::defi::DefiState;
use crate::core::model::{Currency, TransactionKind};
use crate::core::state::PortfolioState;
use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use std::path::PathBuf;
use store::local::LocalStore;
use store::{LoadSource, Repository};
use tracing::{debug, info};

pub enum AppCommand {
    /// Writes the example configuration
    Setup,
    /// Serves the persistence endpoint
    Serve,
    Defi(DefiCommand),
    Portfolio(PortfolioCommand),
}

/// Commands that load the portfolio state, act on it and save it back.
pub enum PortfolioCommand {
    Summary,
    Assets,
    Transactions,
    AddAsset {
        symbol: String,
        name: String,
        category: String,
        currency: Currency,
        price: f64,
    },
    AddTransaction {
        asset: String,
        kind: TransactionKind,
        quantity: f64,
        price: f64,
        date: Option<NaiveDate>,
    },
    DeleteTransaction {
        id: String,
    },
    UpdatePrice {
        asset: String,
        price: f64,
    },
    SetCash {
        amount: f64,
    },
    SetCurrency {
        currency: Currency,
    },
    SetRate {
        rate: f64,
    },
    Export {
        dir: PathBuf,
    },
    Import {
        files: Vec<PathBuf>,
    },
}

pub enum DefiCommand {
    Summary,
    AddPair {
        name: String,
        amount: f64,
        date: Option<NaiveDate>,
    },
    AddWithdrawal {
        amount: f64,
        date: Option<NaiveDate>,
        notes: Option<String>,
    },
    DeletePair {
        id: String,
    },
    DeleteWithdrawal {
        id: String,
    },
    Export {
        dir: PathBuf,
    },
    Import {
        files: Vec<PathBuf>,
    },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn open_local_store(config: &AppConfig) -> Result<LocalStore> {
    let path = config.default_data_path()?.join("storage");
    LocalStore::open(&path)
}

fn report_save(outcome: Option<bool>) {
    if outcome == Some(false) {
        eprintln!(
            "{}",
            cli::ui::style_text(
                "Saved locally. The remote server is unavailable.",
                cli::ui::StyleType::Error
            )
        );
    }
}

async fn save(repo: &Repository, state: &PortfolioState) -> Result<()> {
    let outcome = repo.save(state).await?;
    report_save(outcome);
    Ok(())
}

fn resolve_asset_id(state: &PortfolioState, key: &str) -> Result<String> {
    state
        .find_asset(key)
        .map(|a| a.id.clone())
        .with_context(|| format!("No asset with id or symbol {key}"))
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("assetbook starting...");

    match command {
        AppCommand::Setup => match config_path {
            Some(path) => cli::setup::setup_at_path(path),
            None => cli::setup::setup(),
        },
        AppCommand::Serve => server::serve(&load_config(config_path)?).await,
        AppCommand::Defi(defi) => {
            let config = load_config(config_path)?;
            run_defi(defi, &open_local_store(&config)?).await
        }
        AppCommand::Portfolio(portfolio) => {
            run_portfolio(portfolio, &load_config(config_path)?).await
        }
    }
}

async fn run_portfolio(command: PortfolioCommand, config: &AppConfig) -> Result<()> {
    let repo = Repository::from_config(config, open_local_store(config)?)?;
    let (mut state, source) = repo.load().await?;
    debug!("Using state from {source} source");
    if source == LoadSource::Local && config.remote.is_some() {
        eprintln!(
            "{}",
            cli::ui::style_text(
                "Remote server unavailable, using local data.",
                cli::ui::StyleType::Subtle
            )
        );
    }

    match command {
        PortfolioCommand::Summary => cli::summary::run(&state),
        PortfolioCommand::Assets => cli::assets::run(&state),
        PortfolioCommand::Transactions => cli::transactions::run(&state),
        PortfolioCommand::AddAsset {
            symbol,
            name,
            category,
            currency,
            price,
        } => {
            let asset = state.add_asset(&symbol, &name, &category, currency, price)?;
            println!("Added {} ({})", asset.symbol, asset.id);
            save(&repo, &state).await?;
        }
        PortfolioCommand::AddTransaction {
            asset,
            kind,
            quantity,
            price,
            date,
        } => {
            let asset_id = resolve_asset_id(&state, &asset)?;
            let date = date.unwrap_or_else(today);
            let t = state.add_transaction(&asset_id, kind, quantity, price, date)?;
            println!("Recorded {} of {} on {} ({})", t.kind, t.quantity, t.date, t.id);
            save(&repo, &state).await?;
        }
        PortfolioCommand::DeleteTransaction { id } => {
            if !state.delete_transaction(&id) {
                bail!("No transaction with id {id}");
            }
            println!("Deleted transaction {id}");
            save(&repo, &state).await?;
        }
        PortfolioCommand::UpdatePrice { asset, price } => {
            let asset_id = resolve_asset_id(&state, &asset)?;
            state.update_price(&asset_id, price)?;
            println!("Updated price of {asset} to {price}");
            save(&repo, &state).await?;
        }
        PortfolioCommand::SetCash { amount } => {
            state.set_cash(amount)?;
            println!(
                "Cash balance set to {}",
                cli::ui::format_money(amount, Currency::BASE)
            );
            save(&repo, &state).await?;
        }
        PortfolioCommand::SetCurrency { currency } => {
            state.set_display_currency(currency);
            println!("Display currency set to {currency}");
            save(&repo, &state).await?;
        }
        PortfolioCommand::SetRate { rate } => {
            state.set_usd_rate(rate)?;
            println!("USD rate set to {rate}");
            save(&repo, &state).await?;
        }
        PortfolioCommand::Export { dir } => cli::transfer::run_export(&state, &dir).await?,
        PortfolioCommand::Import { files } => {
            let reports = cli::transfer::import(&mut state, &files).await?;
            cli::transfer::print_import_reports(&reports);
            save(&repo, &state).await?;
        }
    }

    Ok(())
}

async fn run_defi(command: DefiCommand, store: &LocalStore) -> Result<()> {
    let mut state: DefiState = store.load_defi()?;

    match command {
        DefiCommand::Summary => {
            println!("{}", state.display_as_tables());
            return Ok(());
        }
        DefiCommand::Export { dir } => {
            for path in cli::defi::export(&state, &dir).await? {
                println!("Exported {}", path.display());
            }
            return Ok(());
        }
        DefiCommand::AddPair { name, amount, date } => {
            let pair = state.add_pair(&name, amount, date.unwrap_or_else(today))?;
            println!("Added pair {} ({})", pair.name, pair.id);
        }
        DefiCommand::AddWithdrawal {
            amount,
            date,
            notes,
        } => {
            let w = state.add_withdrawal(amount, date.unwrap_or_else(today), notes)?;
            println!("Added withdrawal of {} ({})", w.amount, w.id);
        }
        DefiCommand::DeletePair { id } => {
            if !state.delete_pair(&id) {
                bail!("No pair with id {id}");
            }
            println!("Deleted pair {id}");
        }
        DefiCommand::DeleteWithdrawal { id } => {
            if !state.delete_withdrawal(&id) {
                bail!("No withdrawal with id {id}");
            }
            println!("Deleted withdrawal {id}");
        }
        DefiCommand::Import { files } => cli::defi::import(&mut state, &files).await?,
    }

    store.save_defi(&state)
}
