//! Delimited-text export and import of the asset registry and the
//! transaction log, compatible with spreadsheet programs in both `;` and `,`
//! locales.

use crate::core::model::{Asset, Currency, Transaction, TransactionKind, new_id, parse_date};
use crate::core::number::parse_locale_number;
use crate::core::state::PortfolioState;
use anyhow::{Result, anyhow, bail};
use chrono::Utc;
use std::fmt::Display;
use tracing::{debug, info};

pub const BOM: char = '\u{feff}';
pub const EXPORT_DELIMITER: char = ';';

pub const ASSETS_FILE_NAME: &str = "meus_ativos.csv";
pub const TRANSACTIONS_FILE_NAME: &str = "historico_transacoes.csv";

pub const ASSET_HEADERS: [&str; 6] = ["ID", "Simbolo", "Nome", "Tipo", "Moeda", "Preço Atual"];
pub const TRANSACTION_HEADERS: [&str; 7] = [
    "ID",
    "Data",
    "Ativo ID",
    "Tipo",
    "Quantidade",
    "Preço Unit.",
    "Total",
];

/// A parsed delimited file: trimmed header cells and trimmed data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DelimitedTable {
    pub delimiter: char,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DelimitedTable {
    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.header.iter().any(|h| h == n))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Assets,
    Transactions,
}

impl Display for ImportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportKind::Assets => write!(f, "assets"),
            ImportKind::Transactions => write!(f, "transactions"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub kind: ImportKind,
    pub processed: usize,
    pub skipped: usize,
}

/// Picks `;` or `,` by counting both in the header line; `;` wins ties.
pub fn detect_delimiter(header_line: &str) -> char {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons >= commas { ';' } else { ',' }
}

/// Writes a BOM-prefixed, `;`-separated document with one row per record.
pub fn write_delimited(headers: &[&str], rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(EXPORT_DELIMITER as u8)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to finalize CSV output: {}", e.error()))?;
    let body = String::from_utf8(bytes)?;
    Ok(format!("{BOM}{body}"))
}

/// Splits `content` into a header and data rows. Blank lines are dropped and
/// a leading BOM is ignored. Fails when there is no header plus at least one
/// data line.
pub fn read_delimited(content: &str) -> Result<DelimitedTable> {
    read_table(content, false)
}

/// Like [`read_delimited`], but with `allow_header_only` a file holding just
/// the header yields a table without rows.
pub fn read_table(content: &str, allow_header_only: bool) -> Result<DelimitedTable> {
    let content = content.strip_prefix(BOM).unwrap_or(content);
    let lines: Vec<&str> = content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let min_lines = if allow_header_only { 1 } else { 2 };
    if lines.len() < min_lines {
        bail!("The file appears to be empty or has no header");
    }

    let delimiter = detect_delimiter(lines[0]);
    debug!("Detected delimiter {:?}", delimiter);

    let joined = lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(false)
        .flexible(true)
        .from_reader(joined.as_bytes());

    let mut records = Vec::with_capacity(lines.len());
    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(record) => records.push(record.iter().map(|c| c.trim().to_string()).collect()),
            Err(e) => debug!("Skipping unreadable line {}: {}", idx + 1, e),
        }
    }

    let mut records = records.into_iter();
    let header = records
        .next()
        .ok_or_else(|| anyhow!("The file appears to be empty or has no header"))?;

    Ok(DelimitedTable {
        delimiter,
        header,
        rows: records.collect(),
    })
}

pub fn export_assets(assets: &[Asset]) -> Result<String> {
    let rows: Vec<Vec<String>> = assets
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.symbol.clone(),
                a.name.clone(),
                a.category.clone(),
                a.currency.to_string(),
                a.current_price.to_string(),
            ]
        })
        .collect();
    write_delimited(&ASSET_HEADERS, &rows)
}

/// Exports the log newest first; totals are written as stored.
pub fn export_transactions(state: &PortfolioState) -> Result<String> {
    let rows: Vec<Vec<String>> = state
        .transactions_by_date_desc()
        .into_iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.date.format("%Y-%m-%d").to_string(),
                t.asset_id.clone(),
                t.kind.to_string(),
                t.quantity.to_string(),
                t.price.to_string(),
                t.total.to_string(),
            ]
        })
        .collect();
    write_delimited(&TRANSACTION_HEADERS, &rows)
}

/// Imports an assets or transactions file into `state`, upserting by id.
/// The file kind comes from its header; an unknown header changes nothing.
pub fn import_csv(state: &mut PortfolioState, content: &str) -> Result<ImportReport> {
    let table = read_delimited(content)?;

    let report = if table.has_columns(&["Simbolo", "Moeda"]) {
        import_assets(state, &table)
    } else if table.has_columns(&["Ativo ID", "Quantidade"]) {
        import_transactions(state, &table)
    } else {
        bail!(
            "Unrecognized file format. Check that the header has the expected columns \
             ({} or {})",
            ASSET_HEADERS.join(";"),
            TRANSACTION_HEADERS.join(";")
        );
    };

    info!(
        "Imported {} {} ({} rows skipped)",
        report.processed, report.kind, report.skipped
    );
    Ok(report)
}

fn id_or_new(raw: &str) -> String {
    if raw.is_empty() {
        new_id()
    } else {
        raw.to_string()
    }
}

fn import_assets(state: &mut PortfolioState, table: &DelimitedTable) -> ImportReport {
    let mut processed = 0;
    let mut skipped = 0;

    for cols in &table.rows {
        let Some(asset) = parse_asset_row(cols, table.delimiter) else {
            skipped += 1;
            continue;
        };
        state.upsert_asset(asset);
        processed += 1;
    }

    ImportReport {
        kind: ImportKind::Assets,
        processed,
        skipped,
    }
}

fn parse_asset_row(cols: &[String], delimiter: char) -> Option<Asset> {
    if cols.len() < ASSET_HEADERS.len() {
        return None;
    }
    let symbol = cols[1].to_uppercase();
    if symbol.is_empty() {
        return None;
    }
    let current_price = parse_locale_number(&cols[5], delimiter);
    if current_price.is_nan() {
        debug!("Skipping asset {} with unparsable price {:?}", symbol, cols[5]);
        return None;
    }

    Some(Asset {
        id: id_or_new(&cols[0]),
        symbol,
        name: cols[2].clone(),
        category: cols[3].clone(),
        currency: Currency::from_label(&cols[4]),
        current_price,
        created_at: Utc::now(),
    })
}

fn import_transactions(state: &mut PortfolioState, table: &DelimitedTable) -> ImportReport {
    let mut processed = 0;
    let mut skipped = 0;

    for cols in &table.rows {
        let Some(transaction) = parse_transaction_row(cols, table.delimiter) else {
            skipped += 1;
            continue;
        };
        state.upsert_transaction(transaction);
        processed += 1;
    }

    ImportReport {
        kind: ImportKind::Transactions,
        processed,
        skipped,
    }
}

fn parse_transaction_row(cols: &[String], delimiter: char) -> Option<Transaction> {
    if cols.len() < TRANSACTION_HEADERS.len() {
        return None;
    }
    let asset_id = cols[2].clone();
    if asset_id.is_empty() {
        return None;
    }
    let date = parse_date(&cols[1])?;
    let kind = cols[3].parse::<TransactionKind>().ok()?;

    let quantity = parse_locale_number(&cols[4], delimiter);
    let price = parse_locale_number(&cols[5], delimiter);
    let total = parse_locale_number(&cols[6], delimiter);
    if quantity.is_nan() || price.is_nan() || total.is_nan() {
        debug!("Skipping transaction row with unparsable numbers: {:?}", cols);
        return None;
    }

    Some(Transaction {
        id: id_or_new(&cols[0]),
        asset_id,
        kind,
        quantity,
        price,
        date,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_state() -> PortfolioState {
        let mut state = PortfolioState::default();
        let bova = state
            .add_asset("bova11", "Ishares Bovespa", "ETF", Currency::Brl, 120.5)
            .unwrap()
            .id
            .clone();
        state
            .add_asset("voo", "Vanguard S&P 500", "ETF", Currency::Usd, 480.25)
            .unwrap();
        state
            .add_transaction(
                &bova,
                TransactionKind::Buy,
                10.0,
                100.0,
                NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            )
            .unwrap();
        state
            .add_transaction(
                &bova,
                TransactionKind::Sell,
                2.5,
                110.0,
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
            )
            .unwrap();
        state
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("ID;Simbolo;Nome"), ';');
        assert_eq!(detect_delimiter("ID,Simbolo,Nome"), ',');
        assert_eq!(detect_delimiter("ID"), ';');
        assert_eq!(detect_delimiter("a,b;c"), ';');
    }

    #[test]
    fn test_export_assets_format() {
        let state = sample_state();
        let out = export_assets(&state.assets).unwrap();
        assert!(out.starts_with(BOM));
        let mut lines = out.trim_start_matches(BOM).lines();
        assert_eq!(lines.next().unwrap(), "ID;Simbolo;Nome;Tipo;Moeda;Preço Atual");
        let first = lines.next().unwrap();
        assert!(first.ends_with(";BOVA11;Ishares Bovespa;ETF;BRL;120.5"));
        let second = lines.next().unwrap();
        assert!(second.ends_with(";VOO;Vanguard S&P 500;ETF;USD;480.25"));
    }

    #[test]
    fn test_export_transactions_newest_first() {
        let state = sample_state();
        let out = export_transactions(&state).unwrap();
        let lines: Vec<&str> = out.trim_start_matches(BOM).lines().collect();
        assert_eq!(lines[0], "ID;Data;Ativo ID;Tipo;Quantidade;Preço Unit.;Total");
        assert!(lines[1].contains(";2024-03-05;"));
        assert!(lines[1].ends_with(";sell;2.5;110;275"));
        assert!(lines[2].contains(";2024-01-10;"));
    }

    #[test]
    fn test_asset_round_trip() {
        let state = sample_state();
        let exported = export_assets(&state.assets).unwrap();

        let mut restored = PortfolioState::default();
        let report = import_csv(&mut restored, &exported).unwrap();
        assert_eq!(report.kind, ImportKind::Assets);
        assert_eq!(report.processed, 2);

        for original in &state.assets {
            let copy = restored.asset(&original.id).unwrap();
            assert_eq!(copy.symbol, original.symbol);
            assert_eq!(copy.name, original.name);
            assert_eq!(copy.category, original.category);
            assert_eq!(copy.currency, original.currency);
            assert_eq!(copy.current_price, original.current_price);
        }
    }

    #[test]
    fn test_transaction_round_trip_upserts() {
        let mut state = sample_state();
        let exported = export_transactions(&state).unwrap();
        let before = state.transactions.clone();

        let report = import_csv(&mut state, &exported).unwrap();
        assert_eq!(report.kind, ImportKind::Transactions);
        assert_eq!(report.processed, 2);
        // Same ids are replaced in place, not duplicated
        assert_eq!(state.transactions, before);
    }

    #[test]
    fn test_import_semicolon_locale_numbers() {
        let csv = "ID;Data;Ativo ID;Tipo;Quantidade;Preço Unit.;Total\n\
                   t1;15/02/2024;a1;buy;1.000;1.234,56;1.234.560,00\n";
        let mut state = PortfolioState::default();
        let report = import_csv(&mut state, csv).unwrap();
        assert_eq!(report.processed, 1);
        let t = &state.transactions[0];
        // No comma, so the dot is a decimal point
        assert_eq!(t.quantity, 1.0);
        assert_eq!(t.price, 1234.56);
        assert_eq!(t.total, 1_234_560.0);
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
    }

    #[test]
    fn test_import_comma_locale_and_generated_ids() {
        let csv = "ID,Simbolo,Nome,Tipo,Moeda,Preço Atual\r\n\
                   ,aapl,Apple,Stock,USD,\"1,234.5\"\r\n\
                   \r\n\
                   ,msft,Microsoft,Stock,usd,410\r\n";
        let mut state = PortfolioState::default();
        let report = import_csv(&mut state, csv).unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(state.assets[0].symbol, "AAPL");
        assert_eq!(state.assets[0].current_price, 1234.5);
        assert_eq!(state.assets[1].currency, Currency::Usd);
        assert!(!state.assets[0].id.is_empty());
        assert_ne!(state.assets[0].id, state.assets[1].id);
    }

    #[test]
    fn test_import_skips_invalid_rows() {
        let csv = "ID;Data;Ativo ID;Tipo;Quantidade;Preço Unit.;Total\n\
                   short;2024-01-01;a1;buy\n\
                   t1;2024-01-01;;buy;1;1;1\n\
                   t2;not-a-date;a1;buy;1;1;1\n\
                   t3;2024-01-01;a1;hold;1;1;1\n\
                   t4;2024-01-01;a1;buy;abc;1;1\n\
                   t5;2024-01-01;a1;sell;2;3;6\n";
        let mut state = PortfolioState::default();
        let report = import_csv(&mut state, csv).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 5);
        assert_eq!(state.transactions[0].id, "t5");
    }

    #[test]
    fn test_unrecognized_header_changes_nothing() {
        let mut state = sample_state();
        let before = state.clone();
        let err = import_csv(&mut state, "Foo;Bar\n1;2\n").unwrap_err();
        assert!(err.to_string().contains("Unrecognized file format"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_header_only_file_is_rejected() {
        let mut state = PortfolioState::default();
        let content = format!("{BOM}ID;Simbolo;Nome;Tipo;Moeda;Preço Atual\n\n");
        assert!(import_csv(&mut state, &content).is_err());
    }

    #[test]
    fn test_header_routing() {
        let assets = "Simbolo;Moeda\nx;y\n";
        let table = read_delimited(assets).unwrap();
        assert!(table.has_columns(&["Simbolo", "Moeda"]));

        let mut state = PortfolioState::default();
        let report = import_csv(&mut state, "Ativo ID;Quantidade\nx;y\n").unwrap();
        assert_eq!(report.kind, ImportKind::Transactions);
        assert_eq!(report.processed, 0);
    }
}
