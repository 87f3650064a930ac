use super::ui;
use crate::core::defi::{DefiState, PAIRS_FILE_NAME, WITHDRAWALS_FILE_NAME};
use crate::core::model::Currency;
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::path::{Path, PathBuf};

impl DefiState {
    pub fn display_as_tables(&self) -> String {
        let money = |v: f64| ui::format_money(v, Currency::BASE);
        let totals = self.totals();

        let mut summary = ui::new_styled_table();
        summary.set_header(vec![
            ui::header_cell("Invested"),
            ui::header_cell("Withdrawn"),
            ui::header_cell("Net Profit"),
        ]);
        summary.add_row(vec![
            ui::number_cell(money(totals.invested)),
            ui::number_cell(money(totals.withdrawn)),
            ui::profit_cell(totals.net_profit, money(totals.net_profit)),
        ]);

        let mut output = format!(
            "{}\n\n{}",
            ui::style_text("DeFi", ui::StyleType::Title),
            summary
        );

        if !self.pairs.is_empty() {
            let mut pairs = ui::new_styled_table();
            pairs.set_header(vec![
                ui::header_cell("Pair"),
                ui::header_cell("Invested"),
                ui::header_cell("Date"),
                ui::header_cell("ID"),
            ]);
            for pair in &self.pairs {
                pairs.add_row(vec![
                    Cell::new(&pair.name),
                    ui::number_cell(money(pair.amount)),
                    Cell::new(pair.date.format("%Y-%m-%d")),
                    Cell::new(ui::style_text(&pair.id, ui::StyleType::Subtle)),
                ]);
            }
            output.push_str(&format!(
                "\n\n{}\n{}",
                ui::style_text("Pairs", ui::StyleType::TotalLabel),
                pairs
            ));
        }

        if !self.withdrawals.is_empty() {
            let mut withdrawals = ui::new_styled_table();
            withdrawals.set_header(vec![
                ui::header_cell("Date"),
                ui::header_cell("Amount"),
                ui::header_cell("Notes"),
                ui::header_cell("ID"),
            ]);
            for w in self.withdrawals_by_date_desc() {
                withdrawals.add_row(vec![
                    Cell::new(w.date.format("%Y-%m-%d")),
                    ui::number_cell(money(w.amount)),
                    Cell::new(w.notes.as_deref().unwrap_or("")),
                    Cell::new(ui::style_text(&w.id, ui::StyleType::Subtle)),
                ]);
            }
            output.push_str(&format!(
                "\n\n{}\n{}",
                ui::style_text("Withdrawals", ui::StyleType::TotalLabel),
                withdrawals
            ));
        }

        output
    }
}

pub async fn export(state: &DefiState, dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut written = Vec::new();
    for (name, content) in [
        (PAIRS_FILE_NAME, state.export_pairs()?),
        (WITHDRAWALS_FILE_NAME, state.export_withdrawals()?),
    ] {
        let path = dir.join(name);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Applies each file in order; any failure aborts before the state is saved.
pub async fn import(state: &mut DefiState, files: &[PathBuf]) -> Result<()> {
    for path in files {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let (kind, count) = state
            .import_csv(&content)
            .with_context(|| format!("Failed to import {}", path.display()))?;
        println!("Replaced {} with {} rows from {}", kind, count, path.display());
    }
    Ok(())
}
