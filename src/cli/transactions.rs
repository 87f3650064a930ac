use super::ui;
use crate::core::model::{Currency, TransactionKind};
use crate::core::state::PortfolioState;
use comfy_table::{Cell, Color};

/// The transaction log, newest first, with the realized profit of each sale
/// converted into the display currency.
pub fn display_as_table(state: &PortfolioState) -> String {
    if state.transactions.is_empty() {
        return ui::style_text("No transactions recorded.", ui::StyleType::Subtle);
    }

    let converter = state.converter();
    let display = converter.display;
    let realized = state.realized_profits();

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Date"),
        ui::header_cell("Asset"),
        ui::header_cell("Type"),
        ui::header_cell("Quantity"),
        ui::header_cell("Unit Price"),
        ui::header_cell("Total"),
        ui::header_cell(&format!("Realized ({})", display.code())),
        ui::header_cell("Realized (%)"),
        ui::header_cell("ID"),
    ]);

    let mut total_realized = 0.0;
    for t in state.transactions_by_date_desc() {
        let asset = state.asset(&t.asset_id);
        let currency = asset.map_or(Currency::BASE, |a| a.currency);
        let symbol = asset.map_or("?", |a| a.symbol.as_str());

        let kind = match t.kind {
            TransactionKind::Buy => Cell::new("BUY").fg(Color::Green),
            TransactionKind::Sell => Cell::new("SELL").fg(Color::Red),
        };

        let (profit, percent) = match realized.get(&t.id) {
            Some(r) => {
                let converted = converter.convert_to_display(r.profit, currency);
                total_realized += converted;
                (
                    ui::profit_cell(converted, ui::format_money(converted, display)),
                    ui::percent_cell(r.profit_percent),
                )
            }
            None => (ui::na_cell(), ui::na_cell()),
        };

        table.add_row(vec![
            Cell::new(t.date.format("%Y-%m-%d")),
            Cell::new(symbol),
            kind,
            ui::number_cell(format!("{}", t.quantity)),
            ui::number_cell(ui::format_money(t.price, currency)),
            ui::number_cell(ui::format_money(t.total, currency)),
            profit,
            percent,
            Cell::new(ui::style_text(&t.id, ui::StyleType::Subtle)),
        ]);
    }

    let total_style = if total_realized >= 0.0 {
        ui::StyleType::TotalValue
    } else {
        ui::StyleType::Error
    };
    format!(
        "{}\n\n{}: {}",
        table,
        ui::style_text(
            &format!("Total Realized ({})", display.code()),
            ui::StyleType::TotalLabel
        ),
        ui::style_text(&ui::format_money(total_realized, display), total_style)
    )
}

pub fn run(state: &PortfolioState) {
    println!("{}", display_as_table(state));
}
