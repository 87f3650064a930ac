use super::ui;
use crate::core::state::PortfolioState;
use comfy_table::Cell;

/// One row per asset, including assets whose position has been closed.
pub fn display_as_table(state: &PortfolioState) -> String {
    if state.assets.is_empty() {
        return ui::style_text("No assets registered.", ui::StyleType::Subtle);
    }

    let snapshot = state.snapshot();
    let display = snapshot.display_currency;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Name"),
        ui::header_cell("Type"),
        ui::header_cell("Quantity"),
        ui::header_cell("Avg Price"),
        ui::header_cell("Price"),
        ui::header_cell(&format!("Value ({})", display.code())),
        ui::header_cell("Weight (%)"),
        ui::header_cell("Profit"),
        ui::header_cell("Profit (%)"),
        ui::header_cell("ID"),
    ]);

    for asset in &state.assets {
        let price = ui::number_cell(ui::format_money(asset.current_price, asset.currency));
        let id = Cell::new(ui::style_text(&asset.id, ui::StyleType::Subtle));

        match snapshot.positions.iter().find(|p| p.asset.id == asset.id) {
            Some(position) => {
                let holding = position.holding;
                table.add_row(vec![
                    Cell::new(&asset.symbol),
                    Cell::new(&asset.name),
                    Cell::new(&asset.category),
                    ui::number_cell(format!("{}", holding.quantity)),
                    ui::number_cell(ui::format_money(holding.avg_price, asset.currency)),
                    price,
                    ui::number_cell(ui::format_money(position.current_value_display, display)),
                    ui::number_cell(ui::format_percent(position.allocation_percent)),
                    ui::profit_cell(
                        position.profit,
                        ui::format_money(position.profit, asset.currency),
                    ),
                    ui::percent_cell(position.profit_percent),
                    id,
                ]);
            }
            None => {
                table.add_row(vec![
                    Cell::new(&asset.symbol),
                    Cell::new(&asset.name),
                    Cell::new(&asset.category),
                    ui::number_cell("0".to_string()),
                    ui::na_cell(),
                    price,
                    ui::na_cell(),
                    ui::na_cell(),
                    ui::na_cell(),
                    ui::na_cell(),
                    id,
                ]);
            }
        }
    }

    table.to_string()
}

pub fn run(state: &PortfolioState) {
    println!("{}", display_as_table(state));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Currency, TransactionKind};
    use chrono::NaiveDate;

    #[test]
    fn test_assets_table_shows_open_and_closed_positions() {
        let mut state = PortfolioState::default();
        let day = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        let voo = state
            .add_asset("VOO", "Vanguard S&P 500", "ETF", Currency::Usd, 500.0)
            .unwrap()
            .id
            .clone();
        state
            .add_asset("PETR4", "Petrobras", "Stock", Currency::Brl, 38.0)
            .unwrap();
        state
            .add_transaction(&voo, TransactionKind::Buy, 2.0, 450.0, day)
            .unwrap();

        let output = console::strip_ansi_codes(&display_as_table(&state)).to_string();
        assert!(output.contains("VOO"));
        assert!(output.contains("PETR4"));
        // 2 * 500 USD at the default rate
        assert!(output.contains("R$ 5.000,00"));
        assert!(output.contains("$450.00"));
    }

    #[test]
    fn test_no_assets() {
        let output = display_as_table(&PortfolioState::default());
        assert!(output.contains("No assets registered"));
    }
}
