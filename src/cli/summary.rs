use super::ui;
use crate::core::analytics::PortfolioSnapshot;
use crate::core::state::PortfolioState;
use comfy_table::Cell;

const TOP_POSITIONS: usize = 3;

impl PortfolioSnapshot {
    pub fn display_as_dashboard(&self) -> String {
        let currency = self.display_currency;
        let money = |v: f64| ui::format_money(v, currency);

        let mut output = format!(
            "{} ({})\n\n",
            ui::style_text("Portfolio", ui::StyleType::Title),
            currency.code()
        );

        let mut totals = ui::new_styled_table();
        totals.set_header(vec![
            ui::header_cell("Net Worth"),
            ui::header_cell("Invested"),
            ui::header_cell("Cash"),
            ui::header_cell("Profit"),
            ui::header_cell("Profit (%)"),
        ]);
        totals.add_row(vec![
            ui::number_cell(money(self.total_net_worth)),
            ui::number_cell(money(self.total_invested)),
            ui::number_cell(money(self.cash_display)),
            ui::profit_cell(self.total_profit, money(self.total_profit)),
            ui::percent_cell(self.total_profit_percent),
        ]);
        output.push_str(&totals.to_string());

        let allocation = self.allocation();
        if allocation.is_empty() {
            output.push_str(&format!(
                "\n\n{}",
                ui::style_text(
                    "No positions yet. Add an asset and a transaction to get started.",
                    ui::StyleType::Subtle
                )
            ));
            return output;
        }

        let mut alloc_table = ui::new_styled_table();
        alloc_table.set_header(vec![
            ui::header_cell("Asset"),
            ui::header_cell("Name"),
            ui::header_cell(&format!("Value ({})", currency.code())),
            ui::header_cell("Weight (%)"),
        ]);
        for item in &allocation {
            let label = if item.is_cash {
                Cell::new(ui::style_text(&item.label, ui::StyleType::Subtle))
            } else {
                Cell::new(&item.label)
            };
            alloc_table.add_row(vec![
                label,
                Cell::new(&item.name),
                ui::number_cell(money(item.value_display)),
                ui::number_cell(ui::format_percent(item.percent)),
            ]);
        }
        output.push_str(&format!(
            "\n\n{}\n",
            ui::style_text("Allocation", ui::StyleType::TotalLabel)
        ));
        output.push_str(&alloc_table.to_string());

        let top = self.top_positions(TOP_POSITIONS);
        if !top.is_empty() {
            let mut top_table = ui::new_styled_table();
            top_table.set_header(vec![
                ui::header_cell("Asset"),
                ui::header_cell(&format!("Value ({})", currency.code())),
                ui::header_cell("Profit (%)"),
            ]);
            for position in top {
                top_table.add_row(vec![
                    Cell::new(&position.asset.symbol),
                    ui::number_cell(money(position.current_value_display)),
                    ui::percent_cell(position.profit_percent),
                ]);
            }
            output.push_str(&format!(
                "\n\n{}\n",
                ui::style_text("Top Positions", ui::StyleType::TotalLabel)
            ));
            output.push_str(&top_table.to_string());
        }

        output
    }
}

pub fn run(state: &PortfolioState) {
    println!("{}", state.snapshot().display_as_dashboard());
}
