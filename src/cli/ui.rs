use crate::core::model::Currency;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    TotalLabel,
    TotalValue,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::TotalLabel => style(text).bold(),
        StyleType::TotalValue => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn number_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// Colors a signed amount green when non-negative and red otherwise.
pub fn profit_cell(value: f64, text: String) -> Cell {
    let color = if value >= 0.0 { Color::Green } else { Color::Red };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Right)
}

pub fn percent_cell(value: f64) -> Cell {
    profit_cell(value, format_percent(value))
}

/// Creates a dimmed placeholder cell.
pub fn na_cell() -> Cell {
    Cell::new("-")
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

fn group_thousands(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped
}

/// Formats money the way each currency is usually written: `R$ 1.234,56`
/// for BRL and `$1,234.56` for USD.
pub fn format_money(value: f64, currency: Currency) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };

    match currency {
        Currency::Brl => format!(
            "{sign}{} {},{frac_part}",
            currency.symbol(),
            group_thousands(int_part, '.')
        ),
        Currency::Usd => format!(
            "{sign}{}{}.{frac_part}",
            currency.symbol(),
            group_thousands(int_part, ',')
        ),
    }
}

/// Creates a new `indicatif::ProgressBar` with standard styling.
pub fn new_progress_bar(len: u64, with_message: bool) -> ProgressBar {
    let template = if with_message {
        "{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})"
    } else {
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})"
    };

    let pb = ProgressBar::new(len);
    let bar_style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(bar_style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money_brl() {
        assert_eq!(format_money(1234.56, Currency::Brl), "R$ 1.234,56");
        assert_eq!(format_money(0.0, Currency::Brl), "R$ 0,00");
        assert_eq!(format_money(1_000_000.0, Currency::Brl), "R$ 1.000.000,00");
        assert_eq!(format_money(-50.5, Currency::Brl), "-R$ 50,50");
    }

    #[test]
    fn test_format_money_usd() {
        assert_eq!(format_money(1234.56, Currency::Usd), "$1,234.56");
        assert_eq!(format_money(999.999, Currency::Usd), "$1,000.00");
        assert_eq!(format_money(-0.001, Currency::Usd), "$0.00");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1", '.'), "1");
        assert_eq!(group_thousands("123", '.'), "123");
        assert_eq!(group_thousands("1234", '.'), "1.234");
        assert_eq!(group_thousands("123456", ','), "123,456");
    }
}
