//! Parsing of spreadsheet numbers whose decimal convention depends on the
//! field delimiter of the file they came from.

/// Parses `raw` under the convention implied by `delimiter`.
///
/// With `;` files the number is assumed to be written as `1.234,56` when it
/// contains a comma, and as a plain `1.59` otherwise. With any other delimiter
/// commas are thousands separators (`1,234.56`). Blank input is `0.0`;
/// anything unparsable is `NaN` and callers are expected to skip the record.
pub fn parse_locale_number(raw: &str, delimiter: char) -> f64 {
    let raw = raw.trim();
    if raw.is_empty() {
        return 0.0;
    }

    let cleaned = if delimiter == ';' {
        if raw.contains(',') {
            let without_thousands = raw.replace('.', "");
            replace_last_comma(&without_thousands)
        } else {
            raw.to_string()
        }
    } else {
        raw.replace(',', "")
    };

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => f64::NAN,
    }
}

fn replace_last_comma(s: &str) -> String {
    match s.rfind(',') {
        Some(idx) => format!("{}.{}", &s[..idx], &s[idx + 1..]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semicolon_files_use_comma_decimals() {
        assert_eq!(parse_locale_number("1.234,56", ';'), 1234.56);
        assert_eq!(parse_locale_number("1,50", ';'), 1.5);
        assert_eq!(parse_locale_number("1.000.000,25", ';'), 1_000_000.25);
    }

    #[test]
    fn test_semicolon_files_accept_plain_decimals() {
        // A dot without a comma is a decimal point, not a thousands separator
        assert_eq!(parse_locale_number("1.59", ';'), 1.59);
        assert_eq!(parse_locale_number("42", ';'), 42.0);
    }

    #[test]
    fn test_comma_files_strip_thousands() {
        assert_eq!(parse_locale_number("1,234.56", ','), 1234.56);
        assert_eq!(parse_locale_number("12,345,678", ','), 12_345_678.0);
        assert_eq!(parse_locale_number("0.25", ','), 0.25);
    }

    #[test]
    fn test_blank_is_zero() {
        assert_eq!(parse_locale_number("", ';'), 0.0);
        assert_eq!(parse_locale_number("   ", ','), 0.0);
    }

    #[test]
    fn test_garbage_is_nan() {
        assert!(parse_locale_number("abc", ';').is_nan());
        assert!(parse_locale_number("12,3x", ';').is_nan());
        assert!(parse_locale_number("inf", ',').is_nan());
    }

    #[test]
    fn test_negative_numbers() {
        assert_eq!(parse_locale_number("-1.234,5", ';'), -1234.5);
        assert_eq!(parse_locale_number("-1,234.5", ','), -1234.5);
    }
}
