//! Parsing and display of money amounts in Number columns.

/// Parse the longest leading decimal number, like a lenient float reader.
///
/// `"19.99 each"` gives 19.99, `"abc"` gives `None`.
pub fn parse_leading_float(value: &str) -> Option<f64> {
    let s = value.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    let mut seen_exp = false;
    let mut last_valid = 0;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                last_valid = end + 1;
            },
            b'.' if !seen_dot && !seen_exp => seen_dot = true,
            b'e' | b'E' if seen_digit && !seen_exp => {
                seen_exp = true;
                if matches!(bytes.get(end + 1), Some(b'+' | b'-')) {
                    end += 1;
                }
            },
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    s[..last_valid].parse().ok().filter(|n: &f64| n.is_finite())
}

/// Parse a user-entered amount, stripping `$` and thousands separators.
pub fn parse_currency(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|c| *c != '$' && *c != ',').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    parse_leading_float(cleaned)
}

/// Canonical stored form of a Number cell.
///
/// Blank input stays blank, parsable amounts become their shortest decimal
/// form (`"$1,200.50"` becomes `"1200.5"`), anything else is kept verbatim.
pub fn normalize_number_cell(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }
    match parse_currency(raw) {
        Some(amount) => format_plain(amount),
        None => raw.to_owned(),
    }
}

fn format_plain(amount: f64) -> String {
    if amount == 0.0 { "0".to_owned() } else { amount.to_string() }
}

/// Format an amount as US dollars with two decimals, e.g. `$1,234.50`.
pub fn format_usd(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round();
    let whole = (cents / 100.0).trunc();
    let frac = cents - whole * 100.0;
    let digits = format!("{whole:.0}");
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && cents > 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02.0}")
}

/// Display form of a stored Number cell; empty when not a number.
pub fn format_currency(value: &str) -> String {
    parse_leading_float(value).map(format_usd).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_currency_strips_symbols() {
        assert_eq!(parse_currency("$1,234.50"), Some(1234.5));
        assert_eq!(parse_currency(" 19.99 "), Some(19.99));
        assert_eq!(parse_currency("$"), None);
        assert_eq!(parse_currency("free"), None);
    }

    #[test]
    fn test_leading_float_prefix() {
        assert_eq!(parse_leading_float("12abc"), Some(12.0));
        assert_eq!(parse_leading_float("-3.5"), Some(-3.5));
        assert_eq!(parse_leading_float("1e2x"), Some(100.0));
        assert_eq!(parse_leading_float("."), None);
    }

    #[test]
    fn test_normalize_number_cell() {
        assert_eq!(normalize_number_cell("19.990"), "19.99");
        assert_eq!(normalize_number_cell("$20.00"), "20");
        assert_eq!(normalize_number_cell("   "), "");
        assert_eq!(normalize_number_cell("gift"), "gift");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(19.99), "$19.99");
        assert_eq!(format_usd(1234.5), "$1,234.50");
        assert_eq!(format_usd(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_usd(-5.0), "-$5.00");
        assert_eq!(format_usd(0.0), "$0.00");
    }

    #[test]
    fn test_format_currency_of_cell() {
        assert_eq!(format_currency("19.99"), "$19.99");
        assert_eq!(format_currency(""), "");
    }
}
