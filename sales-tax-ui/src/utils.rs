use rust_decimal::Decimal;
use sales_tax_core::calculations::common::round_half_up;
use thiserror::Error;

/// Error returned when a string cannot be parsed as a [`Decimal`].
#[derive(Debug, Error)]
#[error("invalid number '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Normalizes input for decimal parsing: trims whitespace and removes commas (thousands separator).
fn normalize_decimal_input(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses a string into a [`Decimal`].
///
/// Handles comma as thousands separator (e.g. `"1,234.56"`).
/// Empty or whitespace-only input is treated as 0, which every amount
/// validator then rejects as not positive.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }
    normalized.parse().map_err(|e| {
        tracing::debug!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Parses an optional [`Decimal`], as typed at a "keep current value" prompt.
///
/// Empty or whitespace-only input is `Ok(None)`; anything else must parse.
pub fn parse_optional_decimal(s: &str) -> Result<Option<Decimal>, ParseDecimalError> {
    if normalize_decimal_input(s).is_empty() {
        Ok(None)
    } else {
        parse_decimal(s).map(Some)
    }
}

/// Trimmed text, or `None` when nothing was typed.
pub fn optional_text(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Formats an amount of money with two decimals and comma thousands
/// separators, e.g. `1,540.00`.
pub fn format_money(amount: Decimal) -> String {
    let fixed = format!("{:.2}", round_half_up(amount).abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount.is_sign_negative() && !round_half_up(amount).is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{cents}")
}

/// Formats a rate held as a fraction as a percentage, e.g. `0.19` → `19%`.
pub fn format_rate(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_decimal_accepts_comma_thousands_separator() {
        assert_eq!(parse_decimal("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal("1,234,567.89").unwrap(), dec!(1234567.89));
    }

    #[test]
    fn parse_decimal_trim_whitespace() {
        assert_eq!(parse_decimal("  123.45  ").unwrap(), dec!(123.45));
    }

    #[test]
    fn parse_decimal_empty_treated_as_zero() {
        assert_eq!(parse_decimal("").unwrap(), Decimal::ZERO);
        assert_eq!(parse_decimal("   ").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn parse_decimal_invalid_returns_error() {
        let err = parse_decimal("abc").unwrap_err();
        assert!(err.to_string().starts_with("invalid number 'abc'"));
    }

    #[test]
    fn parse_optional_decimal_keeps_empty_and_rejects_garbage() {
        assert_eq!(parse_optional_decimal("1,234.56").unwrap(), Some(dec!(1234.56)));
        assert_eq!(parse_optional_decimal("").unwrap(), None);
        assert_eq!(parse_optional_decimal("   ").unwrap(), None);
        assert!(parse_optional_decimal("12a").is_err());
    }

    #[test]
    fn optional_text_trims() {
        assert_eq!(optional_text("  Beer "), Some("Beer".to_string()));
        assert_eq!(optional_text("   "), None);
    }

    #[test]
    fn format_money_groups_thousands() {
        assert_eq!(format_money(dec!(0)), "0.00");
        assert_eq!(format_money(dec!(999)), "999.00");
        assert_eq!(format_money(dec!(1540)), "1,540.00");
        assert_eq!(format_money(dec!(1500000)), "1,500,000.00");
        assert_eq!(format_money(dec!(15120.5)), "15,120.50");
        assert_eq!(format_money(dec!(-2500.005)), "-2,500.01");
    }

    #[test]
    fn format_rate_as_percentage() {
        assert_eq!(format_rate(dec!(0.19)), "19%");
        assert_eq!(format_rate(dec!(0.05)), "5%");
        assert_eq!(format_rate(dec!(0.085)), "8.5%");
        assert_eq!(format_rate(Decimal::ZERO), "0%");
    }
}
