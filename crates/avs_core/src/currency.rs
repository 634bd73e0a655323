//! Brazilian currency notation: `.` groups thousands, `,` separates decimals.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a Brazilian decimal amount: {input:?}")]
pub struct ParseError {
    pub input: String,
}

/// Parse a Brazilian-formatted amount such as `"1.234,56"` into a number.
pub fn parse_amount(s: &str) -> Result<f64, ParseError> {
    let trimmed = s.trim();
    let normalized = trimmed.replace('.', "").replace(',', ".");
    if !is_plain_decimal(&normalized) {
        return Err(ParseError {
            input: s.to_string(),
        });
    }
    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ParseError {
            input: s.to_string(),
        })
}

/// Format a number with two decimals in Brazilian notation, e.g. `1234.5` -> `"1.234,50"`.
pub fn format_amount(v: f64) -> String {
    let fixed = format!("{:.2}", v.abs());
    let (integer_part, decimal_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = integer_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*c);
    }

    let is_zero = integer_part.chars().chain(decimal_part.chars()).all(|c| c == '0');
    let sign = if v.is_sign_negative() && !is_zero { "-" } else { "" };
    format!("{sign}{grouped},{decimal_part}")
}

// Rejects what `f64::from_str` would otherwise accept (`inf`, `NaN`, exponents).
fn is_plain_decimal(s: &str) -> bool {
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    let mut seen_digit = false;
    let mut seen_point = false;
    for c in body.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_point => seen_point = true,
            _ => return false,
        }
    }
    seen_digit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thousands_and_decimal_separators() {
        assert_eq!(parse_amount("1.234,56").unwrap(), 1234.56);
        assert_eq!(parse_amount("  50,50 ").unwrap(), 50.5);
        assert_eq!(parse_amount("12.345.678,90").unwrap(), 12_345_678.90);
        assert_eq!(parse_amount("7").unwrap(), 7.0);
    }

    #[test]
    fn rejects_non_numeric_input() {
        for bad in ["", "   ", "R$ 10,00", "abc", "1,2,3", "inf", "NaN", "1e3", "-"] {
            assert!(parse_amount(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_amounts_beyond_f64_range() {
        let huge = "9".repeat(400) + ",00";
        assert!(parse_amount(&huge).is_err());
    }

    #[test]
    fn formats_with_grouping() {
        assert_eq!(format_amount(0.0), "0,00");
        assert_eq!(format_amount(0.1), "0,10");
        assert_eq!(format_amount(999.999), "1.000,00");
        assert_eq!(format_amount(1234.5), "1.234,50");
        assert_eq!(format_amount(1_234_567.891), "1.234.567,89");
        assert_eq!(format_amount(-42.0), "-42,00");
        assert_eq!(format_amount(-0.001), "0,00");
    }

    #[test]
    fn format_inverts_parse_for_two_decimal_strings() {
        for s in ["0,00", "1,05", "100,00", "150,50", "1.234,56", "98.765.432,10"] {
            assert_eq!(format_amount(parse_amount(s).unwrap()), s);
        }
    }

    #[test]
    fn parse_inverts_format_within_rounding() {
        for v in [0.0, 0.01, 19.9, 1500.25, 123_456.78] {
            let back = parse_amount(&format_amount(v)).unwrap();
            assert!((back - v).abs() < 1e-9, "{v} came back as {back}");
        }
    }
}
