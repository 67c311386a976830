use chrono::{NaiveDate, Utc};
use sha2::{Digest, Sha256};

pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Parse a possibly locale-formatted currency string into a plain number.
///
/// Accepted inputs (currency symbols and whitespace are stripped first):
///   "1234.56"    -> 1234.56
///   "1234,56"    -> 1234.56
///   "1.234,56"   -> 1234.56   (dot thousands, comma decimal)
///   "1,234.56"   -> 1234.56   (comma thousands, dot decimal)
///   "1.234.567"  -> 1234567.0 (repeated separator is always grouping)
///
/// A lone comma followed by one or two digits is read as a decimal
/// separator; otherwise commas are grouping. Anything that still fails to
/// parse yields `None`.
pub fn parse_locale_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) => cleaned,
        (0, 1) => cleaned,
        (0, _) => cleaned.replace('.', ""),
        (1, 0) => {
            let fraction_len = cleaned.rfind(',').map(|i| cleaned.len() - i - 1)?;
            if fraction_len <= 2 {
                cleaned.replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
        (_, 0) => cleaned.replace(',', ""),
        _ => {
            let last_comma = cleaned.rfind(',')?;
            let last_dot = cleaned.rfind('.')?;
            if last_comma > last_dot {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
    };

    normalized.parse::<f64>().ok()
}

/// Canonicalize a date string to ISO `YYYY-MM-DD`. Returns `None` when the
/// input matches none of the accepted patterns.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let formats = [
        "%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d", "%Y.%m.%d", "%d-%m-%Y",
    ];
    for fmt in formats.iter() {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_locale_decimals() {
        assert_eq!(parse_locale_decimal("1234.56"), Some(1234.56));
        assert_eq!(parse_locale_decimal("1234,56"), Some(1234.56));
        assert_eq!(parse_locale_decimal("1.234,56"), Some(1234.56));
        assert_eq!(parse_locale_decimal("1,234.56"), Some(1234.56));
        assert_eq!(parse_locale_decimal("1.234.567"), Some(1_234_567.0));
        assert_eq!(parse_locale_decimal("₺ 150,00"), Some(150.0));
        assert_eq!(parse_locale_decimal("0"), Some(0.0));
    }

    #[test]
    fn grouping_only_comma_is_not_a_decimal() {
        assert_eq!(parse_locale_decimal("1,234"), Some(1234.0));
        assert_eq!(parse_locale_decimal("12,34"), Some(12.34));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_locale_decimal(""), None);
        assert_eq!(parse_locale_decimal("n/a"), None);
        assert_eq!(parse_locale_decimal("-,-"), None);
    }

    #[test]
    fn normalizes_known_date_formats() {
        assert_eq!(normalize_date("2024-06-01"), Some("2024-06-01".into()));
        assert_eq!(normalize_date("01.06.2024"), Some("2024-06-01".into()));
        assert_eq!(normalize_date("01/06/2024"), Some("2024-06-01".into()));
        assert_eq!(normalize_date("2024/06/01"), Some("2024-06-01".into()));
        assert_eq!(normalize_date("01-06-2024"), Some("2024-06-01".into()));
        assert_eq!(normalize_date("um 2024"), None);
        assert_eq!(normalize_date(""), None);
    }
}
