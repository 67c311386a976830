use serde_json::Value;

use crate::models::{ExtractedFields, LineItem};
use crate::utils::{normalize_date, parse_locale_decimal};

/// Single place where defaulting and coercion of raw AI output happens.
/// Malformed individual fields degrade to absent; no input `Value` makes
/// this fail.
pub fn normalize_extraction(raw: &Value) -> ExtractedFields {
    ExtractedFields {
        date: coerce_date(raw.get("date")),
        amount: coerce_number(raw.get("amount")),
        vendor: coerce_string(raw.get("vendor")),
        invoice_number: coerce_string(raw.get("invoiceNumber")),
        tax_amount: coerce_number(raw.get("taxAmount")),
        items: coerce_items(raw.get("items")),
    }
}

fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// A present zero is valid; only absence, null and unparseable input map to
/// `None`.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_locale_decimal(s),
        _ => None,
    }
}

/// Unrecognized date strings are kept verbatim so the failing value still
/// reaches the review UI; the validator owns the validity decision.
fn coerce_date(value: Option<&Value>) -> Option<String> {
    let raw = coerce_string(value)?;
    Some(normalize_date(&raw).unwrap_or(raw))
}

fn coerce_items(value: Option<&Value>) -> Option<Vec<LineItem>> {
    let entries = match value {
        Some(Value::Array(entries)) => entries,
        _ => return None,
    };

    let items: Vec<LineItem> = entries
        .iter()
        .filter_map(|entry| {
            let description = coerce_string(entry.get("description"));
            let total_price = coerce_number(entry.get("totalPrice"));
            // An item with neither a description nor a total is noise.
            if description.is_none() && total_price.is_none() {
                return None;
            }
            Some(LineItem {
                description,
                quantity: coerce_number(entry.get("quantity")).unwrap_or(1.0),
                unit_price: coerce_number(entry.get("unitPrice")),
                total_price,
            })
        })
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coerces_locale_strings_and_keeps_present_zero() {
        let raw = json!({
            "date": "15.06.2024",
            "amount": "1.234,56",
            "vendor": "  Acme Corp  ",
            "taxAmount": 0.0
        });
        let fields = normalize_extraction(&raw);
        assert_eq!(fields.date.as_deref(), Some("2024-06-15"));
        assert_eq!(fields.amount, Some(1234.56));
        assert_eq!(fields.vendor.as_deref(), Some("Acme Corp"));
        assert_eq!(fields.tax_amount, Some(0.0));
        assert_eq!(fields.invoice_number, None);
    }

    #[test]
    fn malformed_fields_degrade_to_absent() {
        let raw = json!({
            "date": 17,
            "amount": "not a number",
            "vendor": "",
            "items": "oops"
        });
        let fields = normalize_extraction(&raw);
        assert_eq!(fields.amount, None);
        assert_eq!(fields.vendor, None);
        assert_eq!(fields.items, None);
    }

    #[test]
    fn drops_items_without_description_and_total() {
        let raw = json!({
            "items": [
                { "description": "Kahve", "totalPrice": "12,50" },
                { "quantity": 3 },
                { "totalPrice": 8.0 }
            ]
        });
        let items = normalize_extraction(&raw).items.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quantity, 1.0);
        assert_eq!(items[0].total_price, Some(12.5));
        assert_eq!(items[1].description, None);
        assert_eq!(items[1].total_price, Some(8.0));
    }

    #[test]
    fn unparseable_date_is_kept_verbatim() {
        let raw = json!({ "date": "sometime last week" });
        let fields = normalize_extraction(&raw);
        assert_eq!(fields.date.as_deref(), Some("sometime last week"));
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = json!({
            "date": "01/06/2024",
            "amount": "150,00",
            "vendor": "Acme Corp",
            "items": [{ "description": "Toner", "quantity": 2, "unitPrice": "75,00", "totalPrice": "150,00" }]
        });
        let once = normalize_extraction(&raw);
        let twice = normalize_extraction(&serde_json::to_value(&once).unwrap());
        assert_eq!(once, twice);
    }
}
