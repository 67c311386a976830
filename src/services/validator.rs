use chrono::{Months, NaiveDate, Utc};

use crate::models::{AiVerdict, ValidationVerdict};
use crate::utils::normalize_date;

/// Upper bound on a plausible single-invoice amount, in currency units.
pub const MAX_AMOUNT: f64 = 1_000_000.0;
/// Invoices older than this are flagged.
pub const DATE_WINDOW_MONTHS: u32 = 24;

pub const REASON_DATE: &str =
    "Date is invalid: it must be within the last 2 years and not in the future";
pub const REASON_AMOUNT: &str =
    "Amount is invalid: it must be greater than 0 and less than 1000000";
pub const REASON_VENDOR: &str =
    "Vendor is invalid: the name must be longer than 2 characters";
pub const SUMMARY_VALID: &str = "The invoice data appears valid.";
const SUMMARY_SUSPICIOUS_PREFIX: &str = "The invoice data looks suspicious.";
const FALLBACK_REASON: &str = "The invoice was flagged as suspicious";

/// Deterministic baseline verdict, independent of any AI opinion.
/// `today` is injected so the date window is testable.
pub fn validate_fields(date: &str, amount: f64, vendor: &str, today: NaiveDate) -> ValidationVerdict {
    let is_date_valid = match normalize_date(date)
        .and_then(|iso| NaiveDate::parse_from_str(&iso, "%Y-%m-%d").ok())
    {
        Some(parsed) => {
            let oldest = today
                .checked_sub_months(Months::new(DATE_WINDOW_MONTHS))
                .unwrap_or(today);
            parsed >= oldest && parsed <= today
        }
        None => false,
    };
    let is_amount_valid = amount > 0.0 && amount < MAX_AMOUNT;
    let is_vendor_valid = vendor.trim().chars().count() > 2;

    let mut reasons = Vec::new();
    if !is_date_valid {
        reasons.push(REASON_DATE.to_string());
    }
    if !is_amount_valid {
        reasons.push(REASON_AMOUNT.to_string());
    }
    if !is_vendor_valid {
        reasons.push(REASON_VENDOR.to_string());
    }

    let is_suspicious = !reasons.is_empty();
    let summary = summarize(is_suspicious, &reasons);

    reconciled(ValidationVerdict {
        is_date_valid,
        is_amount_valid,
        is_vendor_valid,
        is_suspicious,
        reasons,
        summary,
    })
}

pub fn validate_fields_now(date: &str, amount: f64, vendor: &str) -> ValidationVerdict {
    validate_fields(date, amount, vendor, Utc::now().date_naive())
}

/// Overlay the AI verdict onto the deterministic one, per field: the AI value
/// wins when it is present (for reasons: non-empty), otherwise the
/// deterministic value stands.
pub fn merge_verdicts(deterministic: ValidationVerdict, ai: &AiVerdict) -> ValidationVerdict {
    let reasons = match &ai.reasons {
        Some(reasons) if !reasons.is_empty() => reasons.clone(),
        _ => deterministic.reasons,
    };
    let summary = match &ai.summary {
        Some(summary) if !summary.trim().is_empty() => summary.clone(),
        _ => deterministic.summary,
    };

    reconciled(ValidationVerdict {
        is_date_valid: ai.is_date_valid.unwrap_or(deterministic.is_date_valid),
        is_amount_valid: ai.is_amount_valid.unwrap_or(deterministic.is_amount_valid),
        is_vendor_valid: ai.is_vendor_valid.unwrap_or(deterministic.is_vendor_valid),
        is_suspicious: ai.is_suspicious.unwrap_or(deterministic.is_suspicious),
        reasons,
        summary,
    })
}

fn summarize(is_suspicious: bool, reasons: &[String]) -> String {
    if is_suspicious {
        format!("{} Reasons: {}", SUMMARY_SUSPICIOUS_PREFIX, reasons.join(", "))
    } else {
        SUMMARY_VALID.to_string()
    }
}

/// Every verdict passes through here: leftover reasons force the suspicious
/// flag, and a suspicious verdict never ships with an empty reason list.
fn reconciled(mut verdict: ValidationVerdict) -> ValidationVerdict {
    if !verdict.reasons.is_empty() {
        verdict.is_suspicious = true;
    }
    if verdict.is_suspicious && verdict.reasons.is_empty() {
        verdict.reasons.push(FALLBACK_REASON.to_string());
        verdict.summary = summarize(true, &verdict.reasons);
    }
    verdict
}
