use base64::{engine::general_purpose, Engine as _};
use tracing::{debug, warn};

use crate::models::{ExtractedFields, UploadResult};
use crate::services::normalizer::normalize_extraction;
use crate::services::openai::InvoiceAi;
use crate::services::validator::{merge_verdicts, validate_fields_now};
use crate::utils::sha256_hex;

const ERR_IMAGE_DATA: &str =
    "imageData must be a base64 data URI with an image MIME type (data:image/...;base64,...)";
const ERR_EXTRACTION_FAILED: &str = "Extraction failed completely";

/// Run the full upload pipeline: input check, AI extraction, normalization,
/// AI-assisted validation merged with the deterministic verdict. Failures are
/// returned in the result, never raised; no storage writes happen here.
pub async fn process_upload(ai: &dyn InvoiceAi, image_data: &str) -> UploadResult {
    if !is_image_data_uri(image_data) {
        return UploadResult::failure(ERR_IMAGE_DATA);
    }

    // Hash instead of payload in log lines; uploads can be megabytes.
    let fingerprint = sha256_hex(image_data.as_bytes());
    let upload = &fingerprint[..12];
    debug!(upload, "starting extraction");

    let raw = match ai.extract_fields(image_data).await {
        Ok(value) if value.is_object() => value,
        Ok(_) => {
            warn!(upload, "extraction returned no result");
            return UploadResult::failure(ERR_EXTRACTION_FAILED);
        }
        Err(err) => {
            warn!(upload, error = %err, "extraction call failed");
            let message = err.to_string();
            return UploadResult::failure(if message.trim().is_empty() {
                ERR_EXTRACTION_FAILED.to_string()
            } else {
                message
            });
        }
    };

    let fields = normalize_extraction(&raw);

    let missing = missing_required(&fields);
    if !missing.is_empty() {
        debug!(upload, missing = ?missing, "partial extraction");
        return UploadResult {
            error: Some(format!(
                "Extraction is missing required fields: {}",
                missing.join(", ")
            )),
            extracted: Some(fields),
            verdict: None,
        };
    }

    let date = fields.date.clone().unwrap_or_default();
    let amount = fields.amount.unwrap_or_default();
    let vendor = fields.vendor.clone().unwrap_or_default();

    let deterministic = validate_fields_now(&date, amount, &vendor);
    let ai_verdict = match ai.validate_fields(&date, amount, &vendor).await {
        Ok(verdict) => verdict,
        Err(err) => {
            warn!(upload, error = %err, "validation call failed");
            let message = err.to_string();
            return UploadResult::failure(if message.trim().is_empty() {
                ERR_EXTRACTION_FAILED.to_string()
            } else {
                message
            });
        }
    };

    let verdict = merge_verdicts(deterministic, &ai_verdict);
    debug!(upload, suspicious = verdict.is_suspicious, "upload processed");

    UploadResult {
        extracted: Some(fields),
        verdict: Some(verdict),
        error: None,
    }
}

/// Required-for-validation fields, reported in fixed order.
fn missing_required(fields: &ExtractedFields) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if fields.date.is_none() {
        missing.push("Date");
    }
    if fields.amount.is_none() {
        missing.push("Amount");
    }
    if fields.vendor.is_none() {
        missing.push("Vendor");
    }
    missing
}

fn is_image_data_uri(data: &str) -> bool {
    let Some(rest) = data.strip_prefix("data:image/") else {
        return false;
    };
    let Some((_, payload)) = rest.split_once(";base64,") else {
        return false;
    };
    !payload.is_empty() && general_purpose::STANDARD.decode(payload).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_base64_image_data_uris() {
        assert!(is_image_data_uri("data:image/png;base64,aGVsbG8="));
        assert!(is_image_data_uri("data:image/jpeg;base64,aGVsbG8="));
        assert!(!is_image_data_uri("hello"));
        assert!(!is_image_data_uri("data:application/pdf;base64,aGVsbG8="));
        assert!(!is_image_data_uri("data:image/png;base64,"));
        assert!(!is_image_data_uri("data:image/png;base64,@@not-base64@@"));
        assert!(!is_image_data_uri("data:image/png,plain"));
    }

    #[test]
    fn missing_fields_are_reported_in_fixed_order() {
        let fields = ExtractedFields {
            date: None,
            amount: None,
            vendor: Some("Acme Corp".into()),
            invoice_number: None,
            tax_amount: None,
            items: None,
        };
        assert_eq!(missing_required(&fields), vec!["Date", "Amount"]);
    }
}
