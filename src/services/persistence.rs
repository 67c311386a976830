use jsonschema::JSONSchema;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{InvoiceDraft, InvoiceRecord, Role};
use crate::services::session::ActingUser;
use crate::utils::now_rfc3339;

/// Persist a user-reviewed invoice under the acting user's identity.
///
/// The payload is the JSON the review UI submits; it is checked against the
/// save-time contract before anything touches the store, and the reported
/// failure concatenates every violated field, not just the first. Whatever
/// `userId` the payload carries is discarded: ownership always comes from
/// `acting_user_id`. Exactly one new record per successful call.
pub fn save_invoice(db: &Database, payload: &Value, acting_user_id: &str) -> Result<String> {
    let user = crate::services::session::resolve_acting_user(Some(acting_user_id))?;

    let schema = save_contract_schema();
    if let Err(errors) = schema.validate(payload) {
        let detail = errors
            .map(|err| {
                let path = err.instance_path.to_string();
                if path.is_empty() {
                    err.to_string()
                } else {
                    format!("{}: {}", path, err)
                }
            })
            .collect::<Vec<_>>()
            .join("; ");
        warn!(user = %user.uid(), "save rejected: {}", detail);
        return Err(Error::InvalidRecord(detail));
    }

    let draft: InvoiceDraft = serde_json::from_value(payload.clone())?;

    let now = now_rfc3339();
    let record = InvoiceRecord {
        id: Uuid::new_v4().to_string(),
        user_id: user.uid().to_string(),
        date: draft.date,
        amount: draft.amount,
        vendor: draft.vendor,
        category: draft.category,
        invoice_number: draft.invoice_number,
        tax_amount: draft.tax_amount,
        items: draft.items,
        is_date_valid: draft.is_date_valid,
        is_amount_valid: draft.is_amount_valid,
        is_vendor_valid: draft.is_vendor_valid,
        is_suspicious: draft.is_suspicious,
        suspicious_reasons: draft.suspicious_reasons,
        validation_summary: draft.validation_summary,
        image_file_name: draft.image_file_name,
        created_at: now.clone(),
        updated_at: now,
    };

    if let Err(err) = db.insert_invoice(&record) {
        let _ = db.log_processing(
            Some(&record.id),
            Some(user.uid()),
            "save",
            "failed",
            Some(&err.to_string()),
        );
        return Err(err);
    }

    let _ = db.log_processing(Some(&record.id), Some(user.uid()), "save", "success", None);
    info!(invoice = %record.id, user = %user.uid(), "invoice saved");
    Ok(record.id)
}

/// Owner-or-admin read, mirroring the document store's access policy.
pub fn get_invoice(db: &Database, id: &str, user: &ActingUser) -> Result<Option<InvoiceRecord>> {
    let Some(record) = db.get_invoice_by_id(id)? else {
        return Ok(None);
    };
    if record.user_id == user.uid() {
        return Ok(Some(record));
    }
    match db.get_user(user.uid())? {
        Some(profile) if profile.role == Role::Admin => Ok(Some(record)),
        _ => Err(Error::Forbidden),
    }
}

fn save_contract_schema() -> JSONSchema {
    let schema = json!({
        "type": "object",
        "additionalProperties": false,
        "required": [
            "date", "amount", "vendor", "category",
            "isDateValid", "isAmountValid", "isVendorValid", "isSuspicious",
            "suspiciousReasons", "validationSummary"
        ],
        "properties": {
            "userId": {"type": "string"},
            "date": {"type": "string"},
            "amount": {"type": "number"},
            "vendor": {"type": "string", "minLength": 1},
            "category": {"enum": ["gelir", "gider"]},
            "invoiceNumber": {"type": ["string", "null"]},
            "taxAmount": {"type": ["number", "null"]},
            "items": {
                "type": ["array", "null"],
                "items": {
                    "type": "object",
                    "required": ["description", "quantity", "unitPrice", "totalPrice"],
                    "properties": {
                        "description": {"type": "string"},
                        "quantity": {"type": "number"},
                        "unitPrice": {"type": "number"},
                        "totalPrice": {"type": "number"}
                    }
                }
            },
            "isDateValid": {"type": "boolean"},
            "isAmountValid": {"type": "boolean"},
            "isVendorValid": {"type": "boolean"},
            "isSuspicious": {"type": "boolean"},
            "suspiciousReasons": {"type": "array", "items": {"type": "string"}},
            "validationSummary": {"type": "string"},
            "imageFileName": {"type": ["string", "null"]}
        }
    });

    JSONSchema::compile(&schema).expect("Invalid JSON schema")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, UserProfile};
    use crate::services::session::resolve_acting_user;

    fn valid_payload() -> Value {
        json!({
            "date": "2024-06-01",
            "amount": 150.0,
            "vendor": "Acme Corp",
            "category": "gider",
            "isDateValid": true,
            "isAmountValid": true,
            "isVendorValid": true,
            "isSuspicious": false,
            "suspiciousReasons": [],
            "validationSummary": "The invoice data appears valid."
        })
    }

    #[test]
    fn save_creates_one_record_with_shared_timestamps() {
        let db = Database::new_in_memory().unwrap();
        let id = save_invoice(&db, &valid_payload(), "user-1").unwrap();

        let record = db.get_invoice_by_id(&id).unwrap().unwrap();
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.category, Category::Gider);
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn missing_identity_is_distinguishable_and_writes_nothing() {
        let db = Database::new_in_memory().unwrap();
        let result = save_invoice(&db, &valid_payload(), "");
        assert!(matches!(result, Err(Error::NotAuthenticated)));
    }

    #[test]
    fn payload_user_id_never_wins_over_acting_user() {
        let db = Database::new_in_memory().unwrap();
        let mut payload = valid_payload();
        payload["userId"] = json!("attacker");

        let id = save_invoice(&db, &payload, "user-1").unwrap();
        let record = db.get_invoice_by_id(&id).unwrap().unwrap();
        assert_eq!(record.user_id, "user-1");
    }

    #[test]
    fn schema_failure_reports_every_violation() {
        let db = Database::new_in_memory().unwrap();
        let mut payload = valid_payload();
        payload["vendor"] = json!("");
        payload["amount"] = json!("150.00");
        payload["category"] = json!("other");

        let err = save_invoice(&db, &payload, "user-1").unwrap_err();
        let Error::InvalidRecord(detail) = err else {
            panic!("expected InvalidRecord, got {:?}", err);
        };
        assert!(detail.contains("/vendor"), "missing vendor path: {}", detail);
        assert!(detail.contains("/amount"), "missing amount path: {}", detail);
        assert!(detail.contains("/category"), "missing category path: {}", detail);
    }

    #[test]
    fn reads_are_owner_or_admin_only() {
        let db = Database::new_in_memory().unwrap();
        let id = save_invoice(&db, &valid_payload(), "owner").unwrap();

        let owner = resolve_acting_user(Some("owner")).unwrap();
        assert!(get_invoice(&db, &id, &owner).unwrap().is_some());

        let stranger = resolve_acting_user(Some("stranger")).unwrap();
        assert!(matches!(
            get_invoice(&db, &id, &stranger),
            Err(Error::Forbidden)
        ));

        db.insert_user(&UserProfile {
            uid: "root".into(),
            email: "root@example.com".into(),
            role: Role::Admin,
            created_at: now_rfc3339(),
        })
        .unwrap();
        let admin = resolve_acting_user(Some("root")).unwrap();
        assert!(get_invoice(&db, &id, &admin).unwrap().is_some());
    }
}
