use serde::{Deserialize, Serialize};

/// Wire names are camelCase because the review UI exchanges these as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LineItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationVerdict {
    pub is_date_valid: bool,
    pub is_amount_valid: bool,
    pub is_vendor_valid: bool,
    pub is_suspicious: bool,
    pub reasons: Vec<String>,
    pub summary: String,
}

/// Best-effort verdict subset as returned by the AI validation call.
/// Every field is independently optional; the orchestrator overlays what is
/// present onto the deterministic verdict.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiVerdict {
    pub is_date_valid: Option<bool>,
    pub is_amount_valid: Option<bool>,
    pub is_vendor_valid: Option<bool>,
    pub is_suspicious: Option<bool>,
    pub reasons: Option<Vec<String>>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Income
    Gelir,
    /// Expense
    Gider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Standard,
    Admin,
}

/// Persisted invoice entity. Created exactly once at save time; `created_at`
/// never changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: String,
    pub user_id: String,
    pub date: String,
    pub amount: f64,
    pub vendor: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<LineItem>>,
    pub is_date_valid: bool,
    pub is_amount_valid: bool,
    pub is_vendor_valid: bool,
    pub is_suspicious: bool,
    pub suspicious_reasons: Vec<String>,
    pub validation_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_file_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// User-reviewed record as submitted by the UI. Any `userId` the client
/// attaches is ignored; ownership comes from the acting user only.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub date: String,
    pub amount: f64,
    pub vendor: String,
    pub category: Category,
    pub invoice_number: Option<String>,
    pub tax_amount: Option<f64>,
    pub items: Option<Vec<LineItem>>,
    pub is_date_valid: bool,
    pub is_amount_valid: bool,
    pub is_vendor_valid: bool,
    pub is_suspicious: bool,
    pub suspicious_reasons: Vec<String>,
    pub validation_summary: String,
    pub image_file_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

/// Outcome of processing an uploaded image. Partial extraction travels
/// alongside the error so the UI can show whatever was recognized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub extracted: Option<ExtractedFields>,
    pub verdict: Option<ValidationVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    pub fn failure(message: impl Into<String>) -> Self {
        UploadResult {
            extracted: None,
            verdict: None,
            error: Some(message.into()),
        }
    }
}
