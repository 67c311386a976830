//! Core of an invoice/receipt scanning application: AI field extraction from
//! an uploaded photo, normalization of the loosely-typed AI output,
//! business-rule validation merged with an AI-assisted verdict, and
//! per-user persistence of the reviewed record.
//!
//! The UI, routing and session provider are external; they call
//! [`process_upload`] with the image and later [`save_invoice`] with the
//! reviewed record and the acting user's identifier. The identity is always
//! passed explicitly by the caller out of its own live session.

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    AiVerdict, Category, ExtractedFields, InvoiceRecord, LineItem, Role, UploadResult,
    UserProfile, ValidationVerdict,
};
pub use services::openai::{InvoiceAi, OpenAiClient};
pub use services::persistence::{get_invoice, save_invoice};
pub use services::processor::process_upload;
pub use services::session::{ensure_profile, resolve_acting_user, ActingUser};
pub use services::validator::{merge_verdicts, validate_fields, validate_fields_now, MAX_AMOUNT};

/// Install a tracing subscriber honoring `RUST_LOG`. Call once at startup.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
