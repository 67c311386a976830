use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::models::{Category, InvoiceRecord, LineItem, Role, UserProfile};
use crate::utils::now_rfc3339;

/// Client for the invoice document store. Two logical collections:
/// `invoices` (create-only from this crate) and `users` (read/lazy-create),
/// plus a processing log.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    pub fn new_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;

        let migrations = vec![
            (
                "001_create_invoices.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/001_create_invoices.sql"
                )),
            ),
            (
                "002_create_users.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/002_create_users.sql"
                )),
            ),
            (
                "003_create_processing_logs.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/003_create_processing_logs.sql"
                )),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM schema_migrations WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            if applied.is_none() {
                let tx = self.conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
                    params![name],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    }

    /// Create-only: every save is a fresh row, there is no upsert path.
    pub fn insert_invoice(&self, record: &InvoiceRecord) -> Result<()> {
        let items_json = match &record.items {
            Some(items) => Some(serde_json::to_string(items)?),
            None => None,
        };
        let reasons_json = serde_json::to_string(&record.suspicious_reasons)?;

        self.conn.execute(
            "INSERT INTO invoices (
                id, user_id, invoice_date, amount, vendor, category, invoice_number,
                tax_amount, items_json, is_date_valid, is_amount_valid, is_vendor_valid,
                is_suspicious, suspicious_reasons_json, validation_summary,
                image_file_name, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                record.id,
                record.user_id,
                record.date,
                record.amount,
                record.vendor,
                category_str(record.category),
                record.invoice_number,
                record.tax_amount,
                items_json,
                record.is_date_valid,
                record.is_amount_valid,
                record.is_vendor_valid,
                record.is_suspicious,
                reasons_json,
                record.validation_summary,
                record.image_file_name,
                record.created_at,
                record.updated_at
            ],
        )?;
        Ok(())
    }

    pub fn get_invoice_by_id(&self, id: &str) -> Result<Option<InvoiceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, invoice_date, amount, vendor, category, invoice_number,
                    tax_amount, items_json, is_date_valid, is_amount_valid, is_vendor_valid,
                    is_suspicious, suspicious_reasons_json, validation_summary,
                    image_file_name, created_at, updated_at
             FROM invoices WHERE id = ?1",
        )?;

        let row = stmt
            .query_row(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<f64>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, bool>(9)?,
                    row.get::<_, bool>(10)?,
                    row.get::<_, bool>(11)?,
                    row.get::<_, bool>(12)?,
                    row.get::<_, String>(13)?,
                    row.get::<_, String>(14)?,
                    row.get::<_, Option<String>>(15)?,
                    row.get::<_, String>(16)?,
                    row.get::<_, String>(17)?,
                ))
            })
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Option<Vec<LineItem>> = match &row.8 {
            Some(json) => Some(serde_json::from_str(json)?),
            None => None,
        };
        let suspicious_reasons: Vec<String> = serde_json::from_str(&row.13)?;

        Ok(Some(InvoiceRecord {
            id: row.0,
            user_id: row.1,
            date: row.2,
            amount: row.3,
            vendor: row.4,
            category: parse_category(&row.5)?,
            invoice_number: row.6,
            tax_amount: row.7,
            items,
            is_date_valid: row.9,
            is_amount_valid: row.10,
            is_vendor_valid: row.11,
            is_suspicious: row.12,
            suspicious_reasons,
            validation_summary: row.14,
            image_file_name: row.15,
            created_at: row.16,
            updated_at: row.17,
        }))
    }

    pub fn get_user(&self, uid: &str) -> Result<Option<UserProfile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT uid, email, role, created_at FROM users WHERE uid = ?1")?;

        let row = stmt
            .query_row(params![uid], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()?;

        match row {
            Some((uid, email, role, created_at)) => Ok(Some(UserProfile {
                uid,
                email,
                role: parse_role(&role)?,
                created_at,
            })),
            None => Ok(None),
        }
    }

    pub fn insert_user(&self, profile: &UserProfile) -> Result<()> {
        self.conn.execute(
            "INSERT INTO users (uid, email, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                profile.uid,
                profile.email,
                role_str(profile.role),
                profile.created_at
            ],
        )?;
        Ok(())
    }

    pub fn log_processing(
        &self,
        invoice_id: Option<&str>,
        user_id: Option<&str>,
        process_type: &str,
        status: &str,
        message: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO processing_logs (id, invoice_id, user_id, process_type, status, message, created_at)
             VALUES (hex(randomblob(16)), ?1, ?2, ?3, ?4, ?5, ?6)",
            params![invoice_id, user_id, process_type, status, message, now_rfc3339()],
        )?;
        Ok(())
    }
}

fn category_str(category: Category) -> &'static str {
    match category {
        Category::Gelir => "gelir",
        Category::Gider => "gider",
    }
}

fn parse_category(raw: &str) -> Result<Category> {
    match raw {
        "gelir" => Ok(Category::Gelir),
        "gider" => Ok(Category::Gider),
        other => Err(Error::InvalidRecord(format!("unknown category '{}'", other))),
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::Standard => "standard",
        Role::Admin => "admin",
    }
}

fn parse_role(raw: &str) -> Result<Role> {
    match raw {
        "standard" => Ok(Role::Standard),
        "admin" => Ok(Role::Admin),
        other => Err(Error::InvalidRecord(format!("unknown role '{}'", other))),
    }
}
