use anyhow::{anyhow, Result};
use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::AiVerdict;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Seam between the orchestrator and the generative-AI backend. The two
/// calls are sequential by contract: validation needs extraction's output.
#[async_trait]
pub trait InvoiceAi: Send + Sync {
    /// Best-effort structured fields from an invoice photo (base64 data URI).
    async fn extract_fields(&self, image_data: &str) -> Result<Value>;

    /// Best-effort verdict for the three canonical fields.
    async fn validate_fields(&self, date: &str, amount: f64, vendor: &str) -> Result<AiVerdict>;
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<Message>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Value,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        OpenAiClient {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn call(&self, system_prompt: &str, user_content: Value) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: 0.1,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: Value::String(system_prompt.to_string()),
                },
                Message {
                    role: "user".to_string(),
                    content: user_content,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("OpenAI error {}: {}", status, body));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .first()
            .ok_or_else(|| anyhow!("Empty response"))?
            .message
            .content
            .trim()
            .to_string();
        Ok(content)
    }

    /// Call, parse and schema-check; on mismatch ask the model once to fix
    /// its own JSON before giving up.
    async fn call_checked(
        &self,
        schema: &JSONSchema,
        system_prompt: &str,
        user_content: Value,
    ) -> Result<Value> {
        let raw = self.call(system_prompt, user_content).await?;
        let value = parse_json(&raw)?;
        if schema.is_valid(&value) {
            return Ok(value);
        }

        let fix_prompt = format!(
            "Fix this JSON so it matches the schema exactly. Output JSON only. JSON:\n{}",
            raw
        );
        let raw = self.call(system_prompt, Value::String(fix_prompt)).await?;
        let value = parse_json(&raw)?;
        if !schema.is_valid(&value) {
            return Err(anyhow!("JSON validation failed"));
        }
        Ok(value)
    }
}

#[async_trait]
impl InvoiceAi for OpenAiClient {
    async fn extract_fields(&self, image_data: &str) -> Result<Value> {
        let schema = extraction_schema();
        let user_content = json!([
            {
                "type": "text",
                "text": "Extract the structured invoice fields from this photo."
            },
            {
                "type": "image_url",
                "image_url": { "url": image_data }
            }
        ]);
        self.call_checked(&schema, extraction_prompt(), user_content)
            .await
    }

    async fn validate_fields(&self, date: &str, amount: f64, vendor: &str) -> Result<AiVerdict> {
        let schema = verdict_schema();
        let user_content = Value::String(format!(
            "Assess this extracted invoice data:\ndate: {}\namount: {}\nvendor: {}",
            date, amount, vendor
        ));
        let value = self
            .call_checked(&schema, verdict_prompt(), user_content)
            .await?;
        let verdict: AiVerdict = serde_json::from_value(value)?;
        Ok(verdict)
    }
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str::<Value>(raw).map_err(|e| anyhow!("Invalid JSON: {}", e))
}

fn extraction_schema() -> JSONSchema {
    let schema = json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "date": {"type": ["string", "null"]},
            "amount": {"type": ["number", "string", "null"]},
            "vendor": {"type": ["string", "null"]},
            "invoiceNumber": {"type": ["string", "null"]},
            "taxAmount": {"type": ["number", "string", "null"]},
            "items": {
                "type": ["array", "null"],
                "items": {
                    "type": "object",
                    "properties": {
                        "description": {"type": ["string", "null"]},
                        "quantity": {"type": ["number", "string", "null"]},
                        "unitPrice": {"type": ["number", "string", "null"]},
                        "totalPrice": {"type": ["number", "string", "null"]}
                    }
                }
            }
        }
    });

    JSONSchema::compile(&schema).expect("Invalid JSON schema")
}

fn verdict_schema() -> JSONSchema {
    let schema = json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "isDateValid": {"type": ["boolean", "null"]},
            "isAmountValid": {"type": ["boolean", "null"]},
            "isVendorValid": {"type": ["boolean", "null"]},
            "isSuspicious": {"type": ["boolean", "null"]},
            "reasons": {"type": ["array", "null"], "items": {"type": "string"}},
            "summary": {"type": ["string", "null"]}
        }
    });

    JSONSchema::compile(&schema).expect("Invalid JSON schema")
}

fn extraction_prompt() -> &'static str {
    r#"You are an invoice extraction system. Read the invoice or receipt photo and return JSON only, matching the schema exactly.
Fields:
- date (YYYY-MM-DD|null)
- amount (number|null): the grand total
- vendor (string|null)
- invoiceNumber (string|null)
- taxAmount (number|null)
- items (array|null) of { description, quantity, unitPrice, totalPrice }
Use null for anything you cannot read. Do not invent values.
"#
}

fn verdict_prompt() -> &'static str {
    r#"You are an invoice plausibility checker. Return JSON only, matching the schema exactly.
Fields:
- isDateValid (boolean|null): the date is real, not in the future, not older than 2 years
- isAmountValid (boolean|null): the amount is plausible for a single invoice
- isVendorValid (boolean|null): the vendor looks like a real business name
- isSuspicious (boolean|null)
- reasons (array of strings|null): one short entry per problem found
- summary (string|null): one sentence
Use null for anything you cannot judge.
"#
}
