use async_trait::async_trait;
use log::warn;
use serde_json::{json, Value};

use crate::error::{Error, Result};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_SCRIPT_TOKENS: u32 = 2048;
const SCRIPT_TEMPERATURE: f64 = 0.5;

/// Render the fixed narration prompt around the user's description
pub fn build_script_prompt(description: &str) -> String {
    format!(
        "You are writing one guided loving-kindness (metta) meditation script.\n\
         Return plain narration text only, with no markdown, bullet points, or headings.\n\
         Target a calming pace suitable for about 5 to 8 minutes of spoken audio.\n\
         Include gentle pauses using bracket notation like [2s] where appropriate.\n\
         Keep the tone warm, compassionate, and grounded.\n\
         \n\
         User description:\n\
         {description}"
    )
}

/// Outcome of invoking one model candidate
#[derive(Debug)]
pub enum ModelOutcome {
    /// The model responded; the text may still be empty
    Script(String),
    /// The backend reported the model as missing/unavailable, so the next
    /// candidate should be tried
    ModelNotFound,
}

/// A language-model backend that can author narration text
#[async_trait]
pub trait ScriptBackend: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<ModelOutcome>;
}

/// Script backend over the Anthropic Messages HTTP API
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl AnthropicBackend {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(api_key, ANTHROPIC_API_URL)
    }

    /// Point the backend at a different host (used by tests)
    pub fn with_base_url(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ScriptBackend for AnthropicBackend {
    async fn complete(&self, model: &str, prompt: &str) -> Result<ModelOutcome> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            Error::ScriptGenerationUnavailable(
                "ANTHROPIC_API_KEY is not configured".to_string(),
            )
        })?;

        let body = json!({
            "model": model,
            "max_tokens": MAX_SCRIPT_TOKENS,
            "temperature": SCRIPT_TEMPERATURE,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        // Error bodies are not guaranteed to be JSON
        let payload: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if status == reqwest::StatusCode::NOT_FOUND || is_model_not_found(&payload) {
            return Ok(ModelOutcome::ModelNotFound);
        }
        if !status.is_success() {
            return Err(Error::ScriptGenerationFailed(format!(
                "model '{}' request failed with status {}",
                model, status
            )));
        }

        Ok(ModelOutcome::Script(extract_script_text(
            &payload["content"],
        )))
    }
}

fn is_model_not_found(payload: &Value) -> bool {
    payload["error"]["type"].as_str() == Some("not_found_error")
}

/// Extract narration text from a model response content value: a plain
/// string is used as-is, and a block array contributes each block's `text`
/// field in order, joined by blank lines. The result is trimmed.
pub fn extract_script_text(content: &Value) -> String {
    match content {
        Value::Null => String::new(),
        Value::String(text) => text.trim().to_string(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n\n")
            .trim()
            .to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Author a meditation script from the user's description, trying each
/// configured model candidate in order.
///
/// A missing model falls through to the next candidate. Empty output from
/// an available model is a hard failure, not a fall-through: the model
/// answered and its answer was unusable.
pub async fn generate_script(
    backend: &dyn ScriptBackend,
    models: &[String],
    description: &str,
) -> Result<String> {
    let prompt = build_script_prompt(description);

    for model in models {
        match backend.complete(model, &prompt).await? {
            ModelOutcome::ModelNotFound => {
                warn!("script model '{}' not available, trying next candidate", model);
                continue;
            }
            ModelOutcome::Script(text) => {
                let script = text.trim();
                if script.is_empty() {
                    return Err(Error::ScriptGenerationFailed(format!(
                        "generated script was empty for model '{}'",
                        model
                    )));
                }
                return Ok(script.to_string());
            }
        }
    }

    Err(Error::ScriptGenerationFailed(format!(
        "no configured script model is available, tried: {}",
        models.join(", ")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_plain_string_content() {
        assert_eq!(extract_script_text(&json!("  Breathe in.  ")), "Breathe in.");
    }

    #[test]
    fn extracts_and_joins_text_blocks() {
        let content = json!([
            {"type": "text", "text": " First part. "},
            {"type": "tool_use", "id": "x"},
            {"type": "text", "text": "Second part."},
        ]);
        assert_eq!(extract_script_text(&content), "First part.\n\nSecond part.");
    }

    #[test]
    fn prompt_embeds_description() {
        let prompt = build_script_prompt("find calm");
        assert!(prompt.contains("User description:\nfind calm"));
    }
}
