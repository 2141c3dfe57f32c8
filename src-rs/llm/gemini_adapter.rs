use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};

use super::types::{read_response, ProviderAdapter, ProviderError, ProviderErrorKind};
use crate::config::ApiKey;

pub const GEMINI_DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct GeminiConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
}

pub struct GeminiAdapter {
    cfg: GeminiConfig,
    client: Client,
}

impl GeminiAdapter {
    pub fn new(mut cfg: GeminiConfig) -> Self {
        if cfg.base_url.is_empty() {
            cfg.base_url = GEMINI_DEFAULT_BASE_URL.to_string();
        }
        if cfg.model.is_empty() {
            cfg.model = GEMINI_DEFAULT_MODEL.to_string();
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { cfg, client }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.cfg.base_url.trim_end_matches('/'),
            self.cfg.model
        )
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let payload = build_payload(prompt);
        let resp = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", self.cfg.api_key.expose())
            .json(&payload)
            .send()
            .map_err(|err| ProviderError::new(ProviderErrorKind::Network, err.to_string()))?;

        let body = read_response(resp)?;
        let raw: Value = serde_json::from_str(&body)
            .map_err(|_| ProviderError::new(ProviderErrorKind::Parse, "invalid json"))?;
        parse_response(&raw)
    }
}

fn build_payload(prompt: &str) -> Value {
    json!({
        "contents": [
            {
                "role": "user",
                "parts": [{"text": prompt}]
            }
        ]
    })
}

fn parse_response(raw: &Value) -> Result<String, ProviderError> {
    let parts = raw
        .get("candidates")
        .and_then(|v| v.as_array())
        .and_then(|list| list.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|v| v.as_array());

    let parts = match parts {
        Some(parts) => parts,
        None => {
            // Blocked prompts come back with promptFeedback and no candidates.
            let reason = raw
                .get("promptFeedback")
                .and_then(|fb| fb.get("blockReason"))
                .and_then(|v| v.as_str())
                .unwrap_or("no candidates");
            return Err(ProviderError::new(
                ProviderErrorKind::Parse,
                format!("response contained no text ({})", reason),
            ));
        }
    };

    let mut text = String::new();
    let mut found = false;
    for part in parts {
        if let Some(chunk) = part.get("text").and_then(|v| v.as_str()) {
            text.push_str(chunk);
            found = true;
        }
    }
    if !found {
        return Err(ProviderError::new(ProviderErrorKind::Parse, "response contained no text parts"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::stub_server::serve_once;

    #[test]
    fn payload_sends_single_user_part() {
        let payload = build_payload("hello");
        assert_eq!(payload["contents"][0]["role"], "user");
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "hello");
        assert!(payload.get("generationConfig").is_none());
    }

    #[test]
    fn parse_response_joins_text_parts() {
        let raw = json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]}
            }]
        });
        assert_eq!(parse_response(&raw).unwrap(), "Hello, world");
    }

    #[test]
    fn blocked_prompt_reports_reason() {
        let raw = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = parse_response(&raw).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Parse);
        assert!(err.message.contains("SAFETY"));
    }

    #[test]
    fn endpoint_includes_model() {
        let adapter = GeminiAdapter::new(GeminiConfig {
            api_key: ApiKey::from_raw("g-test").unwrap(),
            base_url: "http://localhost:8000/".to_string(),
            model: String::new(),
        });
        assert_eq!(
            adapter.endpoint(),
            "http://localhost:8000/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn redirect_status_is_api_error_not_parse() {
        let base = serve_once("HTTP/1.1 300 Multiple Choices\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        let adapter = GeminiAdapter::new(GeminiConfig {
            api_key: ApiKey::from_raw("g-test").unwrap(),
            base_url: base,
            model: String::new(),
        });
        let err = adapter.complete("hi").unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Api);
        assert_eq!(err.message, "http 300");
    }
}
