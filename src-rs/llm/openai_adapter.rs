use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};

use super::types::{read_response, ProviderAdapter, ProviderError, ProviderErrorKind};
use crate::config::ApiKey;

pub const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_MAX_TOKENS: u32 = 150;
const DEFAULT_TEMPERATURE: f64 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OpenAIConfig {
    pub api_key: ApiKey,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl OpenAIConfig {
    pub fn new(api_key: ApiKey, model: &str, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.to_string(),
            model: model.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

pub struct OpenAIAdapter {
    cfg: OpenAIConfig,
    client: Client,
}

impl OpenAIAdapter {
    pub fn new(mut cfg: OpenAIConfig) -> Self {
        if cfg.base_url.is_empty() {
            cfg.base_url = OPENAI_DEFAULT_BASE_URL.to_string();
        }
        if cfg.model.is_empty() {
            cfg.model = OPENAI_DEFAULT_MODEL.to_string();
        }
        if cfg.max_tokens == 0 {
            cfg.max_tokens = DEFAULT_MAX_TOKENS;
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { cfg, client }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.cfg.base_url.trim_end_matches('/'))
    }
}

impl ProviderAdapter for OpenAIAdapter {
    fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let payload = build_payload(&self.cfg.model, prompt, self.cfg.max_tokens, self.cfg.temperature);
        let resp = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.cfg.api_key.expose())
            .json(&payload)
            .send()
            .map_err(|err| ProviderError::new(ProviderErrorKind::Network, err.to_string()))?;

        let body = read_response(resp)?;
        let raw: Value = serde_json::from_str(&body)
            .map_err(|_| ProviderError::new(ProviderErrorKind::Parse, "invalid json"))?;
        parse_response(&raw)
    }
}

fn build_payload(model: &str, prompt: &str, max_tokens: u32, temperature: f64) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "user", "content": prompt}
        ],
        "max_tokens": max_tokens,
        "temperature": temperature,
    })
}

fn parse_response(raw: &Value) -> Result<String, ProviderError> {
    raw.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(|text| text.trim().to_string())
        .ok_or_else(|| ProviderError::new(ProviderErrorKind::Parse, "response has no message content"))
}
