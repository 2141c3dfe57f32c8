use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{AppConfig, ProviderConfig};
use crate::llm::{GeminiAdapter, GeminiConfig, LLMRouter, OpenAIAdapter, OpenAIConfig, Provider};

/// First `max_chars` characters of `text`, with `...` appended when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Reads a dotenv-style `KEY=VALUE` file into a map without touching the
/// process environment. A missing file yields an empty map and malformed
/// lines are skipped.
pub fn read_env_file(path: &Path) -> HashMap<String, String> {
    let iter = match dotenv::from_path_iter(path) {
        Ok(iter) => iter,
        Err(_) => {
            debug!(path = %path.display(), "no env file");
            return HashMap::new();
        }
    };
    let mut vars = HashMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                vars.insert(key, value);
            }
            // The parse error echoes the line, which may hold a key.
            Err(_) => warn!(path = %path.display(), "skipping malformed env line"),
        }
    }
    vars
}

/// Process environment first, then the env file.
pub fn lookup_secret(name: &str, file_vars: &HashMap<String, String>) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => file_vars.get(name).cloned(),
    }
}

/// Registers an adapter for every provider that has an API key.
pub fn build_llm_router(cfg: &AppConfig) -> LLMRouter {
    let mut router = LLMRouter::new();
    register(&mut router, &cfg.openai);
    register(&mut router, &cfg.gemini);
    if router.registered().is_empty() {
        warn!("no provider API keys found; every prompt will fail");
    }
    router
}

fn register(router: &mut LLMRouter, cfg: &ProviderConfig) {
    let api_key = match &cfg.api_key {
        Some(key) => key.clone(),
        None => {
            warn!(provider = %cfg.provider, "API key not found, provider unavailable");
            return;
        }
    };
    match cfg.provider {
        Provider::OpenAI => {
            let adapter = OpenAIAdapter::new(OpenAIConfig::new(api_key, &cfg.model, &cfg.base_url));
            router.register_provider(Provider::OpenAI, Arc::new(adapter));
        }
        Provider::Gemini => {
            let adapter = GeminiAdapter::new(GeminiConfig {
                api_key,
                base_url: cfg.base_url.clone(),
                model: cfg.model.clone(),
            });
            router.register_provider(Provider::Gemini, Arc::new(adapter));
        }
    }
    info!(provider = %cfg.provider, model = %cfg.model, "provider client initialized");
}
