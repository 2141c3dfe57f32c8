use std::fmt;
use std::str::FromStr;

use reqwest::blocking::Response;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::helpers::preview;

const ERROR_BODY_PREVIEW: usize = 200;

/// An external LLM API the agent can forward prompts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::OpenAI, Provider::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Gemini => "gemini",
        }
    }

    /// The provider used when this one fails.
    pub fn other(&self) -> Provider {
        match self {
            Provider::OpenAI => Provider::Gemini,
            Provider::Gemini => Provider::OpenAI,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "gemini" => Ok(Provider::Gemini),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Network,
    Auth,
    RateLimit,
    Server,
    Api,
    Parse,
    NotConfigured,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::Network => "network_error",
            ProviderErrorKind::Auth => "auth_error",
            ProviderErrorKind::RateLimit => "rate_limit",
            ProviderErrorKind::Server => "server_error",
            ProviderErrorKind::Api => "api_error",
            ProviderErrorKind::Parse => "parse_error",
            ProviderErrorKind::NotConfigured => "not_configured",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single provider call failed.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// One prompt-in, text-out call against a single provider. Implementations
/// make exactly one attempt; retrying belongs to the caller.
pub trait ProviderAdapter: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Maps a non-success HTTP status (and its body) to a provider error.
pub fn classify_status(status: u16, body: &str) -> ProviderError {
    let lowered = body.to_lowercase();
    let message = if body.trim().is_empty() {
        format!("http {}", status)
    } else {
        format!("http {}: {}", status, preview(body.trim(), ERROR_BODY_PREVIEW))
    };
    let kind = if status == 401 || status == 403 || lowered.contains("api_key_invalid") {
        ProviderErrorKind::Auth
    } else if status == 429 || lowered.contains("quota") || lowered.contains("resource_exhausted") {
        ProviderErrorKind::RateLimit
    } else if (500..600).contains(&status) {
        ProviderErrorKind::Server
    } else {
        ProviderErrorKind::Api
    };
    ProviderError::new(kind, message)
}

/// Body of a provider reply. A body that cannot be read is a network error;
/// a non-2xx status is classified from the body.
pub(crate) fn read_response(resp: Response) -> Result<String, ProviderError> {
    let status = resp.status();
    let body = resp.text().map_err(|err| {
        ProviderError::new(ProviderErrorKind::Network, format!("reading response body: {}", err))
    })?;
    if !status.is_success() {
        return Err(classify_status(status.as_u16(), &body));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("OpenAI".parse::<Provider>(), Ok(Provider::OpenAI));
        assert_eq!(" gemini ".parse::<Provider>(), Ok(Provider::Gemini));
        assert!("claude".parse::<Provider>().is_err());
    }

    #[test]
    fn provider_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Provider::OpenAI).unwrap(), "\"openai\"");
        assert_eq!(Provider::Gemini.other(), Provider::OpenAI);
    }

    #[test]
    fn classify_status_maps_common_failures() {
        assert_eq!(classify_status(401, "bad key").kind, ProviderErrorKind::Auth);
        assert_eq!(classify_status(400, "API_KEY_INVALID").kind, ProviderErrorKind::Auth);
        assert_eq!(classify_status(429, "").kind, ProviderErrorKind::RateLimit);
        assert_eq!(
            classify_status(400, "{\"status\":\"RESOURCE_EXHAUSTED\"}").kind,
            ProviderErrorKind::RateLimit
        );
        assert_eq!(classify_status(503, "unavailable").kind, ProviderErrorKind::Server);
        assert_eq!(classify_status(404, "no such model").kind, ProviderErrorKind::Api);
    }

    #[test]
    fn classify_status_keeps_message_short() {
        let body = "x".repeat(1000);
        let err = classify_status(500, &body);
        assert!(err.message.len() < 250);
        assert_eq!(err.to_string().split(':').next(), Some("server_error"));
    }
}
