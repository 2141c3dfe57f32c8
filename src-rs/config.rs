use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::helpers::{lookup_secret, read_env_file};
use crate::llm::gemini_adapter::{GEMINI_DEFAULT_BASE_URL, GEMINI_DEFAULT_MODEL};
use crate::llm::openai_adapter::{OPENAI_DEFAULT_BASE_URL, OPENAI_DEFAULT_MODEL};
use crate::llm::Provider;

pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.json";
pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_LOG_FILE: &str = "logs/app.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
}

/// User-facing settings, read once at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub api_preference: Provider,
    pub theme: String,
    pub font_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_model: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_preference: Provider::OpenAI,
            theme: "dark".to_string(),
            font_size: 12,
            openai_model: None,
            gemini_model: None,
        }
    }
}

#[derive(Deserialize)]
struct RawSettings {
    api_preference: Option<String>,
    theme: Option<String>,
    font_size: Option<u32>,
    openai_model: Option<String>,
    gemini_model: Option<String>,
}

impl Settings {
    /// Reads the settings file, falling back to defaults when it is missing
    /// or cannot be decoded.
    pub fn load(path: &Path) -> Settings {
        if !path.exists() {
            warn!(path = %path.display(), "settings file not found, using defaults");
            return Settings::default();
        }
        match Self::read(path) {
            Ok(settings) => {
                info!(path = %path.display(), "settings loaded");
                settings
            }
            Err(err) => {
                error!(path = %path.display(), error = %err, "failed to load settings, using defaults");
                Settings::default()
            }
        }
    }

    pub fn read(path: &Path) -> Result<Settings, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    /// Missing fields take their defaults; an unrecognised `api_preference`
    /// is logged and replaced by the default provider.
    pub fn parse(raw: &str) -> Result<Settings, ConfigError> {
        let parsed: RawSettings = serde_json::from_str(raw)?;
        let defaults = Settings::default();
        let api_preference = match parsed.api_preference {
            Some(value) => value.parse::<Provider>().unwrap_or_else(|err| {
                warn!(error = %err, fallback = %defaults.api_preference, "unsupported api_preference");
                defaults.api_preference
            }),
            None => defaults.api_preference,
        };
        Ok(Settings {
            api_preference,
            theme: parsed.theme.unwrap_or(defaults.theme),
            font_size: parsed.font_size.unwrap_or(defaults.font_size),
            openai_model: non_empty(parsed.openai_model),
            gemini_model: non_empty(parsed.gemini_model),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A provider secret. Never printed: `Debug` and `Display` are redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Trims the raw value; empty values and `YOUR_..._HERE` placeholders
    /// count as absent.
    pub fn from_raw(raw: &str) -> Option<ApiKey> {
        let trimmed = raw.trim().trim_matches('"');
        if trimmed.is_empty() || (trimmed.starts_with("YOUR_") && trimmed.ends_with("_HERE")) {
            return None;
        }
        Some(ApiKey(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Clone, Debug)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub api_key: Option<ApiKey>,
    pub model: String,
    pub base_url: String,
}

impl ProviderConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Where configuration is read from.
#[derive(Clone, Debug)]
pub struct ConfigPaths {
    pub settings: PathBuf,
    pub env_file: PathBuf,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            settings: PathBuf::from(DEFAULT_SETTINGS_PATH),
            env_file: PathBuf::from(DEFAULT_ENV_FILE),
        }
    }
}

/// Command-line flags shared by the server and the CLI.
#[derive(Clone, Debug, clap::Args)]
pub struct ConfigArgs {
    /// Settings JSON file
    #[arg(long, env = "WILLOW_SETTINGS", default_value = DEFAULT_SETTINGS_PATH)]
    pub settings: PathBuf,

    /// KEY=VALUE file holding OPENAI_API_KEY / GEMINI_API_KEY
    #[arg(long, env = "WILLOW_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,

    /// Log file
    #[arg(long, env = "WILLOW_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl ConfigArgs {
    pub fn paths(&self) -> ConfigPaths {
        ConfigPaths {
            settings: self.settings.clone(),
            env_file: self.env_file.clone(),
        }
    }
}

/// Everything the agent needs, loaded once and passed by reference.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub settings: Settings,
    pub openai: ProviderConfig,
    pub gemini: ProviderConfig,
}

impl AppConfig {
    pub fn load(paths: &ConfigPaths) -> AppConfig {
        let settings = Settings::load(&paths.settings);
        let file_vars = read_env_file(&paths.env_file);
        Self::from_parts(settings, |name| lookup_secret(name, &file_vars))
    }

    /// Builds the config from settings and a variable lookup (process env,
    /// env file, or a test double).
    pub fn from_parts(settings: Settings, lookup: impl Fn(&str) -> Option<String>) -> AppConfig {
        let openai = ProviderConfig {
            provider: Provider::OpenAI,
            api_key: lookup("OPENAI_API_KEY").and_then(|raw| ApiKey::from_raw(&raw)),
            model: settings
                .openai_model
                .clone()
                .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
            base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| OPENAI_DEFAULT_BASE_URL.to_string()),
        };
        let gemini = ProviderConfig {
            provider: Provider::Gemini,
            api_key: lookup("GEMINI_API_KEY").and_then(|raw| ApiKey::from_raw(&raw)),
            model: settings
                .gemini_model
                .clone()
                .unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string()),
            base_url: lookup("GEMINI_BASE_URL").unwrap_or_else(|| GEMINI_DEFAULT_BASE_URL.to_string()),
        };
        AppConfig {
            settings,
            openai,
            gemini,
        }
    }

    pub fn provider(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::OpenAI => &self.openai,
            Provider::Gemini => &self.gemini,
        }
    }

    pub fn primary(&self) -> Provider {
        self.settings.api_preference
    }

    pub fn secondary(&self) -> Provider {
        self.settings.api_preference.other()
    }
}
