use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::router::LLMRouter;
use super::types::{Provider, ProviderError};
use crate::helpers::preview;

const PROMPT_LOG_PREVIEW: usize = 50;

/// A successful completion and the provider that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub provider: Provider,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: Provider,
    pub error: ProviderError,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.provider, self.error)
    }
}

/// Both the primary and the secondary provider failed.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("all providers failed: {primary}; {secondary}")]
pub struct AllProvidersFailedError {
    pub primary: ProviderFailure,
    pub secondary: ProviderFailure,
}

/// Tries the preferred provider, then the other one. One attempt each.
pub struct FallbackCoordinator {
    router: Arc<LLMRouter>,
    primary: Provider,
    secondary: Provider,
}

impl FallbackCoordinator {
    pub fn new(router: Arc<LLMRouter>, primary: Provider) -> Self {
        Self {
            router,
            primary,
            secondary: primary.other(),
        }
    }

    pub fn primary(&self) -> Provider {
        self.primary
    }

    pub fn secondary(&self) -> Provider {
        self.secondary
    }

    pub fn complete(&self, prompt: &str) -> Result<Completion, AllProvidersFailedError> {
        info!(
            provider = %self.primary,
            prompt = %preview(prompt, PROMPT_LOG_PREVIEW),
            "completing prompt"
        );
        let primary_err = match self.complete_with(self.primary, prompt) {
            Ok(completion) => return Ok(completion),
            Err(err) => err,
        };
        warn!(
            failed = %self.primary,
            fallback = %self.secondary,
            error = %primary_err,
            "primary provider failed, falling back"
        );
        match self.complete_with(self.secondary, prompt) {
            Ok(completion) => Ok(completion),
            Err(secondary_err) => Err(AllProvidersFailedError {
                primary: ProviderFailure {
                    provider: self.primary,
                    error: primary_err,
                },
                secondary: ProviderFailure {
                    provider: self.secondary,
                    error: secondary_err,
                },
            }),
        }
    }

    /// Single attempt against one provider, no fallback.
    pub fn complete_with(&self, provider: Provider, prompt: &str) -> Result<Completion, ProviderError> {
        self.router.send(provider, prompt).map(|text| {
            info!(%provider, chars = text.len(), "provider call succeeded");
            Completion { provider, text }
        })
    }
}
