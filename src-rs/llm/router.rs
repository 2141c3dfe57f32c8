use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::types::{Provider, ProviderAdapter, ProviderError, ProviderErrorKind};

/// Maps each provider to the adapter that talks to it. A provider without a
/// registered adapter (no API key) fails every call with `not_configured`.
#[derive(Default)]
pub struct LLMRouter {
    providers: HashMap<Provider, Arc<dyn ProviderAdapter>>,
}

impl LLMRouter {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register_provider(&mut self, provider: Provider, adapter: Arc<dyn ProviderAdapter>) {
        self.providers.insert(provider, adapter);
    }

    pub fn has(&self, provider: Provider) -> bool {
        self.providers.contains_key(&provider)
    }

    pub fn registered(&self) -> Vec<Provider> {
        Provider::ALL.into_iter().filter(|p| self.has(*p)).collect()
    }

    pub fn send(&self, provider: Provider, prompt: &str) -> Result<String, ProviderError> {
        let adapter = self.providers.get(&provider).ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::NotConfigured,
                format!("{} client is not configured", provider),
            )
        })?;
        debug!(%provider, "sending prompt");
        adapter.complete(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedAdapter;

    #[test]
    fn send_dispatches_to_registered_adapter() {
        let openai = Arc::new(ScriptedAdapter::ok("from openai"));
        let mut router = LLMRouter::new();
        router.register_provider(Provider::OpenAI, openai.clone());

        assert_eq!(router.send(Provider::OpenAI, "hi").unwrap(), "from openai");
        assert_eq!(openai.calls(), 1);
        assert_eq!(router.registered(), vec![Provider::OpenAI]);
    }

    #[test]
    fn unregistered_provider_is_not_configured() {
        let router = LLMRouter::new();
        let err = router.send(Provider::Gemini, "hi").unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::NotConfigured);
        assert!(err.message.contains("gemini"));
    }
}
