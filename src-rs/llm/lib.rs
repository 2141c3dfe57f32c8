pub mod fallback;
pub mod gemini_adapter;
pub mod openai_adapter;
pub mod router;
#[cfg(test)]
mod stub_server;
pub mod testing;
pub mod types;

pub use fallback::{AllProvidersFailedError, Completion, FallbackCoordinator, ProviderFailure};
pub use gemini_adapter::{GeminiAdapter, GeminiConfig};
pub use openai_adapter::{OpenAIAdapter, OpenAIConfig};
pub use router::LLMRouter;
pub use types::{Provider, ProviderAdapter, ProviderError, ProviderErrorKind, UnknownProvider};
