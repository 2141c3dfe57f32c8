use serde::{Deserialize, Serialize};

use crate::llm::{AllProvidersFailedError, Completion, Provider};

/// Outcome of a synchronous prompt, shaped for callers that display it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AskResult {
    pub success: bool,
    pub output: String,
    pub provider: Option<Provider>,
    pub error: Option<String>,
}

impl AskResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            provider: None,
            error: Some(message.into()),
        }
    }
}

impl From<Result<Completion, AllProvidersFailedError>> for AskResult {
    fn from(result: Result<Completion, AllProvidersFailedError>) -> Self {
        match result {
            Ok(completion) => Self {
                success: true,
                output: completion.text,
                provider: Some(completion.provider),
                error: None,
            },
            Err(err) => Self::failure(err.to_string()),
        }
    }
}
