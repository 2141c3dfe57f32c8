use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{AppConfig, Settings};
use crate::helpers::{build_llm_router, preview};
use crate::llm::{AllProvidersFailedError, Completion, FallbackCoordinator, LLMRouter, Provider};
use crate::result::AskResult;
use crate::task::{Task, TaskError, TaskId, TaskManager};

const PROMPT_LOG_PREVIEW: usize = 50;

/// Entry point for callers: direct prompts, background tasks and settings.
pub struct Agent {
    config: AppConfig,
    router: Arc<LLMRouter>,
    coordinator: Arc<FallbackCoordinator>,
    tasks: TaskManager,
}

impl Agent {
    pub fn new(config: AppConfig) -> Self {
        let router = build_llm_router(&config);
        Self::with_router(config, router)
    }

    /// Uses a caller-built router instead of one derived from the API keys.
    pub fn with_router(config: AppConfig, router: LLMRouter) -> Self {
        let router = Arc::new(router);
        let coordinator = Arc::new(FallbackCoordinator::new(
            Arc::clone(&router),
            config.primary(),
        ));
        info!(
            preference = %coordinator.primary(),
            fallback = %coordinator.secondary(),
            "agent initialized"
        );
        Self {
            tasks: TaskManager::new(Arc::clone(&coordinator)),
            config,
            router,
            coordinator,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.config.settings
    }

    pub fn preference(&self) -> Provider {
        self.coordinator.primary()
    }

    pub fn configured_providers(&self) -> Vec<Provider> {
        self.router.registered()
    }

    /// Synchronous completion with fallback. Blocks on the network.
    pub fn process_prompt(&self, prompt: &str) -> Result<Completion, AllProvidersFailedError> {
        info!(prompt = %preview(prompt, PROMPT_LOG_PREVIEW), "processing prompt synchronously");
        self.coordinator.complete(prompt)
    }

    pub fn ask(&self, prompt: &str) -> AskResult {
        AskResult::from(self.process_prompt(prompt))
    }

    /// Queues `prompt` on its own worker thread. `provider` pins the task to
    /// one provider; `None` uses fallback.
    pub fn submit_background_task(&self, prompt: &str, provider: Option<Provider>) -> TaskId {
        match provider {
            Some(provider) => self.tasks.submit_to(provider, prompt),
            None => self.tasks.submit(prompt),
        }
    }

    pub fn task_status(&self, id: TaskId) -> Result<Task, TaskError> {
        self.tasks.status(id)
    }

    pub fn wait_for_task(&self, id: TaskId, timeout: Duration) -> Result<Task, TaskError> {
        self.tasks.wait(id, timeout)
    }

    pub fn list_tasks(&self, limit: usize) -> Vec<Task> {
        self.tasks.list(limit)
    }
}
