use std::time::Duration;

use serde_json::{json, Value};

use willow_agent_rs::llm::Provider;
use willow_agent_rs::task::{Task, TaskId};
use willow_agent_rs::{Agent, AskResult};

/// What the REPL needs from an agent, local or remote.
pub trait Backend {
    fn ask(&self, prompt: &str) -> Result<AskResult, String>;
    fn submit(&self, prompt: &str, provider: Option<Provider>) -> Result<TaskId, String>;
    fn status(&self, id: TaskId) -> Result<Task, String>;
    fn list_tasks(&self, limit: usize) -> Result<Vec<Task>, String>;
    fn settings(&self) -> Result<Value, String>;
}

/// Polls `status` until the task is terminal or `timeout` elapses.
pub fn wait_for<B: Backend + ?Sized>(backend: &B, id: TaskId, timeout: Duration) -> Result<Task, String> {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        let task = backend.status(id)?;
        if task.status.is_terminal() || std::time::Instant::now() >= deadline {
            return Ok(task);
        }
        std::thread::sleep(Duration::from_millis(250));
    }
}

pub struct LocalBackend {
    agent: Agent,
}

impl LocalBackend {
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Backend for LocalBackend {
    fn ask(&self, prompt: &str) -> Result<AskResult, String> {
        Ok(self.agent.ask(prompt))
    }

    fn submit(&self, prompt: &str, provider: Option<Provider>) -> Result<TaskId, String> {
        Ok(self.agent.submit_background_task(prompt, provider))
    }

    fn status(&self, id: TaskId) -> Result<Task, String> {
        self.agent.task_status(id).map_err(|err| err.to_string())
    }

    fn list_tasks(&self, limit: usize) -> Result<Vec<Task>, String> {
        Ok(self.agent.list_tasks(limit))
    }

    fn settings(&self) -> Result<Value, String> {
        Ok(json!({
            "settings": self.agent.settings(),
            "preference": self.agent.preference(),
            "configured_providers": self.agent.configured_providers(),
        }))
    }
}
