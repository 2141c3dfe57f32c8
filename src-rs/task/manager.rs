use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::store::TaskStore;
use super::types::{Task, TaskError, TaskId, TaskRoute};
use crate::llm::{FallbackCoordinator, Provider};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Runs every submitted prompt on its own thread and tracks its status.
///
/// There is no bound on concurrent threads, no queue and no cancellation:
/// `submit` creates a `pending` task, spawns a worker and returns the id.
/// The worker is the only writer of its task.
pub struct TaskManager {
    store: Arc<TaskStore>,
    coordinator: Arc<FallbackCoordinator>,
}

impl TaskManager {
    pub fn new(coordinator: Arc<FallbackCoordinator>) -> Self {
        Self {
            store: Arc::new(TaskStore::new()),
            coordinator,
        }
    }

    /// Submits a prompt that goes through primary/secondary fallback.
    pub fn submit(&self, prompt: &str) -> TaskId {
        self.dispatch(prompt, TaskRoute::Fallback)
    }

    /// Submits a prompt pinned to a single provider.
    pub fn submit_to(&self, provider: Provider, prompt: &str) -> TaskId {
        self.dispatch(prompt, TaskRoute::Only(provider))
    }

    pub fn status(&self, id: TaskId) -> Result<Task, TaskError> {
        self.store.get(id).ok_or(TaskError::UnknownTask(id))
    }

    pub fn list(&self, limit: usize) -> Vec<Task> {
        self.store.list(limit)
    }

    /// Number of tasks submitted so far.
    pub fn count(&self) -> usize {
        self.store.len()
    }

    pub fn is_terminal(&self, id: TaskId) -> Result<bool, TaskError> {
        self.status(id).map(|task| task.status.is_terminal())
    }

    /// Polls until the task is terminal or `timeout` elapses, returning the
    /// latest snapshot either way.
    pub fn wait(&self, id: TaskId, timeout: Duration) -> Result<Task, TaskError> {
        let deadline = Instant::now() + timeout;
        loop {
            let task = self.status(id)?;
            if task.status.is_terminal() || Instant::now() >= deadline {
                return Ok(task);
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        }
    }

    fn dispatch(&self, prompt: &str, route: TaskRoute) -> TaskId {
        let task = self.store.create(prompt, route);
        let id = task.id;
        info!(task_id = %id, %route, description = %task.description, "task submitted");

        let store = Arc::clone(&self.store);
        let coordinator = Arc::clone(&self.coordinator);
        let prompt = prompt.to_string();
        let spawned = thread::Builder::new()
            .name(format!("willow-task-{}", id))
            .spawn(move || run_task(&store, &coordinator, id, route, &prompt));

        if let Err(err) = spawned {
            error!(task_id = %id, error = %err, "failed to spawn task worker");
            let _ = self.store.mark_running(id);
            let _ = self
                .store
                .fail(id, format!("failed to spawn worker thread: {}", err));
        }
        id
    }
}

fn run_task(
    store: &TaskStore,
    coordinator: &FallbackCoordinator,
    id: TaskId,
    route: TaskRoute,
    prompt: &str,
) {
    if let Err(err) = store.mark_running(id) {
        error!(task_id = %id, error = %err, "task could not start");
        return;
    }
    info!(task_id = %id, "task started");

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| match route {
        TaskRoute::Fallback => coordinator.complete(prompt).map_err(|err| err.to_string()),
        TaskRoute::Only(provider) => coordinator
            .complete_with(provider, prompt)
            .map_err(|err| format!("{}: {}", provider, err)),
    }));
    let outcome = attempt.unwrap_or_else(|payload| {
        let message = format!("worker panicked: {}", panic_message(payload.as_ref()));
        error!(task_id = %id, error = %message, "task worker panicked");
        Err(message)
    });

    let recorded = match outcome {
        Ok(completion) => {
            info!(task_id = %id, provider = %completion.provider, "task completed");
            store.complete(id, completion.provider, completion.text)
        }
        Err(message) => {
            warn!(task_id = %id, error = %message, "task failed");
            store.fail(id, message)
        }
    };
    if let Err(err) = recorded {
        error!(task_id = %id, error = %err, "task result was not recorded");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedAdapter;
    use crate::llm::{LLMRouter, ProviderAdapter, ProviderError, ProviderErrorKind};
    use crate::task::types::TaskStatus;

    struct PanickingAdapter;

    impl ProviderAdapter for PanickingAdapter {
        fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
            panic!("adapter bug")
        }
    }

    fn manager(openai: Arc<ScriptedAdapter>, gemini: Arc<ScriptedAdapter>) -> TaskManager {
        let mut router = LLMRouter::new();
        router.register_provider(Provider::OpenAI, openai);
        router.register_provider(Provider::Gemini, gemini);
        let coordinator = FallbackCoordinator::new(Arc::new(router), Provider::OpenAI);
        TaskManager::new(Arc::new(coordinator))
    }

    #[test]
    fn unknown_id_is_an_error() {
        let tasks = manager(
            Arc::new(ScriptedAdapter::ok("a")),
            Arc::new(ScriptedAdapter::ok("b")),
        );
        assert_eq!(
            tasks.status(TaskId::new(99)).unwrap_err(),
            TaskError::UnknownTask(TaskId::new(99))
        );
        assert!(tasks.wait(TaskId::new(99), Duration::from_millis(10)).is_err());
    }

    #[test]
    fn pinned_task_reports_only_its_provider() {
        let openai = Arc::new(ScriptedAdapter::ok("openai"));
        let gemini = Arc::new(ScriptedAdapter::failing(ProviderErrorKind::Auth, "API_KEY_INVALID"));
        let tasks = manager(openai.clone(), gemini.clone());

        let id = tasks.submit_to(Provider::Gemini, "hello");
        let task = tasks.wait(id, Duration::from_secs(5)).unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.route, TaskRoute::Only(Provider::Gemini));
        let error = task.error.unwrap();
        assert!(error.starts_with("gemini: auth_error"));
        assert_eq!(openai.calls(), 0);
    }

    #[test]
    fn wait_returns_latest_snapshot_on_timeout() {
        let (gemini, release) = ScriptedAdapter::ok("late").gated();
        let tasks = manager(
            Arc::new(ScriptedAdapter::failing(ProviderErrorKind::Network, "down")),
            Arc::new(gemini),
        );
        let id = tasks.submit("hello");
        let task = tasks.wait(id, Duration::from_millis(50)).unwrap();
        assert!(!task.status.is_terminal());
        assert!(!tasks.is_terminal(id).unwrap());

        drop(release);
        let task = tasks.wait(id, Duration::from_secs(5)).unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.result.as_deref(), Some("late"));
        assert_eq!(task.provider, Some(Provider::Gemini));
    }

    #[test]
    fn panicking_provider_fails_the_task() {
        let gemini = Arc::new(ScriptedAdapter::ok("unused"));
        let mut router = LLMRouter::new();
        router.register_provider(Provider::OpenAI, Arc::new(PanickingAdapter));
        router.register_provider(Provider::Gemini, gemini.clone());
        let tasks = TaskManager::new(Arc::new(FallbackCoordinator::new(
            Arc::new(router),
            Provider::OpenAI,
        )));

        let id = tasks.submit("hello");
        let task = tasks.wait(id, Duration::from_secs(5)).unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.result.is_none());
        assert_eq!(task.error.as_deref(), Some("worker panicked: adapter bug"));
        assert!(task.completed_at.is_some());
        assert_eq!(gemini.calls(), 0);
    }
}
