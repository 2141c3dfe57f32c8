use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use thiserror::Error;

use super::types::{Task, TaskId, TaskRoute, TaskStatus};
use crate::helpers::preview;
use crate::llm::Provider;

const DESCRIPTION_PREVIEW: usize = 30;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unknown task id: {0}")]
    UnknownTask(TaskId),
    #[error("task {id}: illegal transition {from} -> {to}")]
    IllegalTransition {
        id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
}

/// In-memory task table. Tasks are never evicted.
pub struct TaskStore {
    next_id: AtomicU64,
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, prompt: &str, route: TaskRoute) -> Task {
        let id = TaskId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let task = Task {
            id,
            description: preview(prompt, DESCRIPTION_PREVIEW),
            prompt: prompt.to_string(),
            route,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            provider: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.write().insert(id, task.clone());
        task
    }

    pub fn mark_running(&self, id: TaskId) -> Result<Task, StoreError> {
        self.advance(id, TaskStatus::Running, |_| {})
    }

    pub fn complete(&self, id: TaskId, provider: Provider, result: String) -> Result<Task, StoreError> {
        self.advance(id, TaskStatus::Done, |task| {
            task.provider = Some(provider);
            task.result = Some(result);
        })
    }

    pub fn fail(&self, id: TaskId, error: String) -> Result<Task, StoreError> {
        self.advance(id, TaskStatus::Failed, |task| {
            task.error = Some(error);
        })
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.read().get(&id).cloned()
    }

    /// Newest first.
    pub fn list(&self, limit: usize) -> Vec<Task> {
        let mut items: Vec<Task> = self.read().values().cloned().collect();
        items.sort_by(|a, b| b.id.cmp(&a.id));
        items.truncate(limit);
        items
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn advance(
        &self,
        id: TaskId,
        to: TaskStatus,
        apply: impl FnOnce(&mut Task),
    ) -> Result<Task, StoreError> {
        let mut map = self.write();
        let task = map.get_mut(&id).ok_or(StoreError::UnknownTask(id))?;
        if !task.status.can_advance_to(to) {
            return Err(StoreError::IllegalTransition {
                id,
                from: task.status,
                to,
            });
        }
        apply(task);
        task.status = to;
        if to.is_terminal() {
            task.completed_at = Some(Utc::now());
        }
        Ok(task.clone())
    }

    // Tasks are only mutated inside `advance`, after validation, so a
    // poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TaskId, Task>> {
        self.tasks.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TaskId, Task>> {
        self.tasks.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_increasing_ids() {
        let store = TaskStore::new();
        let first = store.create("one", TaskRoute::Fallback);
        let second = store.create("two", TaskRoute::Fallback);
        assert_eq!(first.id, TaskId::new(1));
        assert_eq!(second.id, TaskId::new(2));
        assert_eq!(first.status, TaskStatus::Pending);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn description_is_short_prefix_of_prompt() {
        let store = TaskStore::new();
        let task = store.create(&"a".repeat(100), TaskRoute::Fallback);
        assert!(task.description.starts_with(&"a".repeat(30)));
        assert!(task.description.chars().count() <= 33);
        assert_eq!(task.prompt.len(), 100);
    }

    #[test]
    fn happy_path_records_result_and_completion_time() {
        let store = TaskStore::new();
        let id = store.create("hi", TaskRoute::Fallback).id;
        store.mark_running(id).unwrap();
        let done = store.complete(id, Provider::Gemini, "hello".to_string()).unwrap();

        assert_eq!(done.status, TaskStatus::Done);
        assert_eq!(done.result.as_deref(), Some("hello"));
        assert_eq!(done.provider, Some(Provider::Gemini));
        assert!(done.completed_at.is_some());
        assert!(done.error.is_none());
    }

    #[test]
    fn terminal_tasks_cannot_move_again() {
        let store = TaskStore::new();
        let id = store.create("hi", TaskRoute::Fallback).id;
        store.mark_running(id).unwrap();
        store.fail(id, "boom".to_string()).unwrap();

        let err = store.complete(id, Provider::OpenAI, "late".to_string()).unwrap_err();
        assert_eq!(
            err,
            StoreError::IllegalTransition {
                id,
                from: TaskStatus::Failed,
                to: TaskStatus::Done
            }
        );
        let task = store.get(id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert!(task.result.is_none());
    }

    #[test]
    fn pending_cannot_skip_running() {
        let store = TaskStore::new();
        let id = store.create("hi", TaskRoute::Fallback).id;
        assert!(store.fail(id, "nope".to_string()).is_err());
        assert_eq!(store.get(id).unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let store = TaskStore::new();
        assert_eq!(
            store.mark_running(TaskId::new(7)).unwrap_err(),
            StoreError::UnknownTask(TaskId::new(7))
        );
        assert!(store.get(TaskId::new(7)).is_none());
    }

    #[test]
    fn list_is_newest_first_and_limited() {
        let store = TaskStore::new();
        for prompt in ["a", "b", "c"] {
            store.create(prompt, TaskRoute::Fallback);
        }
        let listed: Vec<u64> = store.list(2).iter().map(|t| t.id.value()).collect();
        assert_eq!(listed, vec![3, 2]);
    }
}
