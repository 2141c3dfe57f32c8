pub mod manager;
pub mod store;
pub mod types;

pub use manager::TaskManager;
pub use store::{StoreError, TaskStore};
pub use types::{Task, TaskError, TaskId, TaskRoute, TaskStatus};
