pub mod agent;
pub mod config;
pub mod helpers;
pub mod logging;
pub mod result;

#[path = "llm/lib.rs"]
pub mod llm;
#[path = "task/lib.rs"]
pub mod task;
#[path = "api/lib.rs"]
pub mod api;

pub use agent::Agent;
pub use config::{AppConfig, ConfigArgs, ConfigPaths, Settings};
pub use result::AskResult;
