pub mod handlers;
pub mod server;

pub use handlers::{AskRequest, SubmitRequest, SubmitResponse, TasksQuery};
pub use server::AgentServer;
