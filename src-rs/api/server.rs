use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::agent::Agent;
use crate::api::handlers::{
    handle_ask, handle_health, handle_settings, handle_submit, handle_task_status, handle_tasks,
};

pub struct AgentServer {
    pub port: u16,
    pub agent: Arc<Agent>,
}

impl AgentServer {
    pub fn new(port: u16, agent: Arc<Agent>) -> Self {
        Self { port, agent }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handle_health))
            .route("/settings", get(handle_settings))
            .route("/ask", post(handle_ask))
            .route("/tasks", get(handle_tasks).post(handle_submit))
            .route("/tasks/:id", get(handle_task_status))
            .with_state(self.agent.clone())
    }

    pub async fn start(&self) -> Result<(), String> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!(%addr, "api server listening");
        axum::Server::bind(&addr)
            .serve(self.router().into_make_service())
            .await
            .map_err(|err| err.to_string())
    }
}
