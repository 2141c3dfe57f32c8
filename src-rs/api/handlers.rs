use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agent::Agent;
use crate::llm::Provider;
use crate::result::AskResult;
use crate::task::{TaskError, TaskId};

const DEFAULT_TASK_LIMIT: usize = 10;

#[derive(Debug, Serialize, Deserialize)]
pub struct AskRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
}

/// Body of a successful `POST /tasks`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub task_id: TaskId,
}

#[derive(Debug, Deserialize, Default)]
pub struct TasksQuery {
    pub limit: Option<usize>,
}

pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok", "version": env!("CARGO_PKG_VERSION")}))
}

pub async fn handle_settings(State(agent): State<Arc<Agent>>) -> Json<Value> {
    Json(json!({
        "settings": agent.settings(),
        "preference": agent.preference(),
        "configured_providers": agent.configured_providers(),
    }))
}

pub async fn handle_ask(State(agent): State<Arc<Agent>>, Json(req): Json<AskRequest>) -> Json<AskResult> {
    if req.prompt.trim().is_empty() {
        return Json(AskResult::failure("prompt required"));
    }
    let result = tokio::task::spawn_blocking(move || agent.ask(&req.prompt)).await;
    match result {
        Ok(result) => Json(result),
        Err(err) => Json(AskResult::failure(err.to_string())),
    }
}

pub async fn handle_submit(
    State(agent): State<Arc<Agent>>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>), (StatusCode, Json<Value>)> {
    if req.prompt.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(json!({"error": "prompt required"}))));
    }
    let task_id = agent.submit_background_task(&req.prompt, req.provider);
    Ok((StatusCode::ACCEPTED, Json(SubmitResponse { task_id })))
}

pub async fn handle_tasks(State(agent): State<Arc<Agent>>, Query(query): Query<TasksQuery>) -> Json<Value> {
    let limit = query.limit.unwrap_or(DEFAULT_TASK_LIMIT);
    Json(json!({"tasks": agent.list_tasks(limit)}))
}

pub async fn handle_task_status(
    State(agent): State<Arc<Agent>>,
    Path(raw_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let id = match raw_id.parse::<TaskId>() {
        Ok(id) => id,
        Err(err) => return (StatusCode::BAD_REQUEST, Json(json!({"error": err.to_string()}))),
    };
    match agent.task_status(id) {
        Ok(task) => (StatusCode::OK, Json(json!(task))),
        Err(err @ TaskError::UnknownTask(_)) => (StatusCode::NOT_FOUND, Json(json!({"error": err.to_string()}))),
        Err(err) => (StatusCode::BAD_REQUEST, Json(json!({"error": err.to_string()}))),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{AppConfig, Settings};
    use crate::llm::testing::ScriptedAdapter;
    use crate::llm::{LLMRouter, ProviderErrorKind};

    fn agent() -> Arc<Agent> {
        let config = AppConfig::from_parts(Settings::default(), |_| None);
        let mut router = LLMRouter::new();
        router.register_provider(
            Provider::OpenAI,
            Arc::new(ScriptedAdapter::failing(ProviderErrorKind::Server, "overloaded")),
        );
        router.register_provider(Provider::Gemini, Arc::new(ScriptedAdapter::ok("from gemini")));
        Arc::new(Agent::with_router(config, router))
    }

    #[tokio::test]
    async fn submit_then_status_round_trip() {
        let agent = agent();
        let (status, Json(accepted)) = handle_submit(
            State(agent.clone()),
            Json(SubmitRequest {
                prompt: "tell me a story".to_string(),
                provider: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
        let id = accepted.task_id;
        assert_eq!(serde_json::to_value(&accepted).unwrap(), json!({"task_id": id.value()}));

        let waiter = agent.clone();
        tokio::task::spawn_blocking(move || waiter.wait_for_task(id, Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();

        let (status, Json(task)) = handle_task_status(State(agent), Path(id.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(task["status"], "done");
        assert_eq!(task["result"], "from gemini");
        assert_eq!(task["provider"], "gemini");
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let agent = agent();
        let (status, Json(body)) = handle_task_status(State(agent.clone()), Path("41".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("unknown task id"));

        let (status, _) = handle_task_status(State(agent), Path("abc".to_string())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn empty_prompts_are_rejected() {
        let agent = agent();
        let Json(result) = handle_ask(State(agent.clone()), Json(AskRequest { prompt: "  ".to_string() })).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("prompt required"));

        let (status, Json(body)) = handle_submit(
            State(agent.clone()),
            Json(SubmitRequest {
                prompt: String::new(),
                provider: Some(Provider::OpenAI),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "prompt required");
        assert!(agent.list_tasks(10).is_empty());
    }

    #[tokio::test]
    async fn ask_falls_back() {
        let Json(result) = handle_ask(State(agent()), Json(AskRequest { prompt: "hi".to_string() })).await;
        assert!(result.success);
        assert_eq!(result.output, "from gemini");
        assert_eq!(result.provider, Some(Provider::Gemini));
    }
}
