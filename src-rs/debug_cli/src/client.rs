use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use willow_agent_rs::api::{AskRequest, SubmitRequest, SubmitResponse};
use willow_agent_rs::llm::Provider;
use willow_agent_rs::task::{Task, TaskId};
use willow_agent_rs::AskResult;

use crate::backend::Backend;

pub struct HTTPClient {
    pub base_url: String,
    client: Client,
}

impl HTTPClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, String> {
    let status = resp.status();
    if status.is_success() {
        return resp.json::<T>().map_err(|err| err.to_string());
    }
    let body = resp.text().unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);
    Err(format!("http {}: {}", status.as_u16(), message))
}

impl Backend for HTTPClient {
    fn ask(&self, prompt: &str) -> Result<AskResult, String> {
        let resp = self
            .client
            .post(self.url("/ask"))
            .json(&AskRequest {
                prompt: prompt.to_string(),
            })
            .send()
            .map_err(|err| err.to_string())?;
        decode(resp)
    }

    fn submit(&self, prompt: &str, provider: Option<Provider>) -> Result<TaskId, String> {
        let resp = self
            .client
            .post(self.url("/tasks"))
            .json(&SubmitRequest {
                prompt: prompt.to_string(),
                provider,
            })
            .send()
            .map_err(|err| err.to_string())?;
        decode::<SubmitResponse>(resp).map(|r| r.task_id)
    }

    fn status(&self, id: TaskId) -> Result<Task, String> {
        let resp = self
            .client
            .get(self.url(&format!("/tasks/{}", id)))
            .send()
            .map_err(|err| err.to_string())?;
        decode(resp)
    }

    fn list_tasks(&self, limit: usize) -> Result<Vec<Task>, String> {
        let resp = self
            .client
            .get(self.url(&format!("/tasks?limit={}", limit)))
            .send()
            .map_err(|err| err.to_string())?;
        let value: Value = decode(resp)?;
        let tasks = value.get("tasks").cloned().unwrap_or(Value::Array(Vec::new()));
        serde_json::from_value(tasks).map_err(|err| err.to_string())
    }

    fn settings(&self) -> Result<Value, String> {
        let resp = self
            .client
            .get(self.url("/settings"))
            .send()
            .map_err(|err| err.to_string())?;
        decode(resp)
    }
}
