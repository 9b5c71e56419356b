//! HTTP gateway backend
//!
//! Each service method is a JSON `POST {host}/api/{canister_id}/{method}`.
//! The caller principal travels in the `x-canistchat-principal` header.
//! Replies use the `{"ok": value}` / `{"err": "message"}` envelope.

use crate::backend::Backend;
use crate::config::SdkConfig;
use crate::error::{CanistError, Result};
use crate::identity::Identity;
use crate::types::{Agent, AgentDraft, AgentStatus, ChatRequest, ChatResponse, HealthStatus};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Header carrying the caller principal
pub const PRINCIPAL_HEADER: &str = "x-canistchat-principal";

/// Service reply envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply<T> {
    Ok(T),
    Err(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentIdArgs<'a> {
    agent_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusArgs<'a> {
    agent_id: &'a str,
    status: AgentStatus,
}

/// `Backend` speaking JSON to the CanistChat HTTP gateway
pub struct HttpBackend {
    http: reqwest::Client,
    host: String,
    agent_manager: String,
    llm_processor: String,
}

impl HttpBackend {
    pub fn new(config: &SdkConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| CanistError::init(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            host: config.host(),
            agent_manager: config.agent_manager_canister_id.clone(),
            llm_processor: config.llm_processor().to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn endpoint(&self, canister_id: &str, method: &str) -> String {
        format!("{}/api/{}/{}", self.host, canister_id, method)
    }

    async fn call<A, T>(
        &self,
        canister_id: &str,
        method: &str,
        caller: Option<&Identity>,
        args: &A,
    ) -> Result<T>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(canister_id, method);
        let started = Instant::now();

        let mut request = self.http.post(&url).json(args);
        if let Some(caller) = caller.filter(|c| c.is_authenticated()) {
            request = request.header(PRINCIPAL_HEADER, caller.principal());
        }

        let response = request
            .send()
            .await
            .map_err(|e| CanistError::ServiceUnavailable(format!("{}: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CanistError::ServiceUnavailable(format!("{}: {}", url, e)))?;

        tracing::debug!(
            method = method,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Gateway call completed"
        );

        if status.is_server_error() {
            return Err(CanistError::ServiceUnavailable(format!(
                "{} returned {}",
                url, status
            )));
        }
        if !status.is_success() {
            return Err(CanistError::Processing(format!(
                "{} returned {}: {}",
                method, status, body
            )));
        }

        parse_reply(method, &body)
    }
}

fn parse_reply<T: DeserializeOwned>(method: &str, body: &str) -> Result<T> {
    let reply: Reply<T> = serde_json::from_str(body).map_err(|e| {
        CanistError::Processing(format!("Invalid reply from {}: {}", method, e))
    })?;
    match reply {
        Reply::Ok(value) => Ok(value),
        Reply::Err(message) => Err(CanistError::Processing(message)),
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn process_message(&self, caller: &Identity, request: &ChatRequest) -> Result<ChatResponse> {
        self.call(&self.llm_processor, "process_message", Some(caller), request)
            .await
    }

    async fn get_agent(&self, caller: &Identity, agent_id: &str) -> Result<Option<Agent>> {
        self.call(
            &self.agent_manager,
            "get_agent",
            Some(caller),
            &AgentIdArgs { agent_id },
        )
        .await
    }

    async fn get_user_agents(&self, caller: &Identity) -> Result<Vec<Agent>> {
        self.call(
            &self.agent_manager,
            "get_user_agents",
            Some(caller),
            &serde_json::json!({}),
        )
        .await
    }

    async fn create_agent(&self, caller: &Identity, draft: &AgentDraft) -> Result<String> {
        self.call(&self.agent_manager, "create_agent", Some(caller), draft)
            .await
    }

    async fn update_agent_status(
        &self,
        caller: &Identity,
        agent_id: &str,
        status: AgentStatus,
    ) -> Result<()> {
        self.call(
            &self.agent_manager,
            "update_agent_status",
            Some(caller),
            &StatusArgs { agent_id, status },
        )
        .await
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        self.call(
            &self.agent_manager,
            "health_check",
            None,
            &serde_json::json!({}),
        )
        .await
    }

    fn name(&self) -> &str {
        "http"
    }
}
