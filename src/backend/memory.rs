//! In-memory backend for tests, demos, and local development
//!
//! Stores agents in insertion order and answers chat calls with either a
//! configured response or an echo. Failures and latency can be injected
//! to exercise error paths.

use crate::backend::Backend;
use crate::error::{CanistError, Result};
use crate::identity::Identity;
use crate::types::{
    now_millis, Agent, AgentDraft, AgentStatus, ChatRequest, ChatResponse, HealthStatus,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Failure to inject into the next chat calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    /// Behave as if the network call could not complete
    Unavailable(String),
    /// Behave as if the service rejected the request
    Processing(String),
}

impl InjectedFailure {
    fn to_error(&self) -> CanistError {
        match self {
            InjectedFailure::Unavailable(m) => CanistError::ServiceUnavailable(m.clone()),
            InjectedFailure::Processing(m) => CanistError::Processing(m.clone()),
        }
    }
}

#[derive(Default)]
struct MemoryState {
    agents: Vec<Agent>,
    response: Option<ChatResponse>,
    chat_failure: Option<InjectedFailure>,
    health_failure: Option<InjectedFailure>,
    latency: Option<Duration>,
    next_agent: u64,
}

/// In-memory `Backend` implementation
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
    chat_calls: Arc<AtomicUsize>,
    agent_fetches: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an agent (builder form)
    pub async fn with_agent(self, agent: Agent) -> Self {
        self.insert_agent(agent).await;
        self
    }

    pub async fn insert_agent(&self, agent: Agent) {
        let mut state = self.state.write().await;
        state.agents.retain(|a| a.id != agent.id);
        state.agents.push(agent);
    }

    /// Answer every chat call with `response` instead of echoing
    pub async fn set_response(&self, response: ChatResponse) {
        self.state.write().await.response = Some(response);
    }

    /// Fail chat calls until cleared with `None`
    pub async fn set_chat_failure(&self, failure: Option<InjectedFailure>) {
        self.state.write().await.chat_failure = failure;
    }

    /// Fail health checks until cleared with `None`
    pub async fn set_health_failure(&self, failure: Option<InjectedFailure>) {
        self.state.write().await.health_failure = failure;
    }

    /// Delay every chat call by `latency`
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.write().await.latency = latency;
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn agent_fetches(&self) -> usize {
        self.agent_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn process_message(&self, _caller: &Identity, request: &ChatRequest) -> Result<ChatResponse> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);

        let (latency, failure, response, agent_known) = {
            let state = self.state.read().await;
            (
                state.latency,
                state.chat_failure.clone(),
                state.response.clone(),
                state.agents.iter().any(|a| a.id == request.agent_id),
            )
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(failure) = failure {
            return Err(failure.to_error());
        }
        if !agent_known {
            return Err(CanistError::Processing(format!(
                "Agent not found: {}",
                request.agent_id
            )));
        }

        Ok(response.unwrap_or_else(|| ChatResponse {
            response: format!("Echo: {}", request.message),
            tokens_used: request.message.split_whitespace().count() as u32,
            confidence: 1.0,
            context_id: request.options.context_id.clone(),
            processing_time: 0,
            provider_id: Some("memory".to_string()),
            model_used: Some("echo".to_string()),
            cached: false,
        }))
    }

    async fn get_agent(&self, _caller: &Identity, agent_id: &str) -> Result<Option<Agent>> {
        self.agent_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read().await;
        Ok(state.agents.iter().find(|a| a.id == agent_id).cloned())
    }

    async fn get_user_agents(&self, caller: &Identity) -> Result<Vec<Agent>> {
        let state = self.state.read().await;
        Ok(state
            .agents
            .iter()
            .filter(|a| a.owner == caller.principal())
            .cloned()
            .collect())
    }

    async fn create_agent(&self, caller: &Identity, draft: &AgentDraft) -> Result<String> {
        if draft.name.trim().is_empty() {
            return Err(CanistError::Processing(
                "Invalid agent configuration: name is required".into(),
            ));
        }

        let mut state = self.state.write().await;
        let id = loop {
            state.next_agent += 1;
            let candidate = format!("agent-{}", state.next_agent);
            if !state.agents.iter().any(|a| a.id == candidate) {
                break candidate;
            }
        };
        let now = now_millis();
        state.agents.push(Agent {
            id: id.clone(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            status: AgentStatus::Active,
            owner: caller.principal().to_string(),
            created: now,
            updated: now,
            config: draft.config.clone().unwrap_or_default(),
        });
        Ok(id)
    }

    async fn update_agent_status(
        &self,
        _caller: &Identity,
        agent_id: &str,
        status: AgentStatus,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let agent = state
            .agents
            .iter_mut()
            .find(|a| a.id == agent_id)
            .ok_or_else(|| CanistError::Processing(format!("Agent not found: {}", agent_id)))?;
        agent.status = status;
        agent.updated = now_millis();
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthStatus> {
        let state = self.state.read().await;
        if let Some(failure) = &state.health_failure {
            return Err(failure.to_error());
        }

        let mut counters = HashMap::new();
        counters.insert("agents".to_string(), state.agents.len() as u64);
        counters.insert("chatCalls".to_string(), self.chat_calls() as u64);
        Ok(HealthStatus {
            status: "healthy".to_string(),
            counters,
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
