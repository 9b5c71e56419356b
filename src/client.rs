//! RPC client: the only component that talks to the remote services
//!
//! Wraps a `Backend` together with the active caller identity. Nothing is
//! retried here; callers decide what to do with a `ServiceUnavailable`.

use crate::backend::Backend;
use crate::error::{CanistError, Result};
use crate::identity::Identity;
use crate::types::{
    Agent, AgentDraft, AgentStatus, ChatOptions, ChatRequest, ChatResponse, HealthStatus,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Typed request methods over one backend and one active identity
pub struct RpcClient {
    backend: Arc<dyn Backend>,

    /// `None` until `initialize()` succeeds
    identity: RwLock<Option<Identity>>,
}

impl RpcClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            identity: RwLock::new(None),
        }
    }

    /// Establish the transport for `identity`.
    ///
    /// Probes the backend once; a failed probe leaves the client
    /// uninitialized.
    pub async fn initialize(&self, identity: Identity) -> Result<()> {
        let health = self.backend.health_check().await?;
        if !health.is_healthy() {
            tracing::warn!(
                backend = self.backend.name(),
                status = %health.status,
                "Backend reports degraded health"
            );
        }

        *self.identity.write().await = Some(identity);
        tracing::info!(backend = self.backend.name(), "RPC client initialized");
        Ok(())
    }

    pub async fn is_initialized(&self) -> bool {
        self.identity.read().await.is_some()
    }

    /// Swap the active credential without touching the transport
    pub async fn set_identity(&self, identity: Identity) -> Result<()> {
        let mut current = self.identity.write().await;
        if current.is_none() {
            return Err(CanistError::NotInitialized);
        }
        tracing::debug!(principal = %identity.principal(), "RPC identity updated");
        *current = Some(identity);
        Ok(())
    }

    pub async fn identity(&self) -> Result<Identity> {
        self.identity
            .read()
            .await
            .clone()
            .ok_or(CanistError::NotInitialized)
    }

    pub async fn process_chat(
        &self,
        agent_id: &str,
        message: &str,
        api_key: Option<&str>,
        options: ChatOptions,
    ) -> Result<ChatResponse> {
        let caller = self.identity().await?;
        let request = ChatRequest {
            agent_id: agent_id.to_string(),
            message: message.to_string(),
            api_key: api_key.map(str::to_string),
            options,
        };

        let started = Instant::now();
        let result = self.backend.process_message(&caller, &request).await;
        tracing::debug!(
            agent_id = %agent_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "process_message"
        );
        result
    }

    pub async fn health_check(&self) -> Result<HealthStatus> {
        self.identity().await?;
        self.backend.health_check().await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Option<Agent>> {
        let caller = self.identity().await?;
        self.backend.get_agent(&caller, agent_id).await
    }

    pub async fn get_user_agents(&self) -> Result<Vec<Agent>> {
        let caller = self.identity().await?;
        self.backend.get_user_agents(&caller).await
    }

    pub async fn create_agent(&self, draft: &AgentDraft) -> Result<String> {
        let caller = self.identity().await?;
        self.backend.create_agent(&caller, draft).await
    }

    pub async fn update_agent_status(&self, agent_id: &str, status: AgentStatus) -> Result<()> {
        let caller = self.identity().await?;
        self.backend
            .update_agent_status(&caller, agent_id, status)
            .await
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }
}
