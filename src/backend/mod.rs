//! Backend trait: the boundary to the remote CanistChat services
//!
//! All transports (HTTP gateway, in-memory) implement `Backend` so the
//! RPC client can swap them without changing the SDK. Implementations
//! must classify failures: `ServiceUnavailable` when the call could not
//! be completed, `Processing` when the service answered with an error.

use crate::error::Result;
use crate::identity::Identity;
use crate::types::{Agent, AgentDraft, AgentStatus, ChatRequest, ChatResponse, HealthStatus};
use async_trait::async_trait;

pub mod http;
pub mod memory;

/// Remote service surface consumed by the SDK
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run one chat turn on the message processing service
    async fn process_message(&self, caller: &Identity, request: &ChatRequest) -> Result<ChatResponse>;

    /// Fetch one agent. `Ok(None)` means the service has no such agent.
    async fn get_agent(&self, caller: &Identity, agent_id: &str) -> Result<Option<Agent>>;

    /// Agents owned by the caller, in service order
    async fn get_user_agents(&self, caller: &Identity) -> Result<Vec<Agent>>;

    /// Create an agent, returning the assigned id
    async fn create_agent(&self, caller: &Identity, draft: &AgentDraft) -> Result<String>;

    async fn update_agent_status(
        &self,
        caller: &Identity,
        agent_id: &str,
        status: AgentStatus,
    ) -> Result<()>;

    async fn health_check(&self) -> Result<HealthStatus>;

    /// Backend name (e.g., "http", "memory")
    fn name(&self) -> &str;
}
