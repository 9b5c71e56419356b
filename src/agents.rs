//! Client-side agent manager
//!
//! Resolves agent ids through the RPC client and caches the results for
//! the lifetime of the owning SDK instance.

use crate::client::RpcClient;
use crate::error::{CanistError, Result};
use crate::types::{Agent, AgentDraft, AgentStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct AgentManager {
    client: Arc<RpcClient>,

    /// agent_id → agent
    cache: RwLock<HashMap<String, Agent>>,
}

impl AgentManager {
    pub fn new(client: Arc<RpcClient>) -> Self {
        Self {
            client,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Cached lookup, falling back to the agent manager service
    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        if let Some(agent) = self.cache.read().await.get(agent_id) {
            return Ok(agent.clone());
        }

        let agent = self
            .client
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| CanistError::NotFound(format!("Agent {}", agent_id)))?;

        self.cache
            .write()
            .await
            .insert(agent.id.clone(), agent.clone());
        tracing::debug!(agent_id = %agent_id, "Agent cached");
        Ok(agent)
    }

    /// Agents owned by the current identity, in service order
    pub async fn get_user_agents(&self) -> Result<Vec<Agent>> {
        let agents = self.client.get_user_agents().await?;

        let mut cache = self.cache.write().await;
        for agent in &agents {
            cache.insert(agent.id.clone(), agent.clone());
        }
        Ok(agents)
    }

    /// Create an agent and return its assigned id
    pub async fn create_agent(&self, draft: &AgentDraft) -> Result<String> {
        if draft.name.trim().is_empty() {
            return Err(CanistError::Validation("Agent name is required".into()));
        }

        self.client.create_agent(draft).await.map_err(|e| match e {
            CanistError::Processing(reason) => CanistError::Validation(reason),
            other => other,
        })
    }

    pub async fn update_agent_status(&self, agent_id: &str, status: AgentStatus) -> Result<()> {
        self.client.update_agent_status(agent_id, status).await?;
        self.invalidate(agent_id).await;
        Ok(())
    }

    pub async fn invalidate(&self, agent_id: &str) {
        self.cache.write().await.remove(agent_id);
    }

    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }

    pub async fn cached_count(&self) -> usize {
        self.cache.read().await.len()
    }
}
