//! SDK facade: one embedding context's entry point
//!
//! `CanistChat` owns the RPC client, the agent manager, the caller
//! identity, a logger, and an event bus. Operational failures are
//! reported twice: returned to the caller and emitted as an event, so
//! both awaiting code and passive UI subscribers observe them.

use crate::agents::AgentManager;
use crate::backend::http::HttpBackend;
use crate::backend::Backend;
use crate::client::RpcClient;
use crate::config::SdkConfig;
use crate::emitter::{EmitterEvent, EventEmitter, ListenerId};
use crate::error::{CanistError, Result};
use crate::identity::{AuthProvider, Identity};
use crate::logger::Logger;
use crate::types::{Agent, AgentDraft, AgentStatus, ChatMessage, ChatOptions, HealthStatus};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session tag used when a chat call carries no session id
pub const DEFAULT_SESSION: &str = "default";

/// Facade lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkState {
    Uninitialized,
    Initializing,
    Ready,
    /// Login in progress; the facade stays usable
    Authenticating,
    Destroyed,
}

/// Registry key for [`SdkEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkEventKind {
    Initialized,
    Error,
    AuthLogin,
    AuthLogout,
    AuthError,
    ChatResponse,
    ChatError,
    AgentLoaded,
    AgentsLoaded,
    AgentCreated,
    AgentError,
}

impl SdkEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SdkEventKind::Initialized => "sdk:initialized",
            SdkEventKind::Error => "sdk:error",
            SdkEventKind::AuthLogin => "auth:login",
            SdkEventKind::AuthLogout => "auth:logout",
            SdkEventKind::AuthError => "auth:error",
            SdkEventKind::ChatResponse => "chat:response",
            SdkEventKind::ChatError => "chat:error",
            SdkEventKind::AgentLoaded => "agent:loaded",
            SdkEventKind::AgentsLoaded => "agents:loaded",
            SdkEventKind::AgentCreated => "agent:created",
            SdkEventKind::AgentError => "agent:error",
        }
    }
}

impl fmt::Display for SdkEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events published by the facade
#[derive(Debug, Clone)]
pub enum SdkEvent {
    Initialized { principal: String },
    Error { message: String },
    AuthLogin { principal: String },
    AuthLogout,
    AuthError { message: String },
    ChatResponse {
        session_id: String,
        agent_id: String,
        message: ChatMessage,
    },
    ChatError {
        session_id: String,
        agent_id: String,
        error: String,
    },
    AgentLoaded { agent: Agent },
    AgentsLoaded { agents: Vec<Agent> },
    AgentCreated { agent_id: String },
    AgentError { agent_id: String, error: String },
}

impl EmitterEvent for SdkEvent {
    type Kind = SdkEventKind;

    fn kind(&self) -> SdkEventKind {
        match self {
            SdkEvent::Initialized { .. } => SdkEventKind::Initialized,
            SdkEvent::Error { .. } => SdkEventKind::Error,
            SdkEvent::AuthLogin { .. } => SdkEventKind::AuthLogin,
            SdkEvent::AuthLogout => SdkEventKind::AuthLogout,
            SdkEvent::AuthError { .. } => SdkEventKind::AuthError,
            SdkEvent::ChatResponse { .. } => SdkEventKind::ChatResponse,
            SdkEvent::ChatError { .. } => SdkEventKind::ChatError,
            SdkEvent::AgentLoaded { .. } => SdkEventKind::AgentLoaded,
            SdkEvent::AgentsLoaded { .. } => SdkEventKind::AgentsLoaded,
            SdkEvent::AgentCreated { .. } => SdkEventKind::AgentCreated,
            SdkEvent::AgentError { .. } => SdkEventKind::AgentError,
        }
    }
}

/// SDK facade for one embedding context
pub struct CanistChat {
    config: SdkConfig,
    client: Arc<RpcClient>,
    agents: AgentManager,
    auth: Arc<dyn AuthProvider>,
    identity: RwLock<Identity>,
    state: RwLock<SdkState>,
    events: EventEmitter<SdkEvent>,
    logger: Logger,
}

impl CanistChat {
    /// Build a facade over an explicit backend and login flow
    pub fn new(config: SdkConfig, backend: Arc<dyn Backend>, auth: Arc<dyn AuthProvider>) -> Self {
        let client = Arc::new(RpcClient::new(backend));
        let logger = Logger::new(config.log_level);
        Self {
            agents: AgentManager::new(Arc::clone(&client)),
            client,
            auth,
            identity: RwLock::new(Identity::Anonymous),
            state: RwLock::new(SdkState::Uninitialized),
            events: EventEmitter::new(),
            logger,
            config,
        }
    }

    /// Build a facade that talks to the HTTP gateway for `config.network`
    pub fn connect(config: SdkConfig, auth: Arc<dyn AuthProvider>) -> Result<Self> {
        let backend = HttpBackend::new(&config)?;
        Ok(Self::new(config, Arc::new(backend), auth))
    }

    /// Establish the transport. Returns immediately when already ready.
    pub async fn initialize(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            match *state {
                SdkState::Ready | SdkState::Authenticating => return Ok(()),
                SdkState::Destroyed => return Err(CanistError::NotInitialized),
                SdkState::Initializing => {
                    return Err(CanistError::init("Initialization already in progress"))
                }
                SdkState::Uninitialized => *state = SdkState::Initializing,
            }
        }

        let identity = self.identity.read().await.clone();
        match self.client.initialize(identity.clone()).await {
            Ok(()) => {
                self.transition(SdkState::Initializing, SdkState::Ready).await;
                self.logger.info(
                    "CanistChat SDK initialized",
                    Some(serde_json::json!({
                        "backend": self.client.backend_name(),
                        "network": self.config.network,
                    })),
                );
                self.events.emit(&SdkEvent::Initialized {
                    principal: identity.principal().to_string(),
                });
                Ok(())
            }
            Err(e) => {
                self.transition(SdkState::Initializing, SdkState::Uninitialized)
                    .await;
                let err = CanistError::Init {
                    reason: e.to_string(),
                    source: Some(Box::new(e)),
                };
                self.logger.error(&err.to_string(), None);
                self.events.emit(&SdkEvent::Error {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Run the login flow and make its identity the active one
    pub async fn authenticate(&self) -> Result<Identity> {
        {
            let mut state = self.state.write().await;
            match *state {
                SdkState::Ready => *state = SdkState::Authenticating,
                SdkState::Authenticating => {
                    return Err(CanistError::Auth("Authentication already in progress".into()))
                }
                _ => return Err(CanistError::NotInitialized),
            }
        }

        let result = match self.auth.login().await {
            Ok(identity) => self.apply_identity(identity.clone()).await.map(|_| identity),
            Err(e) => Err(e),
        };
        self.transition(SdkState::Authenticating, SdkState::Ready).await;

        match result {
            Ok(identity) => {
                self.logger.info(
                    "User authenticated",
                    Some(serde_json::json!({ "principal": identity.principal() })),
                );
                self.events.emit(&SdkEvent::AuthLogin {
                    principal: identity.principal().to_string(),
                });
                Ok(identity)
            }
            Err(e) => {
                let err = match e {
                    CanistError::Auth(_) => e,
                    other => CanistError::Auth(other.to_string()),
                };
                self.logger.error(&err.to_string(), None);
                self.events.emit(&SdkEvent::AuthError {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Revert to the anonymous identity. No-op when already anonymous;
    /// an expired login is still cleared.
    pub async fn logout(&self) -> Result<()> {
        self.ensure_ready().await?;
        if matches!(*self.identity.read().await, Identity::Anonymous) {
            return Ok(());
        }

        let result = match self.auth.logout().await {
            Ok(()) => self.apply_identity(Identity::Anonymous).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.logger.info("User logged out", None);
                self.events.emit(&SdkEvent::AuthLogout);
                Ok(())
            }
            Err(e) => {
                let err = CanistError::Auth(e.to_string());
                self.logger.error(&err.to_string(), None);
                self.events.emit(&SdkEvent::AuthError {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Send one message to an agent
    ///
    /// The reply is returned and also emitted as `chat:response` (or
    /// `chat:error`) tagged with `session_id`, or `"default"`.
    pub async fn chat(
        &self,
        agent_id: &str,
        message: &str,
        session_id: Option<&str>,
    ) -> Result<ChatMessage> {
        self.chat_with_options(agent_id, message, session_id, ChatOptions::default())
            .await
    }

    pub async fn chat_with_options(
        &self,
        agent_id: &str,
        message: &str,
        session_id: Option<&str>,
        options: ChatOptions,
    ) -> Result<ChatMessage> {
        self.ensure_ready().await?;
        let session_id = session_id.unwrap_or(DEFAULT_SESSION).to_string();

        match self
            .client
            .process_chat(agent_id, message, self.config.api_key.as_deref(), options)
            .await
        {
            Ok(response) => {
                let reply = ChatMessage::from_response(&response);
                self.logger.debug(
                    "Chat response received",
                    Some(serde_json::json!({
                        "agentId": agent_id,
                        "sessionId": session_id,
                        "tokensUsed": response.tokens_used,
                        "processingTime": response.processing_time,
                    })),
                );
                self.events.emit(&SdkEvent::ChatResponse {
                    session_id,
                    agent_id: agent_id.to_string(),
                    message: reply.clone(),
                });
                Ok(reply)
            }
            Err(e) => {
                self.logger.error(
                    "Chat failed",
                    Some(serde_json::json!({
                        "agentId": agent_id,
                        "sessionId": session_id,
                        "error": e.to_string(),
                    })),
                );
                self.events.emit(&SdkEvent::ChatError {
                    session_id: session_id.clone(),
                    agent_id: agent_id.to_string(),
                    error: e.to_string(),
                });
                Err(CanistError::Chat {
                    session_id,
                    source: Box::new(e),
                })
            }
        }
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.ensure_ready().await?;
        match self.agents.get_agent(agent_id).await {
            Ok(agent) => {
                self.events.emit(&SdkEvent::AgentLoaded {
                    agent: agent.clone(),
                });
                Ok(agent)
            }
            Err(e) => Err(self.agent_failure(agent_id, e)),
        }
    }

    /// Agents owned by the current identity
    pub async fn get_agents(&self) -> Result<Vec<Agent>> {
        self.ensure_ready().await?;
        match self.agents.get_user_agents().await {
            Ok(agents) => {
                self.events.emit(&SdkEvent::AgentsLoaded {
                    agents: agents.clone(),
                });
                Ok(agents)
            }
            Err(e) => Err(self.agent_failure("*", e)),
        }
    }

    pub async fn create_agent(&self, draft: &AgentDraft) -> Result<String> {
        self.ensure_ready().await?;
        match self.agents.create_agent(draft).await {
            Ok(agent_id) => {
                self.logger.info(
                    "Agent created",
                    Some(serde_json::json!({ "agentId": agent_id })),
                );
                self.events.emit(&SdkEvent::AgentCreated {
                    agent_id: agent_id.clone(),
                });
                Ok(agent_id)
            }
            Err(CanistError::Validation(reason)) => {
                self.events.emit(&SdkEvent::AgentError {
                    agent_id: draft.name.clone(),
                    error: reason.clone(),
                });
                Err(CanistError::Validation(reason))
            }
            Err(e) => Err(self.agent_failure(&draft.name, e)),
        }
    }

    pub async fn update_agent_status(&self, agent_id: &str, status: AgentStatus) -> Result<()> {
        self.ensure_ready().await?;
        self.agents
            .update_agent_status(agent_id, status)
            .await
            .map_err(|e| self.agent_failure(agent_id, e))
    }

    pub async fn health_check(&self) -> Result<HealthStatus> {
        self.ensure_ready().await?;
        self.client.health_check().await
    }

    /// Detach every listener and make the facade unusable
    pub async fn destroy(&self) {
        *self.state.write().await = SdkState::Destroyed;
        self.events.remove_all_listeners(None);
        self.agents.clear_cache().await;
        self.logger.info("CanistChat SDK destroyed", None);
    }

    pub async fn state(&self) -> SdkState {
        *self.state.read().await
    }

    pub async fn identity(&self) -> Identity {
        self.identity.read().await.clone()
    }

    pub async fn principal(&self) -> String {
        self.identity.read().await.principal().to_string()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.identity.read().await.is_authenticated()
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn events(&self) -> &EventEmitter<SdkEvent> {
        &self.events
    }

    pub fn on(
        &self,
        kind: SdkEventKind,
        callback: impl Fn(&SdkEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.events.on(kind, callback)
    }

    pub fn once(
        &self,
        kind: SdkEventKind,
        callback: impl Fn(&SdkEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.events.once(kind, callback)
    }

    pub fn off(&self, kind: SdkEventKind, id: ListenerId) -> bool {
        self.events.off(kind, id)
    }

    async fn ensure_ready(&self) -> Result<()> {
        match *self.state.read().await {
            SdkState::Ready | SdkState::Authenticating => Ok(()),
            _ => Err(CanistError::NotInitialized),
        }
    }

    /// Move `from` → `to`, unless something else (e.g. `destroy`) moved
    /// the state in between
    async fn transition(&self, from: SdkState, to: SdkState) {
        let mut state = self.state.write().await;
        if *state == from {
            *state = to;
        }
    }

    async fn apply_identity(&self, identity: Identity) -> Result<()> {
        self.client.set_identity(identity.clone()).await?;
        *self.identity.write().await = identity;
        Ok(())
    }

    fn agent_failure(&self, agent_id: &str, e: CanistError) -> CanistError {
        self.events.emit(&SdkEvent::AgentError {
            agent_id: agent_id.to_string(),
            error: e.to_string(),
        });
        let err = CanistError::Agent {
            agent_id: agent_id.to_string(),
            source: Box::new(e),
        };
        self.logger.error(&err.to_string(), None);
        err
    }
}
