//! Core data types for agents, chat messages, and service responses
//!
//! All types use camelCase JSON serialization for wire compatibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Lifecycle status of an agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
    Archived,
}

/// Client-side projection of an agent record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: AgentStatus,
    /// Principal of the owning user
    #[serde(default)]
    pub owner: String,
    /// Unix timestamp in milliseconds
    #[serde(default)]
    pub created: u64,
    /// Unix timestamp in milliseconds
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub config: AgentConfig,
}

impl Agent {
    /// Welcome text shown when a widget binds to this agent
    pub fn welcome_message(&self) -> String {
        self.config
            .appearance
            .welcome_message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Hi! I'm {}. How can I help you today?", self.name))
    }
}

/// Nested agent configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub behavior: Behavior,
    #[serde(default)]
    pub appearance: Appearance,
    #[serde(default)]
    pub knowledge_base: Vec<KnowledgeSource>,
    #[serde(default)]
    pub context: ContextSettings,
    #[serde(default)]
    pub integrations: IntegrationSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personality {
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub communication_style: String,
    #[serde(default)]
    pub response_pattern: String,
}

/// Generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Behavior {
    #[serde(default = "default_max_tokens")]
    pub max_response_length: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_creativity")]
    pub creativity: f64,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub guardrails: Vec<String>,
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f64 {
    0.7
}

fn default_creativity() -> f64 {
    0.5
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            max_response_length: default_max_tokens(),
            temperature: default_temperature(),
            creativity: default_creativity(),
            system_prompt: String::new(),
            guardrails: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// "light" | "dark" | "auto"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSource {
    /// e.g. "document", "url", "database"
    pub source_type: String,
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default = "default_priority")]
    pub priority: u32,
}

fn default_priority() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSettings {
    #[serde(default = "default_context_length")]
    pub max_context_length: u32,
    #[serde(default = "default_true")]
    pub enable_memory: bool,
    #[serde(default = "default_true")]
    pub enable_learning: bool,
    #[serde(default = "default_memory_duration")]
    pub memory_duration_hours: u32,
}

fn default_context_length() -> u32 {
    4096
}

fn default_true() -> bool {
    true
}

fn default_memory_duration() -> u32 {
    24
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            max_context_length: default_context_length(),
            enable_memory: true,
            enable_learning: true,
            memory_duration_hours: default_memory_duration(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationSettings {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub webhooks: Vec<String>,
    #[serde(default)]
    pub api_access: bool,
}

/// Partially filled agent description passed to `create_agent`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<AgentConfig>,
}

impl AgentDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

/// Optional per-message details from the processing service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub is_error: bool,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    pub fn new(content: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: message_id(),
            content: content.into(),
            sender,
            timestamp: monotonic_now(),
            metadata: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, Sender::User)
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(content, Sender::Agent)
    }

    /// Agent-side message standing in for a failed reply
    pub fn error(content: impl Into<String>) -> Self {
        Self::agent(content).with_metadata(MessageMetadata {
            is_error: true,
            ..Default::default()
        })
    }

    /// Agent message built from a processing-service response
    pub fn from_response(response: &ChatResponse) -> Self {
        Self::agent(response.response.clone()).with_metadata(MessageMetadata {
            processing_time: Some(response.processing_time),
            tokens_used: Some(response.tokens_used),
            confidence: Some(response.confidence),
            provider_id: response.provider_id.clone(),
            model_used: response.model_used.clone(),
            context_id: response.context_id.clone(),
            cached: response.cached,
            is_error: false,
        })
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_error(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.is_error)
    }
}

/// Conversation context and generation parameters for a chat call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: bool,
}

/// Request sent to the message processing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub agent_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub options: ChatOptions,
}

/// Response from the message processing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub tokens_used: u32,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    /// Milliseconds spent by the service
    #[serde(default)]
    pub processing_time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default)]
    pub cached: bool,
}

/// Service health summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub counters: HashMap<String, u64>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_str(), "healthy" | "ok")
    }
}

/// Generate a conversation session id: `session_<millis>_<9 chars>`
pub fn session_id() -> String {
    let suffix: String = uuid::Uuid::new_v4().simple().to_string().chars().take(9).collect();
    format!("session_{}_{}", now_millis(), suffix)
}

static MESSAGE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Generate a time-based local message id
pub fn message_id() -> String {
    let seq = MESSAGE_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("msg_{}_{}", now_millis(), seq)
}

static LAST_TIMESTAMP: Mutex<Option<DateTime<Utc>>> = Mutex::new(None);

/// Wall-clock time that never goes backwards across calls
fn monotonic_now() -> DateTime<Utc> {
    let now = Utc::now();
    let mut last = LAST_TIMESTAMP.lock().unwrap_or_else(|e| e.into_inner());
    let stamp = match *last {
        Some(prev) if prev > now => prev,
        _ => now,
    };
    *last = Some(stamp);
    stamp
}

/// Current time in Unix milliseconds
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
