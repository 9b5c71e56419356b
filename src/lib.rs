//! # canist-chat
//!
//! Client SDK and embeddable chat widget for CanistChat AI agents.
//!
//! ## Overview
//!
//! `canist-chat` binds a host application to an agent running in the
//! remote CanistChat services. The SDK facade handles identity, transport,
//! agent lookup, and chat; the widget renders a conversation into a
//! container element of a [`Document`].
//!
//! ## Quick Start
//!
//! ```rust
//! use canist_chat::{CanistChat, ChatWidget, Document, SdkConfig, WidgetConfig};
//! use canist_chat::backend::memory::MemoryBackend;
//! use canist_chat::identity::AnonymousAuth;
//! use std::sync::Arc;
//!
//! # async fn example() -> canist_chat::Result<()> {
//! let backend = MemoryBackend::new()
//!     .with_agent(serde_json::from_value(serde_json::json!({
//!         "id": "support", "name": "Support Bot"
//!     }))?)
//!     .await;
//!
//! let config = WidgetConfig::new("support", "rrkah-fqaaa-aaaaa-aaaaq-cai")
//!     .with_container("chat");
//! let sdk = CanistChat::new(config.sdk_config(), Arc::new(backend), Arc::new(AnonymousAuth));
//!
//! let mut doc = Document::new();
//! doc.add_container("chat");
//!
//! let mut widget = ChatWidget::new(config, Arc::new(sdk));
//! widget.mount(&mut doc).await?;
//! widget.send_text(&mut doc, "Hello").await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Backends
//!
//! - **http**: JSON over the CanistChat HTTP gateway
//! - **memory**: In-memory backend for tests and local development
//!
//! ## Architecture
//!
//! - **Backend** trait: boundary to the remote services
//! - **RpcClient**: the only component making outbound calls
//! - **AgentManager**: cached agent lookup
//! - **CanistChat**: SDK facade with lifecycle and event bus
//! - **ChatWidget**: DOM construction, view state, and message flow

pub mod agents;
pub mod backend;
pub mod client;
pub mod config;
pub mod dom;
pub mod emitter;
pub mod error;
pub mod identity;
pub mod logger;
pub mod sdk;
pub mod types;
pub mod widget;

use std::sync::Arc;

// Re-export core types
pub use agents::AgentManager;
pub use backend::Backend;
pub use client::RpcClient;
pub use config::{Network, Position, SdkConfig, Theme, WidgetConfig, WidgetSize};
pub use dom::{escape_html, Document, NodeId};
pub use emitter::{EmitterEvent, EventEmitter, ListenerId};
pub use error::{CanistError, Result};
pub use identity::{AuthProvider, Identity};
pub use logger::{LogEntry, LogLevel, Logger};
pub use sdk::{CanistChat, SdkEvent, SdkEventKind, SdkState};
pub use types::{
    Agent, AgentConfig, AgentDraft, AgentStatus, ChatMessage, ChatOptions, ChatResponse,
    HealthStatus, MessageMetadata, Sender,
};
pub use widget::{ChatWidget, UiEvent, WidgetEvent, WidgetEventKind};

/// Create an SDK facade talking to the HTTP gateway
///
/// Call `initialize()` on the result before use.
pub fn init_canist_chat(config: SdkConfig, auth: Arc<dyn AuthProvider>) -> Result<CanistChat> {
    CanistChat::connect(config, auth)
}

/// Create an unmounted widget with its own facade over the HTTP gateway
pub fn create_chat_widget(config: WidgetConfig) -> Result<ChatWidget> {
    config.validate()?;
    let sdk = CanistChat::connect(config.sdk_config(), Arc::new(identity::AnonymousAuth))?;
    Ok(ChatWidget::new(config, Arc::new(sdk)))
}
