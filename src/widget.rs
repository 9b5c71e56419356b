//! Embeddable chat widget
//!
//! `ChatWidget` binds one agent and one SDK facade to a container element
//! in a [`Document`]. It builds its own subtree (toggle button, panel with
//! header, message list, and input), reacts to UI events, and turns user
//! input into chat calls. Chat failures never escape `send_message`; they
//! become an error bubble in the transcript.

use crate::config::WidgetConfig;
use crate::dom::{Document, NodeId};
use crate::emitter::{EmitterEvent, EventEmitter, ListenerId};
use crate::error::{CanistError, Result};
use crate::sdk::CanistChat;
use crate::types::{session_id, Agent, ChatMessage, Sender};
use std::sync::Arc;

/// Text shown in place of a reply when a chat call fails
pub const CHAT_ERROR_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Largest height, in rows, the input grows to
const MAX_INPUT_ROWS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetEventKind {
    Ready,
    Open,
    Close,
    Minimize,
    Restore,
    Message,
    Error,
}

/// Events published by a widget
#[derive(Debug, Clone)]
pub enum WidgetEvent {
    Ready { agent_id: String },
    Open,
    Close,
    Minimize,
    Restore,
    /// An agent reply was rendered
    Message(ChatMessage),
    /// Widget bootstrap failed
    Error { message: String },
}

impl EmitterEvent for WidgetEvent {
    type Kind = WidgetEventKind;

    fn kind(&self) -> WidgetEventKind {
        match self {
            WidgetEvent::Ready { .. } => WidgetEventKind::Ready,
            WidgetEvent::Open => WidgetEventKind::Open,
            WidgetEvent::Close => WidgetEventKind::Close,
            WidgetEvent::Minimize => WidgetEventKind::Minimize,
            WidgetEvent::Restore => WidgetEventKind::Restore,
            WidgetEvent::Message(_) => WidgetEventKind::Message,
            WidgetEvent::Error { .. } => WidgetEventKind::Error,
        }
    }
}

/// User interaction delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Click(NodeId),
    KeyDown {
        target: NodeId,
        key: String,
        shift: bool,
    },
    Input {
        target: NodeId,
        value: String,
    },
}

/// Nodes of the widget subtree
#[derive(Debug, Clone, Copy)]
pub struct WidgetElements {
    pub root: NodeId,
    /// Absent for inline widgets
    pub toggle: Option<NodeId>,
    pub panel: NodeId,
    pub title: NodeId,
    pub minimize: NodeId,
    /// Absent for inline widgets
    pub close: Option<NodeId>,
    pub messages: NodeId,
    pub input_area: NodeId,
    pub input: NodeId,
    pub send: NodeId,
}

pub struct ChatWidget {
    config: WidgetConfig,
    session_id: String,
    sdk: Arc<CanistChat>,
    agent: Option<Agent>,
    messages: Vec<ChatMessage>,
    elements: Option<WidgetElements>,
    typing: Option<NodeId>,
    input: String,
    is_open: bool,
    is_minimized: bool,
    events: EventEmitter<WidgetEvent>,
}

impl ChatWidget {
    /// Create an unmounted widget over an existing facade
    pub fn new(config: WidgetConfig, sdk: Arc<CanistChat>) -> Self {
        let is_open = config.position.is_inline();
        Self {
            config,
            session_id: session_id(),
            sdk,
            agent: None,
            messages: Vec::new(),
            elements: None,
            typing: None,
            input: String::new(),
            is_open,
            is_minimized: false,
            events: EventEmitter::new(),
        }
    }

    /// Initialize the facade, load the agent, and render into the
    /// configured container.
    ///
    /// A missing container is fatal. Any failure is also logged and
    /// emitted as a widget `Error` event.
    pub async fn mount(&mut self, doc: &mut Document) -> Result<()> {
        if self.elements.is_some() {
            return Ok(());
        }

        match self.bootstrap(doc).await {
            Ok(()) => {
                tracing::info!(
                    agent_id = %self.config.agent_id,
                    session_id = %self.session_id,
                    position = %self.config.position,
                    "Chat widget mounted"
                );
                self.events.emit(&WidgetEvent::Ready {
                    agent_id: self.config.agent_id.clone(),
                });
                Ok(())
            }
            Err(e) => {
                self.sdk.logger().error(
                    "Failed to initialize chat widget",
                    Some(serde_json::json!({
                        "agentId": self.config.agent_id,
                        "containerId": self.config.container_id,
                        "error": e.to_string(),
                    })),
                );
                self.events.emit(&WidgetEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn bootstrap(&mut self, doc: &mut Document) -> Result<()> {
        self.sdk.initialize().await?;
        let agent = self.sdk.get_agent(&self.config.agent_id).await?;

        let container = doc
            .element_by_id(&self.config.container_id)
            .ok_or_else(|| CanistError::Widget {
                id: self.config.container_id.clone(),
                reason: "Container element not found".to_string(),
            })?;

        let elements = self.build(doc, container, &agent);
        self.elements = Some(elements);
        self.agent = Some(agent);
        Ok(())
    }

    fn build(&self, doc: &mut Document, container: NodeId, agent: &Agent) -> WidgetElements {
        let inline = self.config.position.is_inline();
        let theme = self
            .config
            .theme
            .resolve(agent.config.appearance.theme.as_deref());

        let root = doc.create_element("div");
        doc.set_attribute(root, "id", &format!("canistchat-{}", self.session_id));
        doc.add_class(root, "canistchat-widget");
        doc.add_class(root, &format!("canistchat-{}", self.config.position));
        doc.add_class(root, &format!("canistchat-theme-{}", theme.as_str()));
        if let Some(color) = &agent.config.appearance.primary_color {
            doc.set_style(root, "--canistchat-primary", color);
        }
        for (property, value) in &self.config.custom_styles {
            doc.set_style(root, property, value);
        }

        let toggle = if inline {
            None
        } else {
            let toggle = doc.create_element("button");
            doc.add_class(toggle, "canistchat-toggle");
            doc.set_attribute(toggle, "type", "button");
            doc.set_attribute(toggle, "aria-label", &format!("Chat with {}", agent.name));
            doc.set_text(toggle, "💬");
            doc.append_child(root, toggle);
            Some(toggle)
        };

        let panel = doc.create_element("div");
        doc.add_class(panel, "canistchat-panel");
        let (width, height) = self.config.size.dimensions();
        doc.set_style(panel, "width", &width);
        doc.set_style(panel, "height", &height);
        doc.set_hidden(panel, !inline);
        doc.append_child(root, panel);

        let header = doc.create_element("div");
        doc.add_class(header, "canistchat-header");
        doc.append_child(panel, header);

        if let Some(avatar) = &agent.config.appearance.avatar {
            let img = doc.create_element("img");
            doc.add_class(img, "canistchat-avatar");
            doc.set_attribute(img, "src", avatar);
            doc.set_attribute(img, "alt", &agent.name);
            doc.append_child(header, img);
        }

        let title = doc.create_element("span");
        doc.add_class(title, "canistchat-title");
        doc.set_text(title, &agent.name);
        doc.append_child(header, title);

        let minimize = header_button(doc, header, "canistchat-minimize", "Minimize", "−");
        let close = if inline {
            None
        } else {
            Some(header_button(doc, header, "canistchat-close", "Close", "×"))
        };

        let messages = doc.create_element("div");
        doc.add_class(messages, "canistchat-messages");
        doc.set_attribute(messages, "role", "log");
        doc.append_child(panel, messages);

        let welcome = doc.create_element("div");
        doc.add_class(welcome, "canistchat-welcome");
        doc.set_text(welcome, &agent.welcome_message());
        doc.append_child(messages, welcome);

        let input_area = doc.create_element("div");
        doc.add_class(input_area, "canistchat-input-area");
        doc.append_child(panel, input_area);

        let input = doc.create_element("textarea");
        doc.add_class(input, "canistchat-input");
        doc.set_attribute(input, "rows", "1");
        doc.set_attribute(input, "placeholder", "Type your message...");
        doc.append_child(input_area, input);

        let send = doc.create_element("button");
        doc.add_class(send, "canistchat-send");
        doc.set_attribute(send, "type", "button");
        doc.set_text(send, "Send");
        doc.append_child(input_area, send);

        doc.append_child(container, root);

        WidgetElements {
            root,
            toggle,
            panel,
            title,
            minimize,
            close,
            messages,
            input_area,
            input,
            send,
        }
    }

    /// Route a UI event to the matching widget action
    pub async fn handle_event(&mut self, doc: &mut Document, event: UiEvent) {
        let Some(el) = self.elements else {
            return;
        };

        match event {
            UiEvent::Click(target) if Some(target) == el.toggle => self.toggle(doc),
            UiEvent::Click(target) if Some(target) == el.close => self.close(doc),
            UiEvent::Click(target) if target == el.minimize => self.toggle_minimize(doc),
            UiEvent::Click(target) if target == el.send => self.send_message(doc).await,
            UiEvent::KeyDown { target, key, shift }
                if target == el.input && key == "Enter" && !shift =>
            {
                self.send_message(doc).await
            }
            UiEvent::Input { target, value } if target == el.input => {
                self.set_input(doc, &value);
            }
            _ => {}
        }
    }

    /// Send the current input to the agent
    ///
    /// Empty or whitespace-only input is ignored. The reply, or an error
    /// bubble when the call fails, is appended to the transcript.
    pub async fn send_message(&mut self, doc: &mut Document) {
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return;
        }
        if self.elements.is_none() {
            tracing::debug!(session_id = %self.session_id, "Send ignored: widget not mounted");
            return;
        }

        self.set_input(doc, "");
        self.append_message(doc, ChatMessage::user(text.clone()));
        self.show_typing(doc);

        let result = self
            .sdk
            .chat(&self.config.agent_id, &text, Some(self.session_id.as_str()))
            .await;
        self.hide_typing(doc);

        match result {
            Ok(reply) => {
                self.append_message(doc, reply.clone());
                self.events.emit(&WidgetEvent::Message(reply));
            }
            Err(e) => {
                tracing::warn!(
                    agent_id = %self.config.agent_id,
                    session_id = %self.session_id,
                    error = %e,
                    "Chat message failed"
                );
                self.append_message(doc, ChatMessage::error(CHAT_ERROR_TEXT));
            }
        }
    }

    /// Replace the input text and send it
    pub async fn send_text(&mut self, doc: &mut Document, text: &str) {
        self.set_input(doc, text);
        self.send_message(doc).await;
    }

    /// Set the input value, growing the textarea with its line count
    pub fn set_input(&mut self, doc: &mut Document, value: &str) {
        self.input = value.to_string();
        if let Some(el) = self.elements {
            doc.set_text(el.input, value);
            let rows = value.lines().count().clamp(1, MAX_INPUT_ROWS);
            doc.set_attribute(el.input, "rows", &rows.to_string());
        }
    }

    pub fn open(&mut self, doc: &mut Document) {
        if self.config.position.is_inline() || self.is_open {
            return;
        }
        let Some(el) = self.elements else {
            return;
        };

        self.is_open = true;
        if let Some(toggle) = el.toggle {
            doc.set_hidden(toggle, true);
        }
        doc.set_hidden(el.panel, false);
        if self.is_minimized {
            self.restore(doc);
        }
        self.events.emit(&WidgetEvent::Open);
    }

    pub fn close(&mut self, doc: &mut Document) {
        if self.config.position.is_inline() || !self.is_open {
            return;
        }
        let Some(el) = self.elements else {
            return;
        };

        self.is_open = false;
        doc.set_hidden(el.panel, true);
        if let Some(toggle) = el.toggle {
            doc.set_hidden(toggle, false);
        }
        self.events.emit(&WidgetEvent::Close);
    }

    pub fn toggle(&mut self, doc: &mut Document) {
        if self.is_open {
            self.close(doc);
        } else {
            self.open(doc);
        }
    }

    /// Collapse the panel to its header
    pub fn minimize(&mut self, doc: &mut Document) {
        let Some(el) = self.elements else {
            return;
        };
        if self.is_minimized {
            return;
        }

        self.is_minimized = true;
        doc.add_class(el.panel, "canistchat-minimized");
        doc.set_hidden(el.messages, true);
        doc.set_hidden(el.input_area, true);
        self.events.emit(&WidgetEvent::Minimize);
    }

    pub fn restore(&mut self, doc: &mut Document) {
        let Some(el) = self.elements else {
            return;
        };
        if !self.is_minimized {
            return;
        }

        self.is_minimized = false;
        doc.remove_class(el.panel, "canistchat-minimized");
        doc.set_hidden(el.messages, false);
        doc.set_hidden(el.input_area, false);
        self.events.emit(&WidgetEvent::Restore);
    }

    pub fn toggle_minimize(&mut self, doc: &mut Document) {
        if self.is_minimized {
            self.restore(doc);
        } else {
            self.minimize(doc);
        }
    }

    /// Remove the widget subtree and detach widget listeners.
    /// The facade is left untouched since it may be shared.
    pub fn destroy(&mut self, doc: &mut Document) {
        if let Some(el) = self.elements.take() {
            doc.remove(el.root);
        }
        self.typing = None;
        self.events.remove_all_listeners(None);
    }

    pub fn on(
        &self,
        kind: WidgetEventKind,
        callback: impl Fn(&WidgetEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.events.on(kind, callback)
    }

    pub fn off(&self, kind: WidgetEventKind, id: ListenerId) -> bool {
        self.events.off(kind, id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn agent(&self) -> Option<&Agent> {
        self.agent.as_ref()
    }

    pub fn elements(&self) -> Option<&WidgetElements> {
        self.elements.as_ref()
    }

    pub fn input_value(&self) -> &str {
        &self.input
    }

    pub fn is_initialized(&self) -> bool {
        self.elements.is_some()
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_minimized(&self) -> bool {
        self.is_minimized
    }

    pub fn has_typing_indicator(&self) -> bool {
        self.typing.is_some()
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn sdk(&self) -> &Arc<CanistChat> {
        &self.sdk
    }

    fn append_message(&mut self, doc: &mut Document, message: ChatMessage) {
        if let Some(el) = self.elements {
            let bubble = doc.create_element("div");
            doc.set_attribute(bubble, "data-message-id", &message.id);
            doc.add_class(bubble, "canistchat-message");
            doc.add_class(bubble, sender_class(message.sender));
            if message.is_error() {
                doc.add_class(bubble, "canistchat-message-error");
            }

            let content = doc.create_element("div");
            doc.add_class(content, "canistchat-message-content");
            doc.set_text(content, &message.content);
            doc.append_child(bubble, content);

            let time = doc.create_element("span");
            doc.add_class(time, "canistchat-message-time");
            doc.set_text(time, &message.timestamp.format("%H:%M").to_string());
            doc.append_child(bubble, time);

            doc.append_child(el.messages, bubble);
            // keep the indicator last
            if let Some(typing) = self.typing {
                doc.append_child(el.messages, typing);
            }
        }
        self.messages.push(message);
    }

    fn show_typing(&mut self, doc: &mut Document) {
        let Some(el) = self.elements else {
            return;
        };
        self.hide_typing(doc);

        let typing = doc.create_element("div");
        doc.add_class(typing, "canistchat-typing");
        doc.set_attribute(typing, "aria-label", "Agent is typing");
        for _ in 0..3 {
            let dot = doc.create_element("span");
            doc.add_class(dot, "canistchat-typing-dot");
            doc.append_child(typing, dot);
        }
        doc.append_child(el.messages, typing);
        self.typing = Some(typing);
    }

    fn hide_typing(&mut self, doc: &mut Document) {
        if let Some(typing) = self.typing.take() {
            doc.remove(typing);
        }
    }
}

fn header_button(doc: &mut Document, header: NodeId, class: &str, label: &str, text: &str) -> NodeId {
    let button = doc.create_element("button");
    doc.add_class(button, class);
    doc.set_attribute(button, "type", "button");
    doc.set_attribute(button, "aria-label", label);
    doc.set_text(button, text);
    doc.append_child(header, button);
    button
}

fn sender_class(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "canistchat-message-user",
        Sender::Agent => "canistchat-message-agent",
    }
}
