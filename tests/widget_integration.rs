//! Widget integration tests
//!
//! End-to-end tests mounting a `ChatWidget` on the in-memory backend.
//! Covers sending, error absorption, view state, escaping, and bootstrap
//! failures.

use canist_chat::backend::memory::{InjectedFailure, MemoryBackend};
use canist_chat::identity::AnonymousAuth;
use canist_chat::widget::CHAT_ERROR_TEXT;
use canist_chat::{
    Agent, CanistChat, CanistError, ChatResponse, ChatWidget, Document, Position, Sender,
    UiEvent, WidgetConfig, WidgetEvent, WidgetEventKind,
};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

fn agent() -> Agent {
    serde_json::from_value(serde_json::json!({
        "id": "support",
        "name": "Support Bot",
        "description": "Answers product questions",
        "status": "Active",
    }))
    .unwrap()
}

async fn backend() -> MemoryBackend {
    MemoryBackend::new().with_agent(agent()).await
}

fn unmounted(backend: &MemoryBackend, position: Position) -> ChatWidget {
    let config = WidgetConfig::new("support", "am-1")
        .with_container("chat")
        .with_position(position);
    let sdk = CanistChat::new(
        config.sdk_config(),
        Arc::new(backend.clone()),
        Arc::new(AnonymousAuth),
    );
    ChatWidget::new(config, Arc::new(sdk))
}

async fn mounted(backend: &MemoryBackend, position: Position) -> (ChatWidget, Document) {
    let mut doc = Document::new();
    doc.add_container("chat");
    let mut widget = unmounted(backend, position);
    assert_ok!(widget.mount(&mut doc).await);
    (widget, doc)
}

fn typing_nodes(widget: &ChatWidget, doc: &Document) -> usize {
    let messages = widget.elements().unwrap().messages;
    doc.children(messages)
        .into_iter()
        .filter(|n| doc.has_class(*n, "canistchat-typing"))
        .count()
}

// ─── Sending ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_blank_input_is_ignored() {
    let backend = backend().await;
    let (mut widget, mut doc) = mounted(&backend, Position::BottomRight).await;

    widget.send_text(&mut doc, "").await;
    widget.send_text(&mut doc, "   ").await;

    assert!(widget.messages().is_empty());
    assert_eq!(backend.chat_calls(), 0);
}

#[tokio::test]
async fn test_successful_send_appends_user_and_agent_messages() {
    let backend = backend().await;
    backend
        .set_response(ChatResponse {
            response: "Hi there".into(),
            tokens_used: 5,
            confidence: 0.9,
            context_id: None,
            processing_time: 120,
            provider_id: Some("p1".into()),
            model_used: Some("m1".into()),
            cached: false,
        })
        .await;
    let (mut widget, mut doc) = mounted(&backend, Position::BottomRight).await;

    let replies = Arc::new(Mutex::new(Vec::new()));
    let r = Arc::clone(&replies);
    widget.on(WidgetEventKind::Message, move |e| {
        if let WidgetEvent::Message(m) = e {
            r.lock().unwrap().push(m.content.clone());
        }
    });

    widget.send_text(&mut doc, "Hello").await;

    let messages = widget.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[0].content, "Hello");
    assert_eq!(messages[1].sender, Sender::Agent);
    assert_eq!(messages[1].content, "Hi there");
    assert!(!messages[1].is_error());

    let meta = messages[1].metadata.as_ref().unwrap();
    assert_eq!(meta.tokens_used, Some(5));
    assert_eq!(meta.confidence, Some(0.9));
    assert_eq!(meta.provider_id.as_deref(), Some("p1"));
    assert_eq!(meta.processing_time, Some(120));

    assert!(!widget.has_typing_indicator());
    assert_eq!(typing_nodes(&widget, &doc), 0);
    assert_eq!(widget.input_value(), "");
    assert_eq!(*replies.lock().unwrap(), vec!["Hi there"]);
    assert_eq!(backend.chat_calls(), 1);
}

#[tokio::test]
async fn test_failed_send_renders_error_bubble() {
    let backend = backend().await;
    let (mut widget, mut doc) = mounted(&backend, Position::BottomRight).await;
    backend
        .set_chat_failure(Some(InjectedFailure::Unavailable("connection reset".into())))
        .await;

    widget.send_text(&mut doc, "Are you there?").await;

    let agent_msgs: Vec<_> = widget
        .messages()
        .iter()
        .filter(|m| m.sender == Sender::Agent)
        .collect();
    assert_eq!(agent_msgs.len(), 1);
    assert!(agent_msgs[0].is_error());
    assert_eq!(agent_msgs[0].content, CHAT_ERROR_TEXT);
    assert_eq!(typing_nodes(&widget, &doc), 0);

    let messages = widget.elements().unwrap().messages;
    let errors = doc
        .children(messages)
        .into_iter()
        .filter(|n| doc.has_class(*n, "canistchat-message-error"))
        .count();
    assert_eq!(errors, 1);

    // still usable afterwards
    backend.set_chat_failure(None).await;
    widget.send_text(&mut doc, "Retry").await;
    assert_eq!(widget.messages().len(), 4);
    assert!(!widget.messages()[3].is_error());
}

#[tokio::test]
async fn test_send_button_and_timestamps() {
    let backend = backend().await;
    let (mut widget, mut doc) = mounted(&backend, Position::Inline).await;
    let el = *widget.elements().unwrap();

    for text in ["one", "two", "three"] {
        widget
            .handle_event(&mut doc, UiEvent::Input { target: el.input, value: text.into() })
            .await;
        widget.handle_event(&mut doc, UiEvent::Click(el.send)).await;
    }

    let messages = widget.messages();
    assert_eq!(messages.len(), 6);
    for pair in messages.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
    assert_eq!(messages[5].content, "Echo: three");
}

// ─── View State ──────────────────────────────────────────────────

#[tokio::test]
async fn test_toggle_alternates_for_floating_widget() {
    let backend = backend().await;
    let (mut widget, mut doc) = mounted(&backend, Position::BottomRight).await;
    let el = *widget.elements().unwrap();
    let toggle = el.toggle.unwrap();

    let opens = Arc::new(Mutex::new(0));
    let o = Arc::clone(&opens);
    widget.on(WidgetEventKind::Open, move |_| *o.lock().unwrap() += 1);

    assert!(!widget.is_open());
    assert!(doc.is_hidden(el.panel));

    widget.toggle(&mut doc);
    assert!(widget.is_open());
    assert!(!doc.is_hidden(el.panel));
    assert!(doc.is_hidden(toggle));

    widget.toggle(&mut doc);
    assert!(!widget.is_open());
    assert!(doc.is_hidden(el.panel));
    assert!(!doc.is_hidden(toggle));

    widget.handle_event(&mut doc, UiEvent::Click(toggle)).await;
    assert!(widget.is_open());
    widget.handle_event(&mut doc, UiEvent::Click(el.close.unwrap())).await;
    assert!(!widget.is_open());

    assert_eq!(*opens.lock().unwrap(), 2);
}

#[tokio::test]
async fn test_toggle_is_noop_for_inline_widget() {
    let backend = backend().await;
    let (mut widget, mut doc) = mounted(&backend, Position::Inline).await;
    let el = *widget.elements().unwrap();

    assert!(el.toggle.is_none());
    assert!(!doc.is_hidden(el.panel));

    widget.toggle(&mut doc);
    assert!(!doc.is_hidden(el.panel));
    widget.close(&mut doc);
    assert!(!doc.is_hidden(el.panel));
    widget.toggle(&mut doc);
    assert!(!doc.is_hidden(el.panel));
}

#[tokio::test]
async fn test_minimize_via_header_button() {
    let backend = backend().await;
    let (mut widget, mut doc) = mounted(&backend, Position::Inline).await;
    let el = *widget.elements().unwrap();

    widget.handle_event(&mut doc, UiEvent::Click(el.minimize)).await;
    assert!(widget.is_minimized());
    assert!(doc.is_hidden(el.messages));
    assert!(doc.has_class(el.panel, "canistchat-minimized"));

    widget.handle_event(&mut doc, UiEvent::Click(el.minimize)).await;
    assert!(!widget.is_minimized());
    assert!(!doc.is_hidden(el.messages));
}

// ─── Escaping ────────────────────────────────────────────────────

#[tokio::test]
async fn test_message_content_is_rendered_as_text() {
    let backend = backend().await;
    let (mut widget, mut doc) = mounted(&backend, Position::Inline).await;
    let root = widget.elements().unwrap().root;

    let payload = "<img src=x onerror=alert(1)>";
    widget.send_text(&mut doc, payload).await;

    assert_eq!(widget.messages()[0].content, payload);
    assert!(doc.elements_by_tag(root, "img").is_empty());

    let html = doc.to_html(root);
    assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
    assert!(!html.contains("<img"));
}

// ─── Bootstrap ───────────────────────────────────────────────────

#[tokio::test]
async fn test_missing_container_is_fatal() {
    let backend = backend().await;
    let mut doc = Document::new();
    doc.add_container("somewhere-else");
    let mut widget = unmounted(&backend, Position::BottomRight);

    let errors = Arc::new(Mutex::new(Vec::new()));
    let e = Arc::clone(&errors);
    widget.on(WidgetEventKind::Error, move |ev| {
        if let WidgetEvent::Error { message } = ev {
            e.lock().unwrap().push(message.clone());
        }
    });

    let err = assert_err!(widget.mount(&mut doc).await);
    match err {
        CanistError::Widget { id, .. } => assert_eq!(id, "chat"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(!widget.is_initialized());
    assert_eq!(errors.lock().unwrap().len(), 1);

    let logs = widget.sdk().logger().logs();
    assert!(logs.iter().any(|l| l.message == "Failed to initialize chat widget"));
}

#[tokio::test]
async fn test_unknown_agent_fails_mount() {
    let backend = MemoryBackend::new();
    let mut doc = Document::new();
    doc.add_container("chat");
    let mut widget = unmounted(&backend, Position::BottomRight);

    let err = assert_err!(widget.mount(&mut doc).await);
    assert!(err.is_not_found());
    let host = doc.element_by_id("chat").unwrap();
    assert!(doc.children(host).is_empty());

    // sending on an unmounted widget does nothing
    widget.send_text(&mut doc, "hello").await;
    assert!(widget.messages().is_empty());
    assert_eq!(backend.chat_calls(), 0);
}

#[tokio::test]
async fn test_widgets_get_distinct_sessions() {
    let backend = backend().await;
    let a = unmounted(&backend, Position::BottomRight);
    let b = unmounted(&backend, Position::BottomRight);
    assert_ne!(a.session_id(), b.session_id());
    assert!(a.session_id().starts_with("session_"));
}
