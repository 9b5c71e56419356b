//! SDK facade integration tests
//!
//! End-to-end tests exercising the `CanistChat` lifecycle with the
//! in-memory backend. Covers initialization, authentication, chat, agent
//! management, event delivery, logging, and concurrency.

use canist_chat::backend::memory::{InjectedFailure, MemoryBackend};
use canist_chat::identity::{AnonymousAuth, StaticAuth};
use canist_chat::{
    create_chat_widget, init_canist_chat, AgentDraft, AgentStatus, AuthProvider, CanistChat,
    CanistError, ChatOptions, LogLevel, SdkConfig, SdkEvent, SdkEventKind, SdkState,
    WidgetConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

async fn backend() -> MemoryBackend {
    MemoryBackend::new()
        .with_agent(
            serde_json::from_value(serde_json::json!({
                "id": "support",
                "name": "Support Bot",
                "owner": "alice",
            }))
            .unwrap(),
        )
        .await
}

fn sdk(backend: &MemoryBackend, auth: Arc<dyn AuthProvider>) -> CanistChat {
    CanistChat::new(SdkConfig::new("am-1"), Arc::new(backend.clone()), auth)
}

// ─── Lifecycle ───────────────────────────────────────────────────

#[tokio::test]
async fn test_full_lifecycle() {
    let backend = backend().await;
    let sdk = sdk(&backend, Arc::new(StaticAuth::new("alice")));

    let seen = Arc::new(Mutex::new(Vec::new()));
    for kind in [
        SdkEventKind::Initialized,
        SdkEventKind::AuthLogin,
        SdkEventKind::AgentsLoaded,
        SdkEventKind::AgentCreated,
        SdkEventKind::ChatResponse,
        SdkEventKind::AuthLogout,
    ] {
        let s = Arc::clone(&seen);
        sdk.on(kind, move |e: &SdkEvent| {
            s.lock().unwrap().push(e.clone());
        });
    }

    assert_ok!(sdk.initialize().await);
    assert_ok!(sdk.authenticate().await);
    assert_eq!(sdk.principal().await, "alice");

    let agents = assert_ok!(sdk.get_agents().await);
    assert_eq!(agents.len(), 1);

    let id = assert_ok!(sdk.create_agent(&AgentDraft::new("Billing")).await);
    let reply = assert_ok!(sdk.chat(&id, "invoice?", Some("s-42")).await);
    assert_eq!(reply.content, "Echo: invoice?");

    assert_ok!(sdk.logout().await);
    sdk.destroy().await;
    assert_eq!(sdk.state().await, SdkState::Destroyed);

    let kinds: Vec<&str> = seen
        .lock()
        .unwrap()
        .iter()
        .map(|e| match e {
            SdkEvent::Initialized { .. } => "init",
            SdkEvent::AuthLogin { .. } => "login",
            SdkEvent::AgentsLoaded { .. } => "agents",
            SdkEvent::AgentCreated { .. } => "created",
            SdkEvent::ChatResponse { .. } => "chat",
            SdkEvent::AuthLogout => "logout",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["init", "login", "agents", "created", "chat", "logout"]);
}

#[tokio::test]
async fn test_once_listener_and_off() {
    let backend = backend().await;
    let sdk = sdk(&backend, Arc::new(AnonymousAuth));
    assert_ok!(sdk.initialize().await);

    let once_hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&once_hits);
    sdk.once(SdkEventKind::ChatResponse, move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });

    let all_hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&all_hits);
    let id = sdk.on(SdkEventKind::ChatResponse, move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });

    for _ in 0..3 {
        assert_ok!(sdk.chat("support", "hi", None).await);
    }
    assert!(sdk.off(SdkEventKind::ChatResponse, id));
    assert_ok!(sdk.chat("support", "hi", None).await);

    assert_eq!(once_hits.load(Ordering::SeqCst), 1);
    assert_eq!(all_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_panicking_listener_does_not_break_chat() {
    let backend = backend().await;
    let sdk = sdk(&backend, Arc::new(AnonymousAuth));
    assert_ok!(sdk.initialize().await);

    sdk.on(SdkEventKind::ChatResponse, |_| panic!("bad subscriber"));
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    sdk.on(SdkEventKind::ChatResponse, move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });

    assert_ok!(sdk.chat("support", "still works?", None).await);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

// ─── Chat ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_options_forward_context() {
    let backend = backend().await;
    let sdk = sdk(&backend, Arc::new(AnonymousAuth));
    assert_ok!(sdk.initialize().await);

    let reply = assert_ok!(
        sdk.chat_with_options(
            "support",
            "continue",
            None,
            ChatOptions {
                context_id: Some("ctx-9".into()),
                temperature: Some(0.2),
                max_tokens: Some(64),
                stream: false,
            },
        )
        .await
    );
    let meta = reply.metadata.unwrap();
    assert_eq!(meta.context_id.as_deref(), Some("ctx-9"));
    assert_eq!(meta.model_used.as_deref(), Some("echo"));
}

#[tokio::test]
async fn test_unknown_agent_chat_is_processing_failure() {
    let backend = backend().await;
    let sdk = sdk(&backend, Arc::new(AnonymousAuth));
    assert_ok!(sdk.initialize().await);

    let err = assert_err!(sdk.chat("nobody", "hi", None).await);
    match err {
        CanistError::Chat { session_id, source } => {
            assert_eq!(session_id, "default");
            assert!(matches!(*source, CanistError::Processing(_)));
            assert!(source.to_string().contains("Agent not found"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_concurrent_chats_share_one_facade() {
    let backend = backend().await;
    let sdk = Arc::new(sdk(&backend, Arc::new(AnonymousAuth)));
    assert_ok!(sdk.initialize().await);

    let mut handles = Vec::new();
    for i in 0..10 {
        let sdk = Arc::clone(&sdk);
        handles.push(tokio::spawn(async move {
            let session = format!("s-{}", i);
            sdk.chat("support", &format!("msg {}", i), Some(session.as_str()))
                .await
                .map(|m| m.content)
        }));
    }

    let mut replies = Vec::new();
    for handle in handles {
        replies.push(handle.await.unwrap().unwrap());
    }
    replies.sort();
    assert_eq!(replies.len(), 10);
    assert!(replies.contains(&"Echo: msg 7".to_string()));
    assert_eq!(backend.chat_calls(), 10);
}

#[tokio::test]
async fn test_rate_limit_is_not_retried() {
    let backend = backend().await;
    let sdk = sdk(&backend, Arc::new(AnonymousAuth));
    assert_ok!(sdk.initialize().await);
    backend
        .set_chat_failure(Some(InjectedFailure::Processing("Rate limit exceeded".into())))
        .await;

    let err = assert_err!(sdk.chat("support", "hi", None).await);
    assert!(!err.is_retryable());
    assert_eq!(backend.chat_calls(), 1);
}

#[tokio::test]
async fn test_transport_failure_is_retryable_by_caller() {
    let backend = backend().await;
    let sdk = sdk(&backend, Arc::new(AnonymousAuth));
    assert_ok!(sdk.initialize().await);
    backend
        .set_chat_failure(Some(InjectedFailure::Unavailable("timeout".into())))
        .await;

    let err = assert_err!(sdk.chat("support", "hi", None).await);
    assert!(err.is_retryable());
    assert_eq!(backend.chat_calls(), 1);

    // the caller owns the retry
    backend.set_chat_failure(None).await;
    assert_ok!(sdk.chat("support", "hi", None).await);
    assert_eq!(backend.chat_calls(), 2);
}

// ─── Agents ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_agent_status_update_refreshes_cache() {
    let backend = backend().await;
    let sdk = sdk(&backend, Arc::new(StaticAuth::new("alice")));
    assert_ok!(sdk.initialize().await);

    let agent = assert_ok!(sdk.get_agent("support").await);
    assert_eq!(agent.status, AgentStatus::Active);

    assert_ok!(sdk.update_agent_status("support", AgentStatus::Suspended).await);
    let agent = assert_ok!(sdk.get_agent("support").await);
    assert_eq!(agent.status, AgentStatus::Suspended);

    let err = assert_err!(sdk.update_agent_status("ghost", AgentStatus::Archived).await);
    assert!(matches!(err, CanistError::Agent { .. }));
}

// ─── Logging ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_logger_follows_configured_level() {
    let backend = backend().await;
    let mut config = SdkConfig::new("am-1");
    config.log_level = LogLevel::Warn;
    let sdk = CanistChat::new(config, Arc::new(backend.clone()), Arc::new(AnonymousAuth));

    assert_ok!(sdk.initialize().await);
    assert_ok!(sdk.chat("support", "quiet", None).await);
    assert!(sdk.logger().logs().is_empty());

    backend
        .set_chat_failure(Some(InjectedFailure::Unavailable("down".into())))
        .await;
    assert_err!(sdk.chat("support", "loud", None).await);

    let logs = sdk.logger().logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].level, LogLevel::Error);
    assert_eq!(logs[0].data.as_ref().unwrap()["agentId"], "support");
}

// ─── Entry Points ────────────────────────────────────────────────

#[tokio::test]
async fn test_http_entry_points_build_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("widget.toml");
    std::fs::write(
        &path,
        "agentId = \"support\"\nagentManagerCanisterId = \"am-1\"\nnetwork = \"ic\"\n",
    )
    .unwrap();

    let config = assert_ok!(WidgetConfig::load(&path));
    let widget = assert_ok!(create_chat_widget(config));
    assert!(!widget.is_initialized());
    assert_eq!(widget.sdk().config().host(), "https://icp0.io");

    let sdk = assert_ok!(init_canist_chat(SdkConfig::new("am-1"), Arc::new(AnonymousAuth)));
    assert_eq!(sdk.state().await, SdkState::Uninitialized);

    let invalid = WidgetConfig::new("", "am-1");
    assert!(matches!(create_chat_widget(invalid), Err(CanistError::Config(_))));
}
