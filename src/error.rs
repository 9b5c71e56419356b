//! Error types for canist-chat

use thiserror::Error;

/// Errors that can occur in the SDK and widget
#[derive(Debug, Error)]
pub enum CanistError {
    /// SDK used before `initialize()` completed, or after `destroy()`
    #[error("SDK not initialized. Call initialize() first.")]
    NotInitialized,

    /// Transport or bootstrap failure during initialization
    #[error("Initialization failed: {reason}")]
    Init {
        reason: String,
        #[source]
        source: Option<Box<CanistError>>,
    },

    /// Login/logout flow failure
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Agent fetch/list/create failure
    #[error("Agent operation failed for '{agent_id}': {source}")]
    Agent {
        agent_id: String,
        #[source]
        source: Box<CanistError>,
    },

    /// Chat call failure
    #[error("Chat failed in session '{session_id}': {source}")]
    Chat {
        session_id: String,
        #[source]
        source: Box<CanistError>,
    },

    /// DOM or container resolution failure
    #[error("Widget error for '{id}': {reason}")]
    Widget {
        id: String,
        reason: String,
    },

    /// The remote call could not be completed (network, timeout, 5xx)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The remote call completed but reported an application-level failure
    #[error("Processing error: {0}")]
    Processing(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected by client-side checks or by the remote service
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML config parse failure
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl CanistError {
    /// Bootstrap failure with no underlying remote error
    pub fn init(reason: impl Into<String>) -> Self {
        CanistError::Init {
            reason: reason.into(),
            source: None,
        }
    }

    /// The wrapped cause of an `Init`, `Agent`, or `Chat` error
    pub fn wrapped(&self) -> Option<&CanistError> {
        match self {
            CanistError::Init { source, .. } => source.as_deref(),
            CanistError::Agent { source, .. } | CanistError::Chat { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// Whether a caller-side retry could succeed
    ///
    /// Nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        match self {
            CanistError::ServiceUnavailable(_) => true,
            other => other.wrapped().is_some_and(CanistError::is_retryable),
        }
    }

    /// Whether this error (or the cause it wraps) means "no such record"
    pub fn is_not_found(&self) -> bool {
        match self {
            CanistError::NotFound(_) => true,
            other => other.wrapped().is_some_and(CanistError::is_not_found),
        }
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, CanistError>;
