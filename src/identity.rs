//! Caller identity and pluggable login flows

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CanistError, Result};

/// Principal text used for unauthenticated callers
pub const ANONYMOUS_PRINCIPAL: &str = "2vxsx-fae";

/// The caller's credential
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated {
        principal: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at: Option<DateTime<Utc>>,
    },
}

impl Identity {
    pub fn authenticated(principal: impl Into<String>) -> Self {
        Identity::Authenticated {
            principal: principal.into(),
            expires_at: None,
        }
    }

    pub fn principal(&self) -> &str {
        match self {
            Identity::Anonymous => ANONYMOUS_PRINCIPAL,
            Identity::Authenticated { principal, .. } => principal,
        }
    }

    /// Authenticated and not past its expiry
    pub fn is_authenticated(&self) -> bool {
        match self {
            Identity::Anonymous => false,
            Identity::Authenticated { expires_at, .. } => {
                expires_at.map_or(true, |exp| exp > Utc::now())
            }
        }
    }
}

/// External login flow (identity provider popup, device flow, etc.)
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Run the login flow and return the new identity.
    /// Cancellation by the user is reported as an error.
    async fn login(&self) -> Result<Identity>;

    /// Tear down any provider-side session
    async fn logout(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Provider that never authenticates; used when the host has no login flow
#[derive(Debug, Default, Clone)]
pub struct AnonymousAuth;

#[async_trait]
impl AuthProvider for AnonymousAuth {
    async fn login(&self) -> Result<Identity> {
        Err(CanistError::Auth("No identity provider configured".into()))
    }

    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Provider that always yields a fixed identity (tests, trusted hosts)
#[derive(Debug, Clone)]
pub struct StaticAuth {
    identity: Identity,
}

impl StaticAuth {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            identity: Identity::authenticated(principal),
        }
    }

    pub fn with_identity(identity: Identity) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn login(&self) -> Result<Identity> {
        if !self.identity.is_authenticated() {
            return Err(CanistError::Auth("Login cancelled".into()));
        }
        Ok(self.identity.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
