//! Bearer-token auth context.
//!
//! [`AuthContext`] is the single source of truth for the current session
//! token. It is a cheap cloneable handle; every clone sees the same cell,
//! so the API client and the command layer agree on whether a user is
//! signed in without reading storage behind each other's backs.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How long a session token should outlive the current process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
    /// Written to the session file and reused by later invocations.
    Remembered,
    /// Dropped when the machine restarts.
    SessionOnly,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub persistence: Persistence,
}

/// Shared handle to the current session, if any.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    inner: Arc<RwLock<Option<Session>>>,
}

impl AuthContext {
    /// An empty (signed-out) context.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context already holding `session`.
    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(session))),
        }
    }

    /// Replace the current session. Blank tokens clear it instead.
    pub fn set(&self, token: impl Into<String>, persistence: Persistence) {
        let token = token.into();
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = if token.trim().is_empty() {
            None
        } else {
            Some(Session { token, persistence })
        };
    }

    /// Drop the current session. Returns `true` if one was present.
    pub fn clear(&self) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        guard.take().is_some()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn token(&self) -> Option<String> {
        self.session().map(|s| s.token)
    }

    pub fn persistence(&self) -> Option<Persistence> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|s| s.persistence)
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// `Authorization` header value for the current session.
    pub fn bearer(&self) -> Option<String> {
        self.token().map(|t| format!("Bearer {t}"))
    }

    /// The current token, or [`CoreError::Unauthorized`] when signed out.
    pub fn require_token(&self) -> Result<String, CoreError> {
        self.token()
            .ok_or_else(|| CoreError::Unauthorized("not signed in".to_string()))
    }
}
