//! Session tickets for signed-in users.
//!
//! A session is created only after the allow-list authorizer approves a
//! sign-in. The ticket is stored in the user's encrypted session cookie, so
//! it must stay small.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

use crate::error::AuthenticationError;

const SESSION_ID_PREFIX: &str = "sess";

/// Unique identifier for a session, `sess_<ulid>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Ulid);

impl SessionId {
    /// Creates a new session ID with a randomly generated ULID.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Returns the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SESSION_ID_PREFIX}_{}", self.0)
    }
}

/// An established session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier for this session.
    id: SessionId,
    /// Subject claim of the signed-in identity.
    subject: String,
    /// The UPN or email the sign-in was authorized with.
    identity: String,
    /// Display name from the ID token, if any.
    display_name: Option<String>,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// When the session expires.
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new session valid for `duration`.
    #[must_use]
    pub fn new(subject: String, identity: String, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::new(),
            subject,
            identity,
            display_name: None,
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name;
        self
    }

    /// Returns the session ID.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns the UPN or email the session was authorized with.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Serializes the session for cookie storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be serialized.
    pub fn to_ticket(&self) -> crate::Result<String, AuthenticationError> {
        serde_json::to_string(self).map_err(|e| {
            AuthenticationError::InvalidSession {
                session_id: format!("{}: {e}", self.id),
            }
            .into()
        })
    }

    /// Parses a session from cookie storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the ticket is malformed.
    pub fn from_ticket(ticket: &str) -> crate::Result<Self, AuthenticationError> {
        serde_json::from_str(ticket).map_err(|_| {
            AuthenticationError::InvalidSession {
                session_id: "<undecodable>".to_string(),
            }
            .into()
        })
    }
}
