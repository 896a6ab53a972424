//! Session management for gateway connections.
//!
//! The gateway issues an opaque session object on session creation and may
//! rotate it on any later exchange. The client never looks inside it: the
//! exact JSON text the server sent is stored and spliced back into the next
//! execute request.

use serde_json::value::RawValue;
use std::fmt;

/// Opaque, server-issued session token.
#[derive(Clone)]
pub struct Session {
    raw: Box<RawValue>,
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.raw.get() == other.raw.get()
    }
}

impl Eq for Session {}

impl Session {
    /// Wrap a raw `session` member taken from a response.
    ///
    /// Returns `None` unless the value is a JSON object.
    pub fn from_raw(raw: Box<RawValue>) -> Option<Self> {
        if raw.get().trim_start().starts_with('{') {
            Some(Self { raw })
        } else {
            None
        }
    }

    /// Verbatim JSON bytes of the session object.
    pub fn as_bytes(&self) -> &[u8] {
        self.raw.get().as_bytes()
    }

    /// The session as a raw JSON value, for embedding into a request.
    pub fn as_raw(&self) -> &RawValue {
        &self.raw
    }

    /// Size of the serialized session in bytes.
    pub fn len(&self) -> usize {
        self.raw.get().len()
    }

    /// Whether the serialized session is empty.
    pub fn is_empty(&self) -> bool {
        self.raw.get().is_empty()
    }
}

// Session contents are credentials-equivalent; never print them
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

/// Session state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session has been issued yet, or it was cleared
    #[default]
    AwaitingSession,

    /// A session is held and will be replayed on the next execute
    Active(Session),
}

impl SessionState {
    /// Check if a session is held.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active(_))
    }
}

/// Owner of the connection's session token.
#[derive(Debug, Default)]
pub struct SessionManager {
    state: SessionState,
    /// Number of times a session was stored
    generation: u64,
}

impl SessionManager {
    /// Create a manager holding no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Get the current session, if any.
    pub fn current(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Active(session) => Some(session),
            SessionState::AwaitingSession => None,
        }
    }

    /// Check if a session is held.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Replace the stored session. Last writer wins; nothing is merged.
    pub fn replace(&mut self, session: Session) {
        let rotated = self.state.is_active();
        self.state = SessionState::Active(session);
        self.generation += 1;
        tracing::debug!(
            rotated,
            generation = self.generation,
            "stored gateway session"
        );
    }

    /// Drop the stored session so the next query creates a new one.
    pub fn clear(&mut self) {
        if self.state.is_active() {
            tracing::debug!("cleared gateway session");
        }
        self.state = SessionState::AwaitingSession;
    }

    /// Number of sessions stored over the manager's lifetime.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
