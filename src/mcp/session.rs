//! Session state for the stateful bridge.
//!
//! `initialize` mints a session record and hands the token back out-of-band;
//! `notifications/initialized` completes the handshake. The store supports
//! optional TTL-based eviction so the map does not grow for the lifetime of
//! the process; with no TTL configured, sessions live until explicitly
//! terminated.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// A minted protocol session.
#[derive(Debug, Clone)]
pub struct Session {
    /// The out-of-band token identifying this session.
    pub session_id: String,
    /// When the session was minted.
    pub created_at: DateTime<Utc>,
    /// Whether the client has completed the handshake.
    pub initialized: bool,
    /// Client-supplied info from the `initialize` params, verbatim.
    pub client_info: Option<Value>,
}

/// In-memory session store keyed by token.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
    ttl: Option<Duration>,
}

impl SessionStore {
    /// Creates a store whose sessions never expire.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store evicting sessions older than `ttl_secs`.
    #[must_use]
    pub fn with_ttl_secs(ttl_secs: i64) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl: Some(Duration::seconds(ttl_secs)),
        }
    }

    /// Mints a new session and returns its token.
    pub fn create(&mut self, client_info: Option<Value>) -> String {
        self.evict_expired();
        let session_id = Uuid::new_v4().to_string();
        self.sessions.insert(
            session_id.clone(),
            Session {
                session_id: session_id.clone(),
                created_at: Utc::now(),
                initialized: false,
                client_info,
            },
        );
        session_id
    }

    /// Looks up a live session by token.
    pub fn get(&mut self, token: &str) -> Option<&Session> {
        self.evict_expired();
        self.sessions.get(token)
    }

    /// Flips a session to initialized. Returns false for unknown tokens.
    pub fn mark_initialized(&mut self, token: &str) -> bool {
        self.evict_expired();
        match self.sessions.get_mut(token) {
            Some(session) => {
                session.initialized = true;
                true
            },
            None => false,
        }
    }

    /// Terminates a session, freeing its slot.
    pub fn remove(&mut self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops sessions older than the configured TTL.
    fn evict_expired(&mut self) {
        if let Some(ttl) = self.ttl {
            let cutoff = Utc::now() - ttl;
            self.sessions
                .retain(|_, session| session.created_at > cutoff);
        }
    }
}
