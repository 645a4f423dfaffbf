//! Opaque session tokens handed out after a completed OAuth login.

use std::time::Instant;

use dashmap::DashMap;
use rand::{Rng, distr::Alphanumeric, rng};
use uuid::Uuid;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "starboard_session";
/// Length of generated session and OAuth state tokens.
const TOKEN_LENGTH: usize = 48;

/// Data attached to one logged-in browser session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Discord user identifier of the logged-in member.
    pub user_id: String,
    /// Public profile handle of the mapped stats record.
    pub uuid: Uuid,
    /// When the session was created.
    pub created_at: Instant,
}

/// In-process registry of active sessions, keyed by opaque token.
///
/// Sessions survive until logout or process restart; there is no persistence.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Session>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its token.
    pub fn create(&self, user_id: String, uuid: Uuid) -> String {
        let token = random_token();
        self.sessions.insert(
            token.clone(),
            Session {
                user_id,
                uuid,
                created_at: Instant::now(),
            },
        );
        token
    }

    /// Look up a session by token.
    pub fn get(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).map(|entry| entry.clone())
    }

    /// Drop a session, if it exists.
    pub fn remove(&self, token: &str) {
        self.sessions.remove(token);
    }
}

/// Generate an alphanumeric token suitable for sessions and OAuth states.
pub fn random_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_get_remove_roundtrip() {
        let registry = SessionRegistry::new();
        let uuid = Uuid::new_v4();
        let token = registry.create("user-1".into(), uuid);

        let session = registry.get(&token).unwrap();
        assert_eq!(session.user_id, "user-1");
        assert_eq!(session.uuid, uuid);

        registry.remove(&token);
        assert!(registry.get(&token).is_none());
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(random_token(), random_token());
    }
}
