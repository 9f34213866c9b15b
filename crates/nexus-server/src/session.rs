use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use dashmap::DashMap;
use rand::RngCore;

use nexus_core::ids::UserId;

const TOKEN_BYTES: usize = 32;

/// Opaque bearer token handed out at login.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

struct Session {
    user_id: UserId,
    expires_at: Instant,
}

/// Server-side session store: token to user id, with a fixed lifetime.
///
/// Only the user id is kept; the principal is re-read from the directory on
/// every request so role changes and deletions take effect immediately.
pub struct SessionRegistry {
    sessions: DashMap<SessionToken, Session>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: UserId) -> SessionToken {
        let token = SessionToken::generate();
        self.sessions.insert(
            token.clone(),
            Session {
                user_id,
                expires_at: Instant::now() + self.ttl,
            },
        );
        token
    }

    /// The user behind a live token. Expired tokens are dropped on sight.
    pub fn resolve(&self, token: &SessionToken) -> Option<UserId> {
        let now = Instant::now();
        let user_id = {
            let session = self.sessions.get(token)?;
            (session.expires_at > now).then_some(session.user_id)
        };
        if user_id.is_none() {
            self.sessions.remove(token);
        }
        user_id
    }

    pub fn revoke(&self, token: &SessionToken) -> bool {
        self.sessions.remove(token).is_some()
    }

    /// Drop every session belonging to `user_id`. Returns how many.
    pub fn revoke_user(&self, user_id: UserId) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.user_id != user_id);
        before.saturating_sub(self.sessions.len())
    }

    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Periodically drop expired sessions.
pub fn start_cleanup_task(
    registry: Arc<SessionRegistry>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let removed = registry.purge_expired();
            if removed > 0 {
                tracing::info!(removed = removed, "expired session cleanup");
            }
        }
    })
}
