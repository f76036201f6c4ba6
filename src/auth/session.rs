use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::UserIdentity;

pub const SESSION_COOKIE: &str = "session_token";

#[derive(Debug, Clone)]
struct Session {
    user: UserIdentity,
    expires_at: DateTime<Utc>,
}

/// Opaque session tokens mapped to identities. Lost on restart.
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self, user: UserIdentity) -> String {
        self.create_at(user, Utc::now()).await
    }

    async fn create_at(&self, user: UserIdentity, now: DateTime<Utc>) -> String {
        let token = Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        debug!("Opening session for {}", user.email);
        sessions.insert(
            token.clone(),
            Session {
                user,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    pub async fn lookup(&self, token: &str) -> Option<UserIdentity> {
        self.lookup_at(token, Utc::now()).await
    }

    async fn lookup_at(&self, token: &str, now: DateTime<Utc>) -> Option<UserIdentity> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|s| s.expires_at > now)
            .map(|s| s.user.clone())
    }

    pub async fn remove(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.ttl.num_seconds()
        )
    }
}

pub fn expired_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Pulls the session token out of a `Cookie` header value.
pub fn token_from_cookies(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
