//! Admin sessions and the password gate.
//!
//! A session is a random UUID v4 kept in memory with an expiry. The cookie
//! carries `<uuid>.<mac>`, where the MAC is a BLAKE3 keyed hash of the
//! UUID under a key derived from the configured session secret. A cookie
//! whose MAC does not verify is ignored before the store is consulted.
//!
//! Expiry uses [`tokio::time::Instant`], so tests can drive it with a
//! paused clock.

use std::collections::HashMap;
use std::time::Duration;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use scoreboard_core::config::AdminConfig;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "scoreboard_sid";

/// Context string for deriving the cookie signing key.
const SIGNING_CONTEXT: &str = "safety-scoreboard 2024 session cookie signing key";

// ---------------------------------------------------------------------------
// SessionStore
// ---------------------------------------------------------------------------

/// In-memory store of live admin sessions.
pub struct SessionStore {
    key: [u8; 32],
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Instant>>,
}

impl SessionStore {
    /// Create an empty store signing with `secret`.
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: blake3::derive_key(SIGNING_CONTEXT, secret.as_bytes()),
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Session lifetime.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Open a session and return its signed cookie value.
    ///
    /// Expired sessions are pruned first.
    pub async fn create(&self) -> String {
        let id = Uuid::new_v4();
        let now = Instant::now();
        let expires = now.checked_add(self.ttl).unwrap_or(now);

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, expiry| *expiry > now);
        let pruned = before.saturating_sub(sessions.len());
        if pruned > 0 {
            debug!(pruned, "Expired sessions removed");
        }
        sessions.insert(id, expires);

        self.sign(id)
    }

    /// Whether `cookie` names a live session.
    ///
    /// An expired session found here is removed.
    pub async fn is_valid(&self, cookie: &str) -> bool {
        let Some(id) = self.verify(cookie) else {
            return false;
        };
        let now = Instant::now();
        let live = {
            let sessions = self.sessions.read().await;
            match sessions.get(&id) {
                Some(expiry) => *expiry > now,
                None => return false,
            }
        };
        if !live {
            self.sessions.write().await.remove(&id);
        }
        live
    }

    /// Drop the session named by `cookie`, if any.
    pub async fn destroy(&self, cookie: &str) {
        if let Some(id) = self.verify(cookie) {
            self.sessions.write().await.remove(&id);
        }
    }

    /// Number of sessions held, live or not yet pruned.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn sign(&self, id: Uuid) -> String {
        let mac = blake3::keyed_hash(&self.key, id.as_bytes());
        format!("{id}.{}", mac.to_hex())
    }

    /// Check the MAC and return the session id it covers.
    fn verify(&self, cookie: &str) -> Option<Uuid> {
        let (id, mac) = cookie.split_once('.')?;
        let id = Uuid::parse_str(id).ok()?;
        let mac = blake3::Hash::from_hex(mac).ok()?;
        // blake3::Hash equality is constant-time.
        (blake3::keyed_hash(&self.key, id.as_bytes()) == mac).then_some(id)
    }
}

impl core::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SessionStore")
            .field("key", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// AdminGate
// ---------------------------------------------------------------------------

/// Password check plus the session store.
pub struct AdminGate {
    password: Option<blake3::Hash>,
    sessions: SessionStore,
}

impl AdminGate {
    /// Build the gate from the admin configuration.
    ///
    /// Without a configured password every login fails.
    pub fn new(config: &AdminConfig) -> Self {
        Self {
            password: config
                .password
                .as_deref()
                .map(|password| blake3::hash(password.as_bytes())),
            sessions: SessionStore::new(&config.session_secret, config.session_ttl()),
        }
    }

    /// The underlying session store.
    pub const fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Compare `candidate` with the admin password.
    pub fn password_matches(&self, candidate: &str) -> bool {
        self.password
            .is_some_and(|expected| blake3::hash(candidate.as_bytes()) == expected)
    }

    /// Open a session if `candidate` is the admin password. Returns the
    /// signed cookie value.
    pub async fn login(&self, candidate: &str) -> Option<String> {
        if !self.password_matches(candidate) {
            return None;
        }
        let cookie = self.sessions.create().await;
        info!("Admin session opened");
        Some(cookie)
    }

    /// Close the session named by `cookie`, if any.
    pub async fn logout(&self, cookie: Option<&str>) {
        if let Some(cookie) = cookie {
            self.sessions.destroy(cookie).await;
            info!("Admin session closed");
        }
    }

    /// Whether `cookie` belongs to a live admin session.
    pub async fn is_admin(&self, cookie: Option<&str>) -> bool {
        match cookie {
            Some(cookie) => self.sessions.is_valid(cookie).await,
            None => false,
        }
    }

    /// `Set-Cookie` value installing `cookie`.
    pub fn set_cookie(&self, cookie: &str) -> String {
        format!(
            "{SESSION_COOKIE}={cookie}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.sessions.ttl().as_secs()
        )
    }

    /// `Set-Cookie` value clearing the session cookie.
    pub fn clear_cookie() -> String {
        format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
    }
}

impl core::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminGate")
            .field("password_set", &self.password.is_some())
            .field("sessions", &self.sessions)
            .finish()
    }
}

/// Extract the session cookie value from request headers.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn admin(password: Option<&str>) -> AdminConfig {
        AdminConfig {
            password: password.map(String::from),
            session_secret: String::from("test-secret"),
            session_ttl_secs: 60,
        }
    }

    #[tokio::test]
    async fn correct_password_opens_a_session() {
        let gate = AdminGate::new(&admin(Some("hunter2")));
        let cookie = gate.login("hunter2").await.unwrap();
        assert!(gate.is_admin(Some(&cookie)).await);
    }

    #[tokio::test]
    async fn wrong_password_is_refused() {
        let gate = AdminGate::new(&admin(Some("hunter2")));
        assert!(gate.login("hunter3").await.is_none());
        assert!(gate.login("").await.is_none());
        assert!(gate.sessions().is_empty().await);
    }

    #[tokio::test]
    async fn no_configured_password_refuses_everything() {
        let gate = AdminGate::new(&admin(None));
        assert!(gate.login("").await.is_none());
        assert!(gate.login("anything").await.is_none());
    }

    #[tokio::test]
    async fn tampered_cookie_is_not_admin() {
        let gate = AdminGate::new(&admin(Some("pw")));
        let cookie = gate.login("pw").await.unwrap();
        let (id, _) = cookie.split_once('.').unwrap();

        let forged = format!("{id}.{}", blake3::hash(b"forged").to_hex());
        assert!(!gate.is_admin(Some(&forged)).await);
        assert!(!gate.is_admin(Some(id)).await);
        assert!(!gate.is_admin(None).await);
    }

    #[tokio::test]
    async fn cookie_from_another_secret_is_not_admin() {
        let gate = AdminGate::new(&admin(Some("pw")));
        let mut other_config = admin(Some("pw"));
        other_config.session_secret = String::from("other");
        let other = AdminGate::new(&other_config);

        let cookie = other.login("pw").await.unwrap();
        assert!(!gate.is_admin(Some(&cookie)).await);
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let gate = AdminGate::new(&admin(Some("pw")));
        let cookie = gate.login("pw").await.unwrap();
        gate.logout(Some(&cookie)).await;
        assert!(!gate.is_admin(Some(&cookie)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_expire_after_ttl() {
        let gate = AdminGate::new(&admin(Some("pw")));
        let cookie = gate.login("pw").await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(gate.is_admin(Some(&cookie)).await);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!gate.is_admin(Some(&cookie)).await);
        assert!(gate.sessions().is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn login_prunes_expired_sessions() {
        let gate = AdminGate::new(&admin(Some("pw")));
        gate.login("pw").await.unwrap();
        gate.login("pw").await.unwrap();
        tokio::time::advance(Duration::from_secs(120)).await;

        gate.login("pw").await.unwrap();

        assert_eq!(gate.sessions().len().await, 1);
    }

    #[test]
    fn cookie_header_attributes() {
        let gate = AdminGate::new(&admin(Some("pw")));
        let header = gate.set_cookie("abc.def");
        assert!(header.starts_with("scoreboard_sid=abc.def;"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=60"));
        assert!(AdminGate::clear_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; scoreboard_sid=abc.123; lang=en"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc.123"));

        let mut empty = HeaderMap::new();
        empty.insert(COOKIE, HeaderValue::from_static("scoreboard_sid="));
        assert_eq!(session_cookie(&empty), None);
        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }
}
