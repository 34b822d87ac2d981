//! Opaque bearer tokens mapped to user ids.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use rand::{rngs::OsRng, RngCore};
use tracing::debug;
use uuid::Uuid;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a new token for `user_id`.
    async fn issue(&self, user_id: Uuid) -> String;
    /// Returns the owner of a live token.
    async fn resolve(&self, token: &str) -> Option<Uuid>;
    /// Forgets `token`. Unknown tokens are ignored.
    async fn revoke(&self, token: &str);
}

#[derive(Debug, Clone, Copy)]
struct Session {
    user_id: Uuid,
    issued_at: Instant,
}

/// Issues between two sweeps of expired tokens.
const DEFAULT_SWEEP_EVERY: u64 = 64;

/// Process-local store. Tokens vanish on restart.
#[derive(Debug)]
pub struct InMemorySessions {
    tokens: DashMap<String, Session>,
    ttl: Option<Duration>,
    issued: AtomicU64,
    sweep_every: u64,
}

impl InMemorySessions {
    /// `ttl_minutes <= 0` keeps tokens until they are revoked.
    pub fn new(ttl_minutes: i64) -> Self {
        let ttl = (ttl_minutes > 0)
            .then(|| Duration::from_secs((ttl_minutes as u64).saturating_mul(60)));
        Self::with_ttl(ttl)
    }

    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
            issued: AtomicU64::new(0),
            sweep_every: DEFAULT_SWEEP_EVERY,
        }
    }

    /// Sweep expired tokens on every `n`th issue instead of the default.
    pub fn with_sweep_interval(mut self, n: u64) -> Self {
        self.sweep_every = n.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn expired(&self, session: &Session, now: Instant) -> bool {
        self.ttl.is_some_and(|ttl| {
            now.checked_duration_since(session.issued_at)
                .is_some_and(|age| age >= ttl)
        })
    }

    fn purge_expired(&self) {
        if self.ttl.is_none() {
            return;
        }
        let now = Instant::now();
        let before = self.tokens.len();
        self.tokens.retain(|_, s| !self.expired(s, now));
        debug!(swept = before.saturating_sub(self.tokens.len()), "expired sessions swept");
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[async_trait]
impl SessionStore for InMemorySessions {
    async fn issue(&self, user_id: Uuid) -> String {
        let issued = self.issued.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if issued % self.sweep_every == 0 {
            self.purge_expired();
        }
        let session = Session {
            user_id,
            issued_at: Instant::now(),
        };
        loop {
            let token = generate_token();
            // A collision is astronomically unlikely; never overwrite one anyway.
            if let dashmap::mapref::entry::Entry::Vacant(slot) = self.tokens.entry(token.clone()) {
                slot.insert(session);
                debug!(user_id = %user_id, "session issued");
                return token;
            }
        }
    }

    async fn resolve(&self, token: &str) -> Option<Uuid> {
        let session = *self.tokens.get(token)?;
        if self.expired(&session, Instant::now()) {
            self.tokens.remove(token);
            debug!(user_id = %session.user_id, "session expired");
            return None;
        }
        Some(session.user_id)
    }

    async fn revoke(&self, token: &str) {
        if let Some((_, session)) = self.tokens.remove(token) {
            debug!(user_id = %session.user_id, "session revoked");
        }
    }
}
