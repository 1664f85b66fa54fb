//! Upstream session identity, owned by the caller and passed to the router.

use std::collections::HashMap;
use std::fmt::Write;

use sha2::{Digest, Sha256};
use tracing::info;

use crate::events;
use crate::settings::ModelTier;

/// Hex SHA-256 of a context prompt.
pub fn context_hash(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// A session bound to one fixed system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSession {
    pub tier: ModelTier,
    pub assistant_handle: String,
    pub thread_handle: String,
    pub context_hash: String,
    pub system_prompt: String,
}

/// One live session per model tier.
#[derive(Debug, Default)]
pub struct SessionCache {
    sessions: HashMap<ModelTier, ModelSession>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached session for `tier` if it was built for `hash`. A session
    /// built for a different prompt is discarded.
    pub fn current(&mut self, tier: ModelTier, hash: &str) -> Option<&ModelSession> {
        let stale = self
            .sessions
            .get(&tier)
            .is_some_and(|s| s.context_hash != hash);
        if stale {
            self.invalidate(tier, "context changed");
        }
        self.sessions.get(&tier)
    }

    pub fn insert(&mut self, session: ModelSession) {
        info!(
            event = events::SESSION_CREATED,
            tier = ?session.tier,
            thread = %session.thread_handle,
            "Model session created"
        );
        self.sessions.insert(session.tier, session);
    }

    pub fn invalidate(&mut self, tier: ModelTier, reason: &str) {
        if let Some(old) = self.sessions.remove(&tier) {
            info!(
                event = events::SESSION_INVALIDATED,
                tier = ?tier,
                thread = %old.thread_handle,
                reason,
                "Model session discarded"
            );
        }
    }

    pub fn get(&self, tier: ModelTier) -> Option<&ModelSession> {
        self.sessions.get(&tier)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
