//! In-process session table used as an `IdentityResolver` when no remote
//! authority is configured. The table only validates; rows are seeded from a
//! JSON file or inserted by the embedding process, never minted here.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::principal::Principal;
use super::provider::{IdentityResolver, ResolveError};

pub type SessionToken = String;

fn default_true() -> bool { true }

/// One session row: the credential (`session_id`) and the account it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    pub session_id: SessionToken,
    pub user_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// `None` means the session does not expire.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub user_active: bool,
}

#[derive(Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<SessionToken, SessionRecord>>,
}

impl SessionTable {
    pub fn new() -> Self { Self::default() }

    /// Load session rows from a JSON array file.
    pub fn load_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("reading sessions file {}", path.display()))?;
        let rows: Vec<SessionRecord> = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing sessions file {}", path.display()))?;
        let table = Self::new();
        for r in rows { table.insert(r); }
        debug!(target: "contextvault::auth", sessions = table.len(), path = %path.display(), "session table loaded");
        Ok(table)
    }

    pub fn insert(&self, record: SessionRecord) {
        self.sessions.write().insert(record.session_id.clone(), record);
    }

    pub fn len(&self) -> usize { self.sessions.read().len() }
    pub fn is_empty(&self) -> bool { self.sessions.read().is_empty() }

    /// Checks, in order: session exists, session active, account active, not expired.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, ResolveError> {
        let map = self.sessions.read();
        let Some(rec) = map.get(token) else {
            warn!(target: "contextvault::auth", "session not found");
            return Err(ResolveError::Invalid);
        };
        if !rec.is_active {
            warn!(target: "contextvault::auth", user = %rec.user_id, "session is not active");
            return Err(ResolveError::Inactive);
        }
        if !rec.user_active {
            warn!(target: "contextvault::auth", user = %rec.user_id, "account is not active");
            return Err(ResolveError::Inactive);
        }
        if let Some(exp) = rec.expires_at {
            if exp <= now {
                warn!(target: "contextvault::auth", user = %rec.user_id, expired_at = %exp, "session has expired");
                return Err(ResolveError::Expired);
            }
        }
        Ok(Principal { identity: rec.user_id.clone(), display_name: rec.display_name.clone(), email: rec.email.clone() })
    }
}

#[async_trait]
impl IdentityResolver for SessionTable {
    async fn resolve(&self, credential: &str) -> Result<Principal, ResolveError> {
        self.validate(credential, Utc::now())
    }

    fn describe(&self) -> String { format!("in-process session table ({} sessions)", self.len()) }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
