//!
//! contextvault context store
//! --------------------------
//! In-memory map from verified identity to its `ActiveContext`, plus a bounded
//! audit log of every mutation and an idle-based eviction sweep.
//!
//! Every operation runs inside one critical section covering both the map and
//! the log, so a mutation and its audit event are always appended together and
//! no two mutations interleave, even across identities. Timestamps are read
//! from the clock inside that section, so they follow commit order. Nothing
//! here performs I/O while the lock is held. State lives only in process memory; a restart is
//! equivalent to every identity being cleared.
//!
//! The store is identifier-agnostic: any non-empty `resource_ref` is accepted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use parking_lot::Mutex;
use tracing::{debug, info};

pub mod clock;
pub mod history;
pub mod model;

pub use clock::{Clock, ManualClock, SystemClock};
pub use history::{EventLog, Scope, UnknownScope};
pub use model::{ActiveContext, ContextEvent, EventKind};

/// Actor recorded on CLEAR events produced by idle eviction.
pub const SWEEP_ACTOR: &str = "system:idle-sweep";
/// Actor recorded when the caller does not name one.
pub const DEFAULT_ACTOR: &str = "unknown";
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("resource_ref must be a non-empty string")]
    EmptyResourceRef,
    #[error("scope 'self' requires an identity")]
    ScopeRequiresIdentity,
}

#[derive(Debug)]
struct VaultState {
    contexts: HashMap<String, ActiveContext>,
    history: EventLog,
}

/// Process-wide context store. Cloning shares the same underlying state.
#[derive(Clone, Debug)]
pub struct ContextVault {
    state: Arc<Mutex<VaultState>>,
    clock: Arc<dyn Clock>,
}

impl Default for ContextVault {
    fn default() -> Self { Self::new(DEFAULT_HISTORY_CAPACITY) }
}

impl ContextVault {
    pub fn new(history_capacity: usize) -> Self {
        Self::with_clock(history_capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(history_capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let state = VaultState { contexts: HashMap::new(), history: EventLog::new(history_capacity) };
        Self { state: Arc::new(Mutex::new(state)), clock }
    }

    pub fn history_capacity(&self) -> usize { self.state.lock().history.capacity() }

    /// Current context for `identity`, refreshing `last_touched_at` on a hit.
    pub fn read(&self, identity: &str) -> Option<ActiveContext> {
        let mut g = self.state.lock();
        let now = self.clock.now();
        let ctx = g.contexts.get_mut(identity)?;
        ctx.last_touched_at = now;
        Some(ctx.clone())
    }

    /// Replace the context for `identity` and append a SET event.
    /// Identical re-sets are not deduplicated.
    pub fn write(
        &self,
        identity: &str,
        resource_ref: &str,
        actor: &str,
        display_meta: Option<String>,
    ) -> Result<ActiveContext, VaultError> {
        if resource_ref.trim().is_empty() {
            return Err(VaultError::EmptyResourceRef);
        }
        let actor = if actor.trim().is_empty() { DEFAULT_ACTOR } else { actor };
        let mut g = self.state.lock();
        let now = self.clock.now();
        let ctx = ActiveContext {
            identity: identity.to_string(),
            resource_ref: resource_ref.to_string(),
            actor: actor.to_string(),
            set_at: now,
            last_touched_at: now,
            display_meta,
        };
        g.contexts.insert(identity.to_string(), ctx.clone());
        let dropped = g.history.push(ContextEvent::set(&ctx));
        drop(g);
        debug!(target: "contextvault::vault", identity = identity, actor = actor, history_trimmed = dropped.is_some(), "context set");
        Ok(ctx)
    }

    /// Remove the context for `identity`. Returns false, appending nothing, when none existed.
    pub fn erase(&self, identity: &str, actor: Option<&str>) -> bool {
        let actor = actor.filter(|a| !a.trim().is_empty()).unwrap_or(DEFAULT_ACTOR);
        let mut g = self.state.lock();
        let Some(prev) = g.contexts.remove(identity) else { return false; };
        let now = self.clock.now();
        g.history.push(ContextEvent::clear(identity, actor, now, prev.display_meta));
        drop(g);
        debug!(target: "contextvault::vault", identity = identity, actor = actor, "context cleared");
        true
    }

    /// Unscoped snapshot of every active context, ordered by identity.
    pub fn list_all(&self) -> Vec<ActiveContext> {
        let g = self.state.lock();
        let mut out: Vec<ActiveContext> = g.contexts.values().cloned().collect();
        drop(g);
        out.sort_by(|a, b| a.identity.cmp(&b.identity));
        out
    }

    pub fn count(&self) -> usize { self.state.lock().contexts.len() }

    pub fn query_events(&self, identity: Option<&str>, scope: Scope) -> Result<Vec<ContextEvent>, VaultError> {
        self.state.lock().history.query(identity, scope)
    }

    /// Evict every context whose `last_touched_at` is older than `now - max_idle`.
    /// Each eviction appends one CLEAR event attributed to `SWEEP_ACTOR`.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let delta = TimeDelta::from_std(max_idle).unwrap_or(TimeDelta::MAX);
        let mut g = self.state.lock();
        let now = self.clock.now();
        // A window reaching before the representable range cannot have stale entries.
        let Some(cutoff) = now.checked_sub_signed(delta) else { return 0; };
        let mut stale: Vec<String> = g
            .contexts
            .iter()
            .filter(|(_, c)| c.last_touched_at < cutoff)
            .map(|(k, _)| k.clone())
            .collect();
        stale.sort();
        let mut removed = 0usize;
        for id in stale {
            if let Some(prev) = g.contexts.remove(&id) {
                g.history.push(ContextEvent::clear(&id, SWEEP_ACTOR, now, prev.display_meta));
                removed += 1;
            }
        }
        drop(g);
        if removed > 0 {
            info!(target: "contextvault::vault", removed = removed, max_idle_secs = max_idle.as_secs(), "idle contexts evicted");
        }
        removed
    }
}
