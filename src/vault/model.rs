use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single "resource of interest" pointer currently held for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveContext {
    /// Verified identity owning this slot.
    pub identity: String,
    /// Opaque, non-empty reference to the selected resource (e.g. a patient ICN).
    pub resource_ref: String,
    /// Free-text label of the application that set the context.
    pub actor: String,
    /// When the context was last set.
    pub set_at: DateTime<Utc>,
    /// Refreshed on every successful read; drives idle eviction.
    pub last_touched_at: DateTime<Utc>,
    #[serde(default)]
    pub display_meta: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Set,
    Clear,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Set => "set",
            EventKind::Clear => "clear",
        }
    }
}

/// Audit record of one context mutation. `resource_ref` is present for SET and absent for CLEAR;
/// the constructors below are the only way the vault builds events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEvent {
    pub kind: EventKind,
    pub identity: String,
    pub resource_ref: Option<String>,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub display_meta: Option<String>,
}

impl ContextEvent {
    pub fn set(ctx: &ActiveContext) -> Self {
        Self {
            kind: EventKind::Set,
            identity: ctx.identity.clone(),
            resource_ref: Some(ctx.resource_ref.clone()),
            actor: ctx.actor.clone(),
            timestamp: ctx.set_at,
            display_meta: ctx.display_meta.clone(),
        }
    }

    pub fn clear(identity: &str, actor: &str, at: DateTime<Utc>, display_meta: Option<String>) -> Self {
        Self {
            kind: EventKind::Clear,
            identity: identity.to_string(),
            resource_ref: None,
            actor: actor.to_string(),
            timestamp: at,
            display_meta,
        }
    }
}
