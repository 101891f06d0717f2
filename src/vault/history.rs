//! Bounded audit log
//! -----------------
//! Fixed-capacity FIFO of `ContextEvent`s. Appending past capacity drops the
//! oldest entry. Entries are never modified after they are appended; queries
//! return clones in insertion order and leave any re-sorting to the caller.

use std::collections::VecDeque;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::model::ContextEvent;
use super::VaultError;

/// Visibility breadth of a history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Only the events of the requesting identity.
    #[serde(rename = "self")]
    Own,
    /// Every identity's events. Privileged.
    All,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Own => "self",
            Scope::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized scope '{0}' (expected 'self' or 'all')")]
pub struct UnknownScope(pub String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "self" => Ok(Scope::Own),
            "all" => Ok(Scope::All),
            _ => Err(UnknownScope(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventLog {
    capacity: usize,
    entries: VecDeque<ContextEvent>,
}

impl EventLog {
    /// A capacity of zero is raised to one so every mutation stays observable.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, entries: VecDeque::with_capacity(capacity) }
    }

    pub fn capacity(&self) -> usize { self.capacity }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Append an event, returning the evicted oldest entry when the log was full.
    pub fn push(&mut self, event: ContextEvent) -> Option<ContextEvent> {
        let dropped = if self.entries.len() >= self.capacity { self.entries.pop_front() } else { None };
        self.entries.push_back(event);
        dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContextEvent> { self.entries.iter() }

    /// `Scope::Own` requires an identity and filters to it; `Scope::All` ignores the identity.
    pub fn query(&self, identity: Option<&str>, scope: Scope) -> Result<Vec<ContextEvent>, VaultError> {
        match scope {
            Scope::All => Ok(self.entries.iter().cloned().collect()),
            Scope::Own => {
                let id = identity.ok_or(VaultError::ScopeRequiresIdentity)?;
                Ok(self.entries.iter().filter(|e| e.identity == id).cloned().collect())
            }
        }
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod history_tests;
