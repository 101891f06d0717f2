use serde::{Deserialize, Serialize};

/// A verified caller. `identity` is the only key used for context isolation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub identity: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Principal {
    pub fn new(identity: impl Into<String>) -> Self {
        Self { identity: identity.into(), ..Default::default() }
    }
}
