//! Server configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `CONTEXTVAULT_*` environment variables. The server binary applies CLI flags
//! on top of the result.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::vault::{DEFAULT_HISTORY_CAPACITY, DEFAULT_IDLE_TTL};

pub const ENV_PREFIX: &str = "CONTEXTVAULT_";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct VaultConfig {
    pub bind_address: String,
    pub http_port: u16,
    /// Maximum number of audit events retained; the oldest is dropped first.
    pub history_capacity: usize,
    /// Contexts untouched for longer than this are evicted by the sweeper.
    pub idle_ttl_secs: u64,
    /// Interval of the background sweeper. 0 disables it.
    pub sweep_interval_secs: u64,
    /// Out-of-band credential header for server-to-server callers. Checked first.
    pub credential_header: String,
    /// Same-origin session cookie for browser callers. Checked second.
    pub session_cookie: String,
    /// When set, credentials are resolved by POSTing to this URL.
    pub resolver_url: Option<String>,
    pub resolver_timeout_ms: u64,
    /// JSON array of session rows seeding the in-process session table.
    pub sessions_file: Option<String>,
    pub privileged_identities: Vec<String>,
    /// Let any authenticated identity run privileged operations.
    pub open_privileged: bool,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            http_port: 8001,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            idle_ttl_secs: DEFAULT_IDLE_TTL.as_secs(),
            sweep_interval_secs: 300,
            credential_header: "x-session-id".to_string(),
            session_cookie: "session_id".to_string(),
            resolver_url: None,
            resolver_timeout_ms: 2_000,
            sessions_file: None,
            privileged_identities: Vec::new(),
            open_privileged: false,
        }
    }
}

pub(crate) fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_list(v: &str) -> Vec<String> {
    v.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()).map(|s| s.to_string()).collect()
}

fn parse_num<T: std::str::FromStr>(key: &str, v: &str) -> Result<T> {
    v.trim().parse::<T>().map_err(|_| anyhow::anyhow!("invalid value for {}{}: '{}'", ENV_PREFIX, key, v))
}

impl VaultConfig {
    pub fn idle_ttl(&self) -> Duration { Duration::from_secs(self.idle_ttl_secs) }
    pub fn sweep_interval(&self) -> Option<Duration> {
        if self.sweep_interval_secs == 0 { None } else { Some(Duration::from_secs(self.sweep_interval_secs)) }
    }
    pub fn resolver_timeout(&self) -> Duration { Duration::from_millis(self.resolver_timeout_ms) }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).with_context(|| format!("reading config file {}", path.display()))?;
        let cfg: VaultConfig = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(cfg)
    }

    /// Apply overrides from an iterator of `(key, value)` pairs using `CONTEXTVAULT_*` names.
    pub fn apply_env_from<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (k, v) in vars {
            let Some(key) = k.as_ref().strip_prefix(ENV_PREFIX) else { continue; };
            let v = v.as_ref();
            match key {
                "BIND_ADDRESS" => self.bind_address = v.to_string(),
                "HTTP_PORT" => self.http_port = parse_num(key, v)?,
                "HISTORY_CAPACITY" => self.history_capacity = parse_num(key, v)?,
                "IDLE_TTL_SECS" => self.idle_ttl_secs = parse_num(key, v)?,
                "SWEEP_INTERVAL_SECS" => self.sweep_interval_secs = parse_num(key, v)?,
                "CREDENTIAL_HEADER" => self.credential_header = v.to_string(),
                "SESSION_COOKIE" => self.session_cookie = v.to_string(),
                "RESOLVER_URL" => self.resolver_url = Some(v.to_string()).filter(|s| !s.is_empty()),
                "RESOLVER_TIMEOUT_MS" => self.resolver_timeout_ms = parse_num(key, v)?,
                "SESSIONS_FILE" => self.sessions_file = Some(v.to_string()).filter(|s| !s.is_empty()),
                "PRIVILEGED" => self.privileged_identities = parse_list(v),
                "OPEN_PRIVILEGED" => {
                    self.open_privileged = parse_bool(v)
                        .ok_or_else(|| anyhow::anyhow!("invalid value for {}OPEN_PRIVILEGED: '{}'", ENV_PREFIX, v))?
                }
                // Consumed by the binary before the file is loaded.
                "CONFIG" => {}
                _ => tracing::warn!(target: "contextvault::config", "ignoring unknown setting {}{}", ENV_PREFIX, key),
            }
        }
        Ok(())
    }

    pub fn apply_env(&mut self) -> Result<()> { self.apply_env_from(std::env::vars()) }

    /// Defaults, then the file named by `CONTEXTVAULT_CONFIG` if any, then environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = match std::env::var(format!("{}CONFIG", ENV_PREFIX)) {
            Ok(p) if !p.trim().is_empty() => Self::load_file(p.trim())?,
            _ => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 { bail!("history_capacity must be at least 1"); }
        if self.credential_header.trim().is_empty() { bail!("credential_header must not be empty"); }
        if self.session_cookie.trim().is_empty() { bail!("session_cookie must not be empty"); }
        if axum::http::HeaderName::from_bytes(self.credential_header.as_bytes()).is_err() {
            bail!("credential_header '{}' is not a valid header name", self.credential_header);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
