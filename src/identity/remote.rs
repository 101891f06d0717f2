//! HTTP-backed identity resolver. POSTs the raw credential to an external auth
//! service and maps the response onto the resolver contract. Anything other than
//! a clear accept/reject (transport errors, timeouts, 5xx, bad bodies) is reported
//! as `Unavailable` so the boundary fails closed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::principal::Principal;
use super::provider::{IdentityResolver, ResolveError};

#[derive(Debug, Serialize)]
struct ResolveRequest<'a> {
    credential: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    user_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    active: Option<bool>,
}

pub struct RemoteResolver {
    url: String,
    client: reqwest::Client,
}

impl RemoteResolver {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url: url.into(), client })
    }

    pub fn url(&self) -> &str { &self.url }
}

#[async_trait]
impl IdentityResolver for RemoteResolver {
    async fn resolve(&self, credential: &str) -> Result<Principal, ResolveError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&ResolveRequest { credential })
            .send()
            .await
            .map_err(|e| {
                error!(target: "contextvault::auth", url = %self.url, "resolver request failed: {}", e);
                ResolveError::Unavailable(e.to_string())
            })?;
        let status = resp.status();
        match status {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                debug!(target: "contextvault::auth", status = status.as_u16(), "resolver rejected credential");
                return Err(ResolveError::Invalid);
            }
            StatusCode::GONE => return Err(ResolveError::Expired),
            other => {
                error!(target: "contextvault::auth", status = other.as_u16(), "resolver returned unexpected status");
                return Err(ResolveError::Unavailable(format!("unexpected status {}", other.as_u16())));
            }
        }
        let body: ResolveResponse = resp.json().await.map_err(|e| {
            error!(target: "contextvault::auth", "resolver response undecodable: {}", e);
            ResolveError::Unavailable(format!("bad response body: {}", e))
        })?;
        if body.active == Some(false) {
            return Err(ResolveError::Inactive);
        }
        if body.user_id.trim().is_empty() {
            return Err(ResolveError::Unavailable("resolver returned empty user_id".to_string()));
        }
        Ok(Principal { identity: body.user_id, display_name: body.display_name, email: body.email })
    }

    fn describe(&self) -> String { format!("remote resolver at {}", self.url) }
}
