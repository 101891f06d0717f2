//! Credential extraction for the HTTP boundary.
//!
//! A request may carry its credential on more than one channel. Extractors are
//! tried in the order they were added and the first one that yields a non-empty
//! value wins. The default chain is: out-of-band header (server-to-server
//! callers), then the same-origin session cookie (browsers).

use axum::http::{HeaderMap, HeaderName};

use crate::config::VaultConfig;

pub trait CredentialExtractor: Send + Sync {
    /// Short channel label used in logs.
    fn channel(&self) -> &'static str;
    fn extract(&self, headers: &HeaderMap) -> Option<String>;
}

pub struct HeaderCredential {
    name: HeaderName,
}

impl HeaderCredential {
    pub fn new(name: &str) -> anyhow::Result<Self> {
        Ok(Self { name: HeaderName::from_bytes(name.trim().as_bytes())? })
    }
}

impl CredentialExtractor for HeaderCredential {
    fn channel(&self) -> &'static str { "header" }

    fn extract(&self, headers: &HeaderMap) -> Option<String> {
        let v = headers.get(&self.name)?.to_str().ok()?.trim();
        if v.is_empty() { None } else { Some(v.to_string()) }
    }
}

pub struct CookieCredential {
    name: String,
}

impl CookieCredential {
    pub fn new(name: impl Into<String>) -> Self { Self { name: name.into() } }
}

impl CredentialExtractor for CookieCredential {
    fn channel(&self) -> &'static str { "cookie" }

    fn extract(&self, headers: &HeaderMap) -> Option<String> {
        parse_cookie(headers, &self.name).filter(|v| !v.is_empty())
    }
}

/// Find cookie `name` across every `Cookie` header on the request.
pub(crate) fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all(axum::http::header::COOKIE).iter() {
        let Ok(s) = cookie.to_str() else { continue; };
        for part in s.split(';') {
            let p = part.trim();
            if let Some((k, v)) = p.split_once('=') {
                if k.trim() == name { return Some(v.trim().trim_matches('"').to_string()); }
            }
        }
    }
    None
}

#[derive(Default)]
pub struct CredentialChain {
    extractors: Vec<Box<dyn CredentialExtractor>>,
}

impl CredentialChain {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, extractor: impl CredentialExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    /// Header first, cookie second, using the configured names.
    pub fn from_config(cfg: &VaultConfig) -> anyhow::Result<Self> {
        Ok(Self::new()
            .with(HeaderCredential::new(&cfg.credential_header)?)
            .with(CookieCredential::new(cfg.session_cookie.trim())))
    }

    /// First present credential and the channel it came from.
    pub fn extract(&self, headers: &HeaderMap) -> Option<(&'static str, String)> {
        self.extractors.iter().find_map(|x| x.extract(headers).map(|c| (x.channel(), c)))
    }

    pub fn channels(&self) -> Vec<&'static str> { self.extractors.iter().map(|x| x.channel()).collect() }
}
