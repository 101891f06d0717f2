use super::Principal;

/// Per-request bookkeeping carried through the HTTP boundary for logging.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub principal: Option<Principal>,
    pub request_id: String,
    pub channel: Option<&'static str>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self { principal: None, request_id: uuid::Uuid::new_v4().to_string(), channel: None }
    }

    pub fn identity(&self) -> Option<&str> { self.principal.as_ref().map(|p| p.identity.as_str()) }
}

impl Default for RequestContext {
    fn default() -> Self { Self::new() }
}
