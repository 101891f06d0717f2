use async_trait::async_trait;

use super::principal::Principal;

/// Why a credential did not produce a principal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("credential not recognized")]
    Invalid,
    #[error("credential expired")]
    Expired,
    #[error("session or account inactive")]
    Inactive,
    /// Infrastructure failure while consulting the resolver. Callers fail closed.
    #[error("identity resolver unavailable: {0}")]
    Unavailable(String),
}

/// Contract with the external credential authority: raw credential in, verified principal out.
/// Implementations may block on remote lookups; the vault lock is never held while they run.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, credential: &str) -> Result<Principal, ResolveError>;

    /// Short label for startup logs.
    fn describe(&self) -> String { "identity resolver".to_string() }
}
