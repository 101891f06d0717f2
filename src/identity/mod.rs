//! Identity resolution and privilege policy for the context vault.
//! The vault never issues credentials; it only consumes the `IdentityResolver`
//! contract. Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod remote;
mod request_context;
mod authorizer;

pub use principal::Principal;
pub use session::{SessionRecord, SessionTable, SessionToken};
pub use provider::{IdentityResolver, ResolveError};
pub use remote::RemoteResolver;
pub use request_context::RequestContext;
pub use authorizer::{AllowAuthenticated, AllowList, PrivilegePolicy, PrivilegedOp};
