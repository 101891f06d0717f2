pub mod config;
pub mod error;
pub mod identity;
pub mod server;
pub mod vault;

pub use config::VaultConfig;
pub use error::{AppError, AppResult};
pub use vault::{ActiveContext, ContextEvent, ContextVault, EventKind, Scope};
