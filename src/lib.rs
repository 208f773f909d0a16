/// Guild Verifier
///
/// Verifies an Ethereum personal-message signature and reports which roles
/// the signer holds in the guild communities named by the message.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod context;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod server;

pub use context::AppContext;
pub use error::{GuildError, GuildResult};
