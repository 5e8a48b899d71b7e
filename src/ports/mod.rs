//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the wizard engine and the outside world. Adapters implement these ports.
//!
//! - `SessionStore` - Persistence of HTTP session records
//! - `CsrfTokens` - CSRF secret/token minting and verification

mod csrf_tokens;
mod session_store;

pub use csrf_tokens::CsrfTokens;
pub use session_store::{SessionStore, SessionStoreError};
