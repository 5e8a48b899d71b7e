//! Adapters - Implementations of ports and the HTTP surface.
//!
//! - `session` - Session stores (in-memory, Redis)
//! - `csrf` - HMAC CSRF tokens
//! - `http` - axum router and middleware

pub mod csrf;
pub mod http;
pub mod session;
