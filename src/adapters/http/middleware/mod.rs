//! HTTP middleware for axum.
//!
//! - `session` - Loads and saves the HTTP session around each request

pub mod session;

pub use session::{session_middleware, SessionState};
