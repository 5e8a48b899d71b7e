//! Session store adapters.
//!
//! - `InMemorySessionStore` - In-memory for testing and single-server
//! - `RedisSessionStore` - Redis-backed for production multi-server

mod in_memory;
mod redis;

pub use in_memory::InMemorySessionStore;
pub use redis::RedisSessionStore;
