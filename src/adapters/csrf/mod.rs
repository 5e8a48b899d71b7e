//! CSRF token adapters.

mod hmac_tokens;

pub use hmac_tokens::HmacCsrfTokens;
