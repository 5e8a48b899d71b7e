//! CSRF Tokens Port - Interface for minting and verifying CSRF tokens.
//!
//! Each wizard session slice holds one secret. Tokens are derived from it
//! per page view and verified on unsafe requests.

/// Port for CSRF token generation and verification
pub trait CsrfTokens: Send + Sync {
    /// Generate a new secret
    fn secret(&self) -> String;

    /// Create a token bound to `secret`
    fn create(&self, secret: &str) -> String;

    /// Check that `token` was created from `secret`
    fn verify(&self, secret: &str, token: &str) -> bool;
}
