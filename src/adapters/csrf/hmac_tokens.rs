//! HMAC-SHA256 CSRF tokens.
//!
//! A token is `<salt>-<hex(HMAC-SHA256(secret, salt))>`. Every page view
//! gets a fresh salt; verification recomputes the MAC and compares in
//! constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::ports::CsrfTokens;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, Default)]
pub struct HmacCsrfTokens;

impl HmacCsrfTokens {
    pub fn new() -> Self {
        Self
    }

    fn sign(secret: &str, salt: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
        mac.update(salt.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

impl CsrfTokens for HmacCsrfTokens {
    fn secret(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn create(&self, secret: &str) -> String {
        let salt = Uuid::new_v4().simple().to_string();
        let signature = hex::encode(Self::sign(secret, &salt));
        format!("{}-{}", salt, signature)
    }

    fn verify(&self, secret: &str, token: &str) -> bool {
        let Some((salt, signature)) = token.split_once('-') else {
            return false;
        };
        let Ok(provided) = hex::decode(signature) else {
            return false;
        };
        let expected = Self::sign(secret, salt);
        if expected.len() != provided.len() {
            return false;
        }
        expected.as_slice().ct_eq(provided.as_slice()).into()
    }
}
