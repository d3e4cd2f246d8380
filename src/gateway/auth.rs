use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{GatewayError, Result};

/// The gateway's static shared secret.
///
/// Only a SHA-256 digest is kept; candidates are hashed and compared
/// without early exit so timing does not depend on the matching prefix.
#[derive(Clone)]
pub struct AuthKey {
    digest: Vec<u8>,
}

impl AuthKey {
    pub fn new(secret: &str) -> Self {
        Self {
            digest: Sha256::digest(secret.as_bytes()).to_vec(),
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        let candidate = Sha256::digest(candidate.as_bytes());
        candidate
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    pub fn verify(&self, candidate: &str) -> Result<()> {
        if self.matches(candidate) {
            Ok(())
        } else {
            Err(GatewayError::Unauthorized)
        }
    }
}

impl fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthKey(..)")
    }
}
