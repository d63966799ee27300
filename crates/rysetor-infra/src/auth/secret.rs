//! Registration tokens and the shared admin key.
//!
//! Both comparisons run in constant time.

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use rysetor_core::ports::{AdminKeyVerifier, AuthError, AuthTokenService};

/// Issues 256-bit random tokens encoded as 64 hex characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomAuthTokens;

impl AuthTokenService for RandomAuthTokens {
    fn issue(&self) -> String {
        let bytes: [u8; 32] = rand::rng().random();
        hex::encode(bytes)
    }

    fn matches(&self, supplied: &str, expected: &str) -> bool {
        if expected.is_empty() {
            return false;
        }
        // Slices of different length compare unequal.
        supplied.as_bytes().ct_eq(expected.as_bytes()).into()
    }
}

/// Admin approval key held as a SHA-256 digest.
///
/// Without a configured key every attempt is rejected.
#[derive(Clone)]
pub struct Sha256AdminKey {
    digest: Option<[u8; 32]>,
}

impl Sha256AdminKey {
    /// Hash a plaintext key. An empty key disables approvals.
    pub fn from_plaintext(key: &str) -> Self {
        if key.is_empty() {
            return Self::disabled();
        }
        Self {
            digest: Some(Sha256::digest(key.as_bytes()).into()),
        }
    }

    /// Use a pre-computed hex-encoded SHA-256 digest.
    pub fn from_hex_digest(digest: &str) -> Result<Self, AuthError> {
        let bytes = hex::decode(digest.trim())
            .map_err(|e| AuthError::HashingError(format!("admin key digest: {e}")))?;
        let digest: [u8; 32] = bytes.try_into().map_err(|_| {
            AuthError::HashingError("admin key digest must be 32 bytes".to_string())
        })?;
        Ok(Self {
            digest: Some(digest),
        })
    }

    pub fn disabled() -> Self {
        Self { digest: None }
    }

    pub fn is_configured(&self) -> bool {
        self.digest.is_some()
    }
}

impl std::fmt::Debug for Sha256AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sha256AdminKey")
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl AdminKeyVerifier for Sha256AdminKey {
    fn verify(&self, supplied: &str) -> bool {
        let Some(expected) = &self.digest else {
            return false;
        };
        let actual: [u8; 32] = Sha256::digest(supplied.as_bytes()).into();
        actual.as_slice().ct_eq(expected.as_slice()).into()
    }
}
