//! Password hashing with Argon2id.
//!
//! Hashes are stored as PHC strings, so each one records the parameters it
//! was made with and older hashes keep verifying after the defaults change.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use rysetor_core::ports::{AuthError, PasswordService};

pub struct Argon2PasswordService {
    params: Params,
}

impl Argon2PasswordService {
    /// Argon2id with the crate's recommended cost.
    pub fn new() -> Self {
        Self {
            params: Params::default(),
        }
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2PasswordService {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordService for Argon2PasswordService {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashingError(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// `Ok(false)` for a wrong password; `Err` only for a corrupt stored hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let stored = PasswordHash::new(hash)
            .map_err(|e| AuthError::HashingError(format!("stored hash: {e}")))?;

        match self.argon2().verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashingError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2PasswordService {
        Argon2PasswordService {
            params: Params::new(8, 1, 1, None).unwrap(),
        }
    }

    #[test]
    fn right_password_verifies_and_wrong_one_does_not() {
        let service = cheap();
        let hash = service.hash("hunter22").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(service.verify("hunter22", &hash).unwrap());
        assert!(!service.verify("hunter23", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_a_fresh_salt() {
        let service = cheap();
        assert_ne!(service.hash("same").unwrap(), service.hash("same").unwrap());
    }

    #[test]
    fn hash_made_with_other_params_still_verifies() {
        let hash = cheap().hash("hunter22").unwrap();

        assert!(Argon2PasswordService::new().verify("hunter22", &hash).unwrap());
    }

    #[test]
    fn corrupt_stored_hash_is_an_error() {
        assert!(matches!(
            cheap().verify("pw", "plaintext-not-phc"),
            Err(AuthError::HashingError(_))
        ));
    }
}
