//! Authentication and authorization ports.

use uuid::Uuid;

/// How long a session stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLifetime {
    /// The regular lifetime, for browser sessions.
    Standard,
    /// The extended lifetime requested with "remember me".
    Remembered,
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: i64,
}

/// Claims carried by a session token.
#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub user_id: Uuid,
    pub username: String,
    pub remembered: bool,
    pub exp: i64,
}

/// Session token service (signed, stateless tokens).
pub trait TokenService: Send + Sync {
    /// Sign a session token for a user.
    fn issue(
        &self,
        user_id: Uuid,
        username: &str,
        lifetime: SessionLifetime,
    ) -> Result<IssuedToken, AuthError>;

    /// Validate and decode a token.
    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError>;
}

/// Password hashing service.
pub trait PasswordService: Send + Sync {
    /// Hash a plain text password.
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Verify a password against a hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Issues and checks the registration token.
pub trait AuthTokenService: Send + Sync {
    /// Generate a fresh opaque token.
    fn issue(&self) -> String;

    /// Compare a supplied token with the stored one without leaking timing.
    fn matches(&self, supplied: &str, expected: &str) -> bool;
}

/// Checks the shared admin approval key.
pub trait AdminKeyVerifier: Send + Sync {
    fn verify(&self, supplied: &str) -> bool;
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Missing authentication")]
    MissingAuth,

    #[error("Hashing error: {0}")]
    HashingError(String),
}
