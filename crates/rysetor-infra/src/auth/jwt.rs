//! JWT session tokens.
//!
//! Sessions are stateless HS256 tokens. A "remember me" login gets the long
//! lifetime and carries a `rem` claim so the server can tell the two apart.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rysetor_core::ports::{AuthError, IssuedToken, SessionLifetime, TokenClaims, TokenService};

const DEV_SECRET: &str = "change-me-in-production";

/// Signing key and session lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    /// Lifetime of a regular session.
    pub session_hours: i64,
    /// Lifetime of a "remember me" session.
    pub remember_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            issuer: "rysetor".to_string(),
            session_hours: 24,
            remember_days: 30,
        }
    }
}

impl JwtConfig {
    /// Reads `JWT_SECRET`, `JWT_ISSUER`, `JWT_EXPIRATION_HOURS` and `REMEMBER_ME_DAYS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret = std::env::var("JWT_SECRET").unwrap_or(defaults.secret);

        if secret == DEV_SECRET {
            let production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);
            if production {
                tracing::error!("SECURITY: default JWT secret in production; set JWT_SECRET");
            } else {
                tracing::warn!("Using the development JWT secret; set JWT_SECRET before deploying");
            }
        }

        let number = |var: &str, default: i64| {
            std::env::var(var)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
            session_hours: number("JWT_EXPIRATION_HOURS", defaults.session_hours),
            remember_days: number("REMEMBER_ME_DAYS", defaults.remember_days),
        }
    }

    fn lifetime(&self, lifetime: SessionLifetime) -> TimeDelta {
        match lifetime {
            SessionLifetime::Standard => TimeDelta::hours(self.session_hours),
            SessionLifetime::Remembered => TimeDelta::days(self.remember_days),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: Uuid,
    name: String,
    #[serde(default)]
    rem: bool,
    iat: i64,
    exp: i64,
    iss: String,
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::default();
        validation.set_issuer(&[&config.issuer]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(
        &self,
        user_id: Uuid,
        username: &str,
        lifetime: SessionLifetime,
    ) -> Result<IssuedToken, AuthError> {
        let ttl = self.config.lifetime(lifetime);
        let now = Utc::now();

        let claims = SessionClaims {
            sub: user_id,
            name: username.to_string(),
            rem: lifetime == SessionLifetime::Remembered,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_in: ttl.num_seconds(),
        })
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            },
        )?;

        Ok(TokenClaims {
            user_id: data.claims.sub,
            username: data.claims.name,
            remembered: data.claims.rem,
            exp: data.claims.exp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtTokenService {
        JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            ..JwtConfig::default()
        })
    }

    #[test]
    fn issued_token_carries_the_user() {
        let service = service();
        let user_id = Uuid::new_v4();

        let issued = service
            .issue(user_id, "alice", SessionLifetime::Standard)
            .unwrap();
        let claims = service.validate_token(&issued.token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.username, "alice");
        assert!(!claims.remembered);
        assert_eq!(issued.expires_in, 24 * 3600);
    }

    #[test]
    fn remembered_sessions_last_longer() {
        let service = service();

        let issued = service
            .issue(Uuid::new_v4(), "alice", SessionLifetime::Remembered)
            .unwrap();

        assert_eq!(issued.expires_in, 30 * 24 * 3600);
        assert!(service.validate_token(&issued.token).unwrap().remembered);
    }

    #[test]
    fn garbage_is_rejected() {
        let result = service().validate_token("not-a-jwt");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn token_from_another_secret_is_rejected() {
        let other = JwtTokenService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..JwtConfig::default()
        });
        let issued = other
            .issue(Uuid::new_v4(), "alice", SessionLifetime::Standard)
            .unwrap();

        assert!(service().validate_token(&issued.token).is_err());
    }

    #[test]
    fn expired_session_is_reported_as_expired() {
        let service = JwtTokenService::new(JwtConfig {
            secret: "test-secret-key".to_string(),
            session_hours: -2,
            ..JwtConfig::default()
        });
        let issued = service
            .issue(Uuid::new_v4(), "alice", SessionLifetime::Standard)
            .unwrap();

        assert!(matches!(
            service.validate_token(&issued.token),
            Err(AuthError::TokenExpired)
        ));
    }
}
