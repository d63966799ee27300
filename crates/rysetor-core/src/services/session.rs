//! Login: username + password + registration token.

use std::sync::Arc;

use crate::domain::User;
use crate::error::DomainError;
use crate::ports::{
    AuthTokenService, PasswordService, SessionLifetime, TokenService, UserRepository,
};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub token: String,
    pub remember_me: bool,
}

/// An issued session.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
    pub expires_in: i64,
    pub remember_me: bool,
}

pub struct SessionService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    auth_tokens: Arc<dyn AuthTokenService>,
    sessions: Arc<dyn TokenService>,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        auth_tokens: Arc<dyn AuthTokenService>,
        sessions: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            passwords,
            auth_tokens,
            sessions,
        }
    }

    /// Every factor must match. Which one failed is never reported.
    ///
    /// The registration token stays valid after a successful login.
    pub async fn login(&self, req: LoginRequest) -> Result<Session, DomainError> {
        let user = self
            .users
            .find_by_username(req.username.trim())
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        let password_ok = self
            .passwords
            .verify(&req.password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        let token_ok = self.auth_tokens.matches(req.token.trim(), &user.auth_token);

        if !(password_ok && token_ok) {
            tracing::info!(username = %user.username, "Rejected login");
            return Err(DomainError::InvalidCredentials);
        }

        if !user.approved {
            tracing::info!(username = %user.username, "Login before approval");
            return Err(DomainError::PendingApproval);
        }

        let lifetime = if req.remember_me {
            SessionLifetime::Remembered
        } else {
            SessionLifetime::Standard
        };
        let issued = self
            .sessions
            .issue(user.id, &user.username, lifetime)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            remember_me = req.remember_me,
            "User logged in"
        );

        Ok(Session {
            user,
            token: issued.token,
            expires_in: issued.expires_in,
            remember_me: req.remember_me,
        })
    }
}
