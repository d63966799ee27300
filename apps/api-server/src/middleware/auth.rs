//! Authentication extractors.
//!
//! A session token is read from the `rysetor_session` cookie or from an
//! `Authorization: Bearer` header.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};

use rysetor_core::domain::User;
use rysetor_core::error::DomainError;
use rysetor_core::ports::{AuthError, TokenClaims, TokenService};
use rysetor_shared::{ErrorResponse, ProblemKind};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "rysetor_session";

/// Verified session claims, before the account itself is loaded.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            username: claims.username,
        }
    }
}

/// A request without a usable session.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct AuthenticationError(pub AuthError);

impl AuthenticationError {
    fn problem(&self) -> ErrorResponse {
        match &self.0 {
            AuthError::TokenExpired => ErrorResponse::from(ProblemKind::SessionExpired)
                .with_detail("Your session has expired. Please log in again."),
            AuthError::InvalidToken(msg) => {
                ErrorResponse::from(ProblemKind::LoginRequired).with_detail(msg.clone())
            }
            AuthError::MissingAuth => ErrorResponse::from(ProblemKind::LoginRequired)
                .with_detail("Please log in to access this page."),
            AuthError::HashingError(_) => ErrorResponse::from(ProblemKind::Internal),
        }
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.problem().status).unwrap_or(StatusCode::UNAUTHORIZED)
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        actix_web::HttpResponse::build(self.status_code()).json(self.problem())
    }
}

/// Session token from the cookie, falling back to a Bearer header.
fn session_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Ok(cookie.value().to_string());
        }
    }

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

impl FromRequest for Identity {
    type Error = AuthenticationError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token_service = match req.app_data::<web::Data<Arc<dyn TokenService>>>() {
            Some(service) => service,
            None => {
                tracing::error!("TokenService not found in app data");
                return ready(Err(AuthenticationError(AuthError::InvalidToken(
                    "Server configuration error".to_string(),
                ))));
            }
        };

        let token = match session_token(req) {
            Ok(token) => token,
            Err(e) => return ready(Err(AuthenticationError(e))),
        };

        match token_service.validate_token(&token) {
            Ok(claims) => ready(Ok(Identity::from(claims))),
            Err(e) => ready(Err(AuthenticationError(e))),
        }
    }
}

/// The signed-in user, loaded fresh for this request.
///
/// Extracting it records the caller's `last_seen`.
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let identity = Identity::from_request(req, payload).into_inner();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let identity = identity?;
            let state = state
                .ok_or_else(|| AppError::Internal("AppState not found in app data".to_string()))?;

            match state.profiles.touch_last_seen(identity.user_id).await {
                Ok(user) => Ok(CurrentUser(user)),
                Err(DomainError::NotFound { .. }) => {
                    tracing::warn!(username = %identity.username, "Session for a deleted account");
                    Err(AuthenticationError(AuthError::InvalidToken(
                        "Account no longer exists".to_string(),
                    ))
                    .into())
                }
                Err(e) => Err(AppError::from(e).into()),
            }
        })
    }
}
