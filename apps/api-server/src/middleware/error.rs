//! Maps failures onto RFC 7807 problem responses.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};

use rysetor_core::FieldError;
use rysetor_core::error::{DomainError, RepoError};
use rysetor_shared::{ErrorResponse, FieldErrorBody, ProblemKind};

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),
    #[cfg_attr(not(feature = "rate-limit"), allow(dead_code))]
    #[error("too many attempts, retry in {retry_after}s")]
    TooManyAttempts { retry_after: u64 },
    #[error("{} invalid field(s)", .0.len())]
    Validation(Vec<FieldError>),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    fn kind(&self) -> ProblemKind {
        match self {
            AppError::NotFound(_) => ProblemKind::NotFound,
            AppError::BadRequest(_) => ProblemKind::MalformedRequest,
            AppError::Unauthorized(_) => ProblemKind::LoginRequired,
            AppError::Forbidden(_) => ProblemKind::Forbidden,
            AppError::Conflict(_) => ProblemKind::Conflict,
            AppError::PayloadTooLarge(_) => ProblemKind::UploadTooLarge,
            AppError::TooManyAttempts { .. } => ProblemKind::TooManyAttempts,
            AppError::Validation(_) => ProblemKind::InvalidForm,
            AppError::Internal(_) => ProblemKind::Internal,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        let problem = ErrorResponse::from(self.kind());
        let problem = match self {
            AppError::NotFound(detail)
            | AppError::BadRequest(detail)
            | AppError::Unauthorized(detail)
            | AppError::Forbidden(detail)
            | AppError::Conflict(detail)
            | AppError::PayloadTooLarge(detail) => problem.with_detail(detail.clone()),
            AppError::TooManyAttempts { retry_after } => problem.with_detail(format!(
                "Too many attempts. Try again in {retry_after} seconds."
            )),
            AppError::Validation(errors) => problem.with_errors(
                errors
                    .iter()
                    .map(|e| FieldErrorBody {
                        field: e.field.clone(),
                        message: e.message.clone(),
                    })
                    .collect(),
            ),
            AppError::Internal(detail) => {
                // Logged here, never sent to the client.
                tracing::error!(detail = %detail, "Internal error");
                problem
            }
        };

        let mut response = HttpResponse::build(self.status_code());
        if let AppError::TooManyAttempts { retry_after } = self {
            response.insert_header((header::RETRY_AFTER, retry_after.to_string()));
        }
        response.json(problem)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity_type, key } => {
                AppError::NotFound(format!("{} '{}' not found", entity_type, key))
            }
            DomainError::Validation(errors) => AppError::Validation(errors),
            DomainError::Duplicate(msg) => AppError::Conflict(msg),
            DomainError::InvalidCredentials => {
                AppError::Unauthorized("Invalid credentials".to_string())
            }
            DomainError::PendingApproval => {
                AppError::Forbidden("Account pending approval".to_string())
            }
            DomainError::InvalidAdminKey => AppError::Forbidden("Invalid Admin Key".to_string()),
            DomainError::Forbidden(msg) => AppError::Forbidden(msg),
            DomainError::Storage(msg) => AppError::Internal(format!("storage: {msg}")),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        DomainError::from(err).into()
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_statuses() {
        let cases = [
            (DomainError::not_found("user", "bob"), StatusCode::NOT_FOUND),
            (DomainError::invalid("email", "Invalid email address."), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DomainError::PendingApproval, StatusCode::FORBIDDEN),
            (DomainError::InvalidAdminKey, StatusCode::FORBIDDEN),
            (DomainError::Duplicate("x".into()), StatusCode::CONFLICT),
            (DomainError::Storage("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[test]
    fn throttled_response_carries_retry_after() {
        let response = AppError::TooManyAttempts { retry_after: 7 }.error_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "7");
    }
}
