//! Response envelopes.
//!
//! Successes are wrapped in [`ApiResponse`]. Failures are RFC 7807 problem
//! documents whose `type` names one of the [`ProblemKind`]s below.

use serde::{Deserialize, Serialize};

/// Successful response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    /// The flash-style confirmation shown to the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Every kind of failure the API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    MalformedRequest,
    LoginRequired,
    SessionExpired,
    Forbidden,
    NotFound,
    Conflict,
    UploadTooLarge,
    InvalidForm,
    TooManyAttempts,
    Internal,
}

impl ProblemKind {
    pub fn status(self) -> u16 {
        match self {
            Self::MalformedRequest => 400,
            Self::LoginRequired | Self::SessionExpired => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::UploadTooLarge => 413,
            Self::InvalidForm => 422,
            Self::TooManyAttempts => 429,
            Self::Internal => 500,
        }
    }

    fn slug(self) -> &'static str {
        match self {
            Self::MalformedRequest => "malformed-request",
            Self::LoginRequired => "login-required",
            Self::SessionExpired => "session-expired",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not-found",
            Self::Conflict => "conflict",
            Self::UploadTooLarge => "upload-too-large",
            Self::InvalidForm => "invalid-form",
            Self::TooManyAttempts => "too-many-attempts",
            Self::Internal => "internal",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::MalformedRequest => "Bad Request",
            Self::LoginRequired => "Authentication Required",
            Self::SessionExpired => "Session Expired",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::Conflict => "Conflict",
            Self::UploadTooLarge => "Payload Too Large",
            Self::InvalidForm => "Validation Failed",
            Self::TooManyAttempts => "Too Many Requests",
            Self::Internal => "Internal Server Error",
        }
    }
}

/// One rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrorBody {
    pub field: String,
    pub message: String,
}

/// RFC 7807 problem document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Extension member listing each invalid form field.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldErrorBody>,
}

impl ErrorResponse {
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<FieldErrorBody>) -> Self {
        self.errors = errors;
        self
    }
}

impl From<ProblemKind> for ErrorResponse {
    fn from(kind: ProblemKind) -> Self {
        Self {
            error_type: format!("/problems/{}", kind.slug()),
            title: kind.title().to_string(),
            status: kind.status(),
            detail: None,
            errors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_problem_omits_empty_members() {
        let json = serde_json::to_value(ErrorResponse::from(ProblemKind::LoginRequired)).unwrap();

        assert_eq!(json["type"], "/problems/login-required");
        assert_eq!(json["status"], 401);
        assert!(json.get("errors").is_none());
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn invalid_form_lists_fields() {
        let body = ErrorResponse::from(ProblemKind::InvalidForm).with_errors(vec![FieldErrorBody {
            field: "email".into(),
            message: "Email already registered.".into(),
        }]);
        let json = serde_json::to_value(body).unwrap();

        assert_eq!(json["status"], 422);
        assert_eq!(json["errors"][0]["field"], "email");
    }

    #[test]
    fn message_is_skipped_until_set() {
        let plain = serde_json::to_value(ApiResponse::ok(1)).unwrap();
        assert!(plain.get("message").is_none());

        let flashed = serde_json::to_value(ApiResponse::ok(1).with_message("Saved.")).unwrap();
        assert_eq!(flashed["message"], "Saved.");
    }
}
