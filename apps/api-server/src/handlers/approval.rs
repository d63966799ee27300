//! Admin approval of pending accounts.

use actix_web::{HttpResponse, web};

use rysetor_core::error::DomainError;
use rysetor_core::ports::UserRepository;
use rysetor_core::services::{ApprovalOutcome, ApprovalRequest};
use rysetor_shared::ApiResponse;
use rysetor_shared::dto::{
    ApprovalRequest as ApprovalBody, ApprovalResponse, ApprovalStatus, PendingUserResponse,
};

use crate::middleware::auth::CurrentUser;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /send_token/{username}
pub async fn pending_user(
    state: web::Data<AppState>,
    _me: CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| DomainError::not_found("user", username))?;

    Ok(HttpResponse::Ok().json(PendingUserResponse {
        username: user.username,
        approved: user.approved,
        registered_at: user.created_at.to_rfc3339(),
    }))
}

/// POST /send_token/{username}
pub async fn approve(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    path: web::Path<String>,
    body: web::Json<ApprovalBody>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let outcome = state
        .approval
        .approve(ApprovalRequest {
            username: path.into_inner(),
            admin: req.admin,
            admin_key: req.admin_key,
            message: req.message,
        })
        .await?;

    let (response, message) = match outcome {
        ApprovalOutcome::Approved { user, notified } => {
            tracing::info!(approved_by = %me.username, username = %user.username, "Approval recorded");
            (
                ApprovalResponse {
                    username: user.username,
                    status: ApprovalStatus::Approved,
                    notified,
                },
                "User approved for registration.",
            )
        }
        ApprovalOutcome::AlreadyApproved { user } => (
            ApprovalResponse {
                username: user.username,
                status: ApprovalStatus::AlreadyApproved,
                notified: false,
            },
            "User already approved.",
        ),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(response).with_message(message)))
}
