//! Admin approval of pending accounts.

use std::sync::Arc;

use crate::domain::{AdminRoster, Notification, User};
use crate::error::DomainError;
use crate::ports::{AdminKeyVerifier, NotificationDispatcher, UserRepository};

use super::validation::Validator;

const MESSAGE_MAX: usize = 256;

/// Approval form input.
#[derive(Debug, Clone)]
pub struct ApprovalRequest {
    /// Account to approve.
    pub username: String,
    /// Approving administrator's email.
    pub admin: String,
    pub admin_key: String,
    /// Free-text message forwarded to the user.
    pub message: String,
}

#[derive(Debug, Clone)]
pub enum ApprovalOutcome {
    Approved { user: User, notified: bool },
    /// Nothing changed and nothing was sent.
    AlreadyApproved { user: User },
}

pub struct ApprovalService {
    users: Arc<dyn UserRepository>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    admin_key: Arc<dyn AdminKeyVerifier>,
    admins: AdminRoster,
}

impl ApprovalService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        admin_key: Arc<dyn AdminKeyVerifier>,
        admins: AdminRoster,
    ) -> Self {
        Self {
            users,
            dispatcher,
            admin_key,
            admins,
        }
    }

    pub async fn approve(&self, req: ApprovalRequest) -> Result<ApprovalOutcome, DomainError> {
        let mut user = self
            .users
            .find_by_username(req.username.trim())
            .await?
            .ok_or_else(|| DomainError::not_found("user", req.username.trim()))?;

        // The key gates everything else, including field validation.
        if !self.admin_key.verify(&req.admin_key) {
            tracing::warn!(username = %user.username, "Approval attempt with invalid admin key");
            return Err(DomainError::InvalidAdminKey);
        }

        let admin = req.admin.trim();
        let message = req.message.trim();

        let mut v = Validator::new();
        v.email("admin", admin)
            .required("message", message)
            .max_len("message", message, MESSAGE_MAX);
        if !v.has_error("admin") && !self.admins.contains(admin) {
            v.push("admin", "Administrator Email Invalid.");
        }
        v.finish()?;

        if user.approved {
            tracing::info!(username = %user.username, "User already approved");
            return Ok(ApprovalOutcome::AlreadyApproved { user });
        }

        user.approved = true;
        user.touch();
        let user = self.users.update(user).await?;

        tracing::info!(username = %user.username, admin = %admin, "User approved");

        let notified = match self
            .dispatcher
            .dispatch(Notification::approval(&user, message, admin))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(username = %user.username, error = %e, "Approval notice undelivered");
                false
            }
        };

        Ok(ApprovalOutcome::Approved { user, notified })
    }
}
