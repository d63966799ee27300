//! Account registration.
//!
//! Creates a pending account, issues its auth token and notifies both the
//! admins (with the note and token) and the registrant. The account record is
//! committed before any notification goes out; if the admin notice cannot be
//! delivered the account is flagged for follow-up instead of rolled back.

use std::sync::Arc;

use crate::domain::{AdminRoster, Notification, User, mask_email};
use crate::error::{DomainError, RepoError};
use crate::ports::{AuthTokenService, NotificationDispatcher, PasswordService, UserRepository};

use super::validation::Validator;

const NOTE_MAX: usize = 512;

/// Registration form input.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub note_to_admin: String,
}

/// A completed registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub admin_notified: bool,
    pub registrant_notified: bool,
}

/// Result of a follow-up sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowUpReport {
    pub attempted: usize,
    pub delivered: usize,
}

pub struct RegistrationService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn AuthTokenService>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    admins: AdminRoster,
}

impl RegistrationService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn AuthTokenService>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        admins: AdminRoster,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
            dispatcher,
            admins,
        }
    }

    pub async fn register(&self, input: RegisterUser) -> Result<Registration, DomainError> {
        let username = input.username.trim();
        let email = input.email.trim();
        let note = input.note_to_admin.trim();

        self.validate(username, email, &input, note).await?;

        let password_hash = self
            .passwords
            .hash(&input.password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = User::new(
            username.to_string(),
            email.to_string(),
            password_hash,
            self.tokens.issue(),
        )
        .with_admin_note(note);

        let mut user = self.users.create(user).await.map_err(|e| match e {
            // Lost a race with a concurrent registration for the same name or email.
            RepoError::Constraint(_) => {
                DomainError::Duplicate("Username or email already registered.".to_string())
            }
            other => other.into(),
        })?;

        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            email = %mask_email(&user.email),
            "New registrant"
        );

        let admin_notified = self.notify_admins(&user, note).await;
        if !admin_notified {
            user.needs_follow_up = true;
            user.touch();
            user = self.flag_for_follow_up(user).await;
        }

        let registrant_notified = match self
            .dispatcher
            .dispatch(Notification::registration(&user))
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    username = %user.username,
                    error = %e,
                    "Registrant confirmation undelivered"
                );
                false
            }
        };

        Ok(Registration {
            user,
            admin_notified,
            registrant_notified,
        })
    }

    /// Re-send the admin notice for every account flagged for follow-up and
    /// clear the flag where delivery now succeeds.
    pub async fn resend_follow_ups(&self) -> Result<FollowUpReport, DomainError> {
        let pending = self.users.find_needing_follow_up().await?;
        let mut report = FollowUpReport {
            attempted: pending.len(),
            delivered: 0,
        };

        for mut user in pending {
            let note = user.admin_note.clone().unwrap_or_default();
            if self.notify_admins(&user, &note).await {
                user.needs_follow_up = false;
                user.touch();
                self.users.update(user).await?;
                report.delivered += 1;
            }
        }

        if report.attempted > 0 {
            tracing::info!(
                attempted = report.attempted,
                delivered = report.delivered,
                "Follow-up notifications processed"
            );
        }

        Ok(report)
    }

    /// Persist the follow-up flag. The account already exists at this point,
    /// so a failed write is logged and retried once instead of failing the
    /// registration.
    async fn flag_for_follow_up(&self, user: User) -> User {
        for attempt in 1..=2 {
            match self.users.update(user.clone()).await {
                Ok(stored) => {
                    tracing::error!(
                        username = %stored.username,
                        "Admin notification undelivered; account flagged for follow-up"
                    );
                    return stored;
                }
                Err(e) => tracing::warn!(
                    username = %user.username,
                    attempt,
                    error = %e,
                    "Could not save follow-up flag"
                ),
            }
        }

        tracing::error!(
            username = %user.username,
            "Admin notification undelivered and follow-up flag not saved; admins must be told manually"
        );
        user
    }

    async fn validate(
        &self,
        username: &str,
        email: &str,
        input: &RegisterUser,
        note: &str,
    ) -> Result<(), DomainError> {
        let mut v = Validator::new();
        v.required("username", username)
            .email("email", email)
            .required("password", &input.password)
            .required("password_confirm", &input.password_confirm)
            .required("note_to_admin", note)
            .max_len("note_to_admin", note, NOTE_MAX);

        if !input.password_confirm.is_empty() && input.password_confirm != input.password {
            v.push("password_confirm", "Field must be equal to password.");
        }

        if !v.has_error("username") && self.users.find_by_username(username).await?.is_some() {
            v.push("username", "Username already taken.");
        }
        if !v.has_error("email") && self.users.find_by_email(email).await?.is_some() {
            v.push("email", "Email already registered.");
        }

        v.finish()
    }

    async fn notify_admins(&self, user: &User, note: &str) -> bool {
        if self.admins.is_empty() {
            tracing::warn!(username = %user.username, "No admins configured for registration notices");
            return false;
        }

        let notice = Notification::new_registration(user, note, self.admins.emails());
        match self.dispatcher.dispatch(notice).await {
            Ok(report) => {
                tracing::debug!(
                    username = %user.username,
                    attempts = report.attempts,
                    "Admin registration notice delivered"
                );
                true
            }
            Err(e) => {
                tracing::error!(username = %user.username, error = %e, "Admin registration notice failed");
                false
            }
        }
    }
}
