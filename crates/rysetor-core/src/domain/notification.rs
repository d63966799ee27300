use serde::{Deserialize, Serialize};

use super::User;

/// What a notification is about. Backends use it to pick a mailbox and a
/// file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Sent to the admins when someone registers; carries the auth token.
    NewRegistration,
    /// Confirmation sent to the registrant.
    Registration,
    /// Sent to the user once an admin approves the account.
    Approval,
}

impl NotificationKind {
    /// Admin-bound mail lands in the inbox, user-bound mail in the outbox.
    pub fn is_admin_bound(&self) -> bool {
        matches!(self, NotificationKind::NewRegistration)
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            NotificationKind::NewRegistration => "new-user",
            NotificationKind::Registration => "registration",
            NotificationKind::Approval => "approval",
        }
    }
}

/// An outbound message produced by a workflow event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    /// The account the message is about.
    pub username: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Admin notice for a new registration, including the note and token.
    pub fn new_registration(user: &User, note: &str, admins: &[String]) -> Self {
        let body = format!(
            "A new user has requested access to RyseTor.\n\n\
             Username: {}\n\
             Email: {}\n\n\
             Reason for joining:\n{}\n\n\
             Auth Token: {}\n",
            user.username, user.email, note, user.auth_token
        );

        Self {
            kind: NotificationKind::NewRegistration,
            username: user.username.clone(),
            to: admins.to_vec(),
            subject: "[RyseTor] New Registration".to_string(),
            body,
        }
    }

    /// Confirmation placeholder for the registrant.
    pub fn registration(user: &User) -> Self {
        let body = format!(
            "Hello {},\n\n\
             Thank you for registering at RyseTor. Your request has been passed on \
             to the administrators. You will receive another message once your \
             account has been approved.\n",
            user.username
        );

        Self {
            kind: NotificationKind::Registration,
            username: user.username.clone(),
            to: vec![user.email.clone()],
            subject: "[RyseTor] Registration".to_string(),
            body,
        }
    }

    /// Approval notice for the user, carrying the admin's message and the
    /// token needed to log in.
    pub fn approval(user: &User, message: &str, admin: &str) -> Self {
        let body = format!(
            "Hello {},\n\n\
             Your RyseTor account has been approved by {}.\n\n\
             {}\n\n\
             Log in with your username, password and this authentication token:\n\
             {}\n",
            user.username, admin, message, user.auth_token
        );

        Self {
            kind: NotificationKind::Approval,
            username: user.username.clone(),
            to: vec![user.email.clone()],
            subject: "[RyseTor] Registration Approved".to_string(),
            body,
        }
    }
}
