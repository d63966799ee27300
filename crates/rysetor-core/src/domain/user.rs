use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - a registered account.
///
/// `approved` starts out false and only the approval workflow flips it.
/// `auth_token` is issued once at registration and is required, together
/// with the password, to log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub auth_token: String,
    pub approved: bool,
    pub about_me: Option<String>,
    pub avatar: Option<String>,
    /// Note the registrant left for the admins.
    pub admin_note: Option<String>,
    /// Set when the admin notification for this registration was never delivered.
    pub needs_follow_up: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a pending (unapproved) account.
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        auth_token: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            auth_token,
            approved: false,
            about_me: None,
            avatar: None,
            admin_note: None,
            needs_follow_up: false,
            last_seen: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_admin_note(mut self, note: impl Into<String>) -> Self {
        self.admin_note = Some(note.into());
        self
    }

    /// Bump `updated_at` after a mutation.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Mask the local part of an email for logging (`a***@example.com`).
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            if local.chars().count() > 1 {
                format!("{first}***@{domain}")
            } else {
                format!("***@{domain}")
            }
        }
        None => "***".to_string(),
    }
}
