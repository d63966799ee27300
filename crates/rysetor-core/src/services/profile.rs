//! Profiles, avatars and `last_seen` tracking.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{MediaKind, User, has_allowed_extension, sanitize_filename};
use crate::error::DomainError;
use crate::ports::{MediaStore, UserRepository};

use super::validation::Validator;

const ABOUT_MAX: usize = 512;

/// Served when a user has no avatar.
pub const PLACEHOLDER_AVATAR: &str = "placeholder.jpg";

#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub followers: u64,
    pub following: u64,
    /// Whether the requesting user follows this one.
    pub followed_by_viewer: bool,
}

#[derive(Debug, Clone)]
pub struct EditProfile {
    pub username: String,
    pub about_me: Option<String>,
}

pub struct ProfileService {
    users: Arc<dyn UserRepository>,
    store: Arc<dyn MediaStore>,
    image_extensions: Vec<String>,
}

impl ProfileService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        store: Arc<dyn MediaStore>,
        image_extensions: Vec<String>,
    ) -> Self {
        Self {
            users,
            store,
            image_extensions,
        }
    }

    /// Load the caller's account and record activity.
    pub async fn touch_last_seen(&self, user_id: Uuid) -> Result<User, DomainError> {
        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id.to_string()))?;

        user.last_seen = Some(Utc::now());
        Ok(self.users.update(user).await?)
    }

    pub async fn profile(&self, username: &str, viewer: Uuid) -> Result<Profile, DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        Ok(Profile {
            followers: self.users.follower_count(user.id).await?,
            following: self.users.following_count(user.id).await?,
            followed_by_viewer: self.users.is_following(viewer, user.id).await?,
            user,
        })
    }

    pub async fn edit(&self, mut user: User, input: EditProfile) -> Result<User, DomainError> {
        let username = input.username.trim();
        let about_me = input
            .about_me
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());

        let mut v = Validator::new();
        v.required("username", username)
            .max_len("about_me", about_me.unwrap_or_default(), ABOUT_MAX);
        if !v.has_error("username")
            && username != user.username
            && self.users.find_by_username(username).await?.is_some()
        {
            v.push("username", "Username already taken.");
        }
        v.finish()?;

        user.username = username.to_string();
        user.about_me = about_me.map(String::from);
        user.touch();

        let user = self.users.update(user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Profile updated");
        Ok(user)
    }

    pub async fn upload_avatar(
        &self,
        mut user: User,
        filename: &str,
        bytes: &[u8],
    ) -> Result<User, DomainError> {
        if filename.trim().is_empty() {
            return Err(DomainError::invalid("upload", "This field is required."));
        }
        if !has_allowed_extension(filename, &self.image_extensions) {
            return Err(DomainError::invalid("upload", "Invalid file type"));
        }
        let filename = sanitize_filename(filename)
            .ok_or_else(|| DomainError::invalid("upload", "Invalid file type"))?;
        // Avatars live in one directory; the owner prefix keeps users apart.
        let filename = format!("{}-{}", user.id.simple(), filename);

        self.store
            .replace(MediaKind::Image, &filename, bytes)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        let previous = user.avatar.replace(filename);
        user.touch();
        let user = self.users.update(user).await?;

        let stale = previous.filter(|p| Some(p) != user.avatar.as_ref() && p != PLACEHOLDER_AVATAR);
        if let Some(stale) = stale {
            if let Err(e) = self.store.delete(MediaKind::Image, &stale).await {
                tracing::warn!(user_id = %user.id, filename = %stale, error = %e, "Old avatar not removed");
            }
        }

        tracing::info!(user_id = %user.id, "Avatar uploaded");
        Ok(user)
    }

    /// The user's avatar file name and bytes, or the placeholder.
    pub async fn avatar(&self, username: &str) -> Result<(String, Vec<u8>), DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let filename = user
            .avatar
            .unwrap_or_else(|| PLACEHOLDER_AVATAR.to_string());

        let bytes = self
            .store
            .load(MediaKind::Image, &filename)
            .await
            .map_err(|e| match e {
                crate::ports::StorageError::NotFound(_) => {
                    DomainError::not_found("avatar", filename.clone())
                }
                other => DomainError::Storage(other.to_string()),
            })?;

        Ok((filename, bytes))
    }
}
