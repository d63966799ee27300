//! Status posts, follows and the followed-posts feed.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Page, PageRequest, Post, User};
use crate::error::DomainError;
use crate::ports::{PostRepository, UserRepository};

use super::author_names;
use super::validation::Validator;

const BODY_MAX: usize = 256;

/// A post together with its author's current username.
#[derive(Debug, Clone)]
pub struct PostView {
    pub post: Post,
    pub author: String,
}

pub struct FeedService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    per_page: u64,
}

impl FeedService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        per_page: u64,
    ) -> Self {
        Self {
            users,
            posts,
            per_page,
        }
    }

    pub async fn create_post(&self, author: &User, body: &str) -> Result<Post, DomainError> {
        let body = body.trim();

        let mut v = Validator::new();
        v.required("post", body).max_len("post", body, BODY_MAX);
        v.finish()?;

        let post = self
            .posts
            .create(Post::new(author.id, body.to_string()))
            .await?;
        tracing::debug!(user_id = %author.id, post_id = %post.id, "Post created");
        Ok(post)
    }

    /// Posts by `user` and everyone `user` follows, newest first.
    pub async fn feed(&self, user: &User, page: u64) -> Result<Page<PostView>, DomainError> {
        let mut authors = self.users.followed_ids(user.id).await?;
        authors.push(user.id);

        let page = self
            .posts
            .find_by_authors(&authors, PageRequest::new(page, self.per_page))
            .await?;
        self.with_authors(page).await
    }

    /// One user's posts, newest first.
    pub async fn user_posts(
        &self,
        username: &str,
        page: u64,
    ) -> Result<(User, Page<PostView>), DomainError> {
        let user = self.find_user(username).await?;
        let page = self
            .posts
            .find_by_authors(&[user.id], PageRequest::new(page, self.per_page))
            .await?;
        let page = self.with_authors(page).await?;
        Ok((user, page))
    }

    pub async fn follow(&self, me: &User, username: &str) -> Result<User, DomainError> {
        let target = self.find_user(username).await?;
        if target.id == me.id {
            return Err(DomainError::invalid("username", "You cannot follow yourself."));
        }

        self.users.follow(me.id, target.id).await?;
        tracing::debug!(follower = %me.username, followed = %target.username, "Follow");
        Ok(target)
    }

    pub async fn unfollow(&self, me: &User, username: &str) -> Result<User, DomainError> {
        let target = self.find_user(username).await?;
        if target.id == me.id {
            return Err(DomainError::invalid("username", "You cannot unfollow yourself."));
        }

        self.users.unfollow(me.id, target.id).await?;
        tracing::debug!(follower = %me.username, followed = %target.username, "Unfollow");
        Ok(target)
    }

    async fn find_user(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))
    }

    async fn with_authors(&self, page: Page<Post>) -> Result<Page<PostView>, DomainError> {
        let ids: Vec<Uuid> = page.items.iter().map(|p| p.user_id).collect();
        let names = author_names(self.users.as_ref(), ids).await?;

        Ok(page.map(|post| PostView {
            author: names.get(&post.user_id).cloned().unwrap_or_default(),
            post,
        }))
    }
}
