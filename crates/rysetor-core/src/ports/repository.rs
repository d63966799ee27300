use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Page, PageRequest, Post, User, Video};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity.
    async fn create(&self, entity: T) -> Result<T, RepoError>;

    /// Overwrite an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository, including the self-referential follow relation.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Accounts whose admin notification was never delivered.
    async fn find_needing_follow_up(&self) -> Result<Vec<User>, RepoError>;

    /// Record that `follower` follows `followed`. Idempotent.
    async fn follow(&self, follower: Uuid, followed: Uuid) -> Result<(), RepoError>;

    /// Remove a follow. Removing a missing follow is not an error.
    async fn unfollow(&self, follower: Uuid, followed: Uuid) -> Result<(), RepoError>;

    async fn is_following(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError>;

    /// IDs of the users `follower` follows.
    async fn followed_ids(&self, follower: Uuid) -> Result<Vec<Uuid>, RepoError>;

    async fn follower_count(&self, user_id: Uuid) -> Result<u64, RepoError>;

    async fn following_count(&self, user_id: Uuid) -> Result<u64, RepoError>;
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Posts written by any of `authors`, newest first.
    async fn find_by_authors(
        &self,
        authors: &[Uuid],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;
}

/// Video repository.
#[async_trait]
pub trait VideoRepository: BaseRepository<Video, Uuid> {
    async fn find_by_title(&self, title: &str) -> Result<Option<Video>, RepoError>;

    /// Videos uploaded by any of `authors`, newest first.
    async fn find_by_authors(
        &self,
        authors: &[Uuid],
        page: PageRequest,
    ) -> Result<Page<Video>, RepoError>;

    /// Add one to the view counter in a single step and return the updated video.
    async fn increment_views(&self, id: Uuid) -> Result<Video, RepoError>;
}
