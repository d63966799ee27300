//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use rysetor_core::domain::{Page, PageRequest, Post, User, Video, mask_email};
use rysetor_core::error::RepoError;
use rysetor_core::ports::{PostRepository, UserRepository, VideoRepository};

use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::entity::video::{self, Entity as VideoEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL video repository.
pub type PostgresVideoRepository = PostgresBaseRepository<VideoEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_needing_follow_up(&self) -> Result<Vec<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::NeedsFollowUp.eq(true))
            .order_by_asc(user::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn follow(&self, follower: Uuid, followed: Uuid) -> Result<(), RepoError> {
        if self.is_following(follower, followed).await? {
            return Ok(());
        }

        let row = follow::ActiveModel {
            follower_id: Set(follower),
            followed_id: Set(followed),
            created_at: Set(Utc::now().into()),
        };

        match FollowEntity::insert(row).exec(&self.db).await {
            Ok(_) => Ok(()),
            // A concurrent request inserted the same pair.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(()),
            Err(e) => Err(map_db_err(e)),
        }
    }

    async fn unfollow(&self, follower: Uuid, followed: Uuid) -> Result<(), RepoError> {
        FollowEntity::delete_many()
            .filter(follow::Column::FollowerId.eq(follower))
            .filter(follow::Column::FollowedId.eq(followed))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn is_following(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError> {
        let row = FollowEntity::find_by_id((follower, followed))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(row.is_some())
    }

    async fn followed_ids(&self, follower: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let rows = FollowEntity::find()
            .filter(follow::Column::FollowerId.eq(follower))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(|f| f.followed_id).collect())
    }

    async fn follower_count(&self, user_id: Uuid) -> Result<u64, RepoError> {
        FollowEntity::find()
            .filter(follow::Column::FollowedId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }

    async fn following_count(&self, user_id: Uuid) -> Result<u64, RepoError> {
        FollowEntity::find()
            .filter(follow::Column::FollowerId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(map_db_err)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_authors(
        &self,
        authors: &[Uuid],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let paginator = PostEntity::find()
            .filter(post::Column::UserId.is_in(authors.iter().copied()))
            .order_by_desc(post::Column::CreatedAt)
            .paginate(&self.db, page.per_page);

        let total = paginator.num_items().await.map_err(map_db_err)?;
        let items = paginator
            .fetch_page(page.page.saturating_sub(1))
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(
            items.into_iter().map(Into::into).collect(),
            total,
            page,
        ))
    }
}

#[async_trait]
impl VideoRepository for PostgresVideoRepository {
    async fn find_by_title(&self, title: &str) -> Result<Option<Video>, RepoError> {
        let result = VideoEntity::find()
            .filter(video::Column::Title.eq(title))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_authors(
        &self,
        authors: &[Uuid],
        page: PageRequest,
    ) -> Result<Page<Video>, RepoError> {
        let paginator = VideoEntity::find()
            .filter(video::Column::UserId.is_in(authors.iter().copied()))
            .order_by_desc(video::Column::CreatedAt)
            .paginate(&self.db, page.per_page);

        let total = paginator.num_items().await.map_err(map_db_err)?;
        let items = paginator
            .fetch_page(page.page.saturating_sub(1))
            .await
            .map_err(map_db_err)?;

        Ok(Page::new(
            items.into_iter().map(Into::into).collect(),
            total,
            page,
        ))
    }

    async fn increment_views(&self, id: Uuid) -> Result<Video, RepoError> {
        let result = VideoEntity::update_many()
            .col_expr(video::Column::Views, Expr::col(video::Column::Views).add(1))
            .filter(video::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        VideoEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(Into::into)
            .ok_or(RepoError::NotFound)
    }
}
