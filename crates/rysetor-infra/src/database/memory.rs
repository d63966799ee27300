//! In-memory repositories - used when no database URL is configured and in tests.
//!
//! Data is lost on process restart.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use rysetor_core::domain::{Page, PageRequest, Post, User, Video};
use rysetor_core::error::RepoError;
use rysetor_core::ports::{BaseRepository, PostRepository, UserRepository, VideoRepository};

/// A stored row plus its insertion sequence, used to order rows with equal timestamps.
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Default)]
struct Tables {
    seq: u64,
    users: HashMap<Uuid, Row<User>>,
    posts: HashMap<Uuid, Row<Post>>,
    videos: HashMap<Uuid, Row<Video>>,
    follows: HashSet<(Uuid, Uuid)>,
}

impl Tables {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }
}

/// Shared state behind the in-memory repositories.
#[derive(Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// Newest first; later inserts win ties.
fn newest_first<T: Clone>(
    rows: impl Iterator<Item = (chrono::DateTime<chrono::Utc>, u64, T)>,
    page: PageRequest,
) -> Page<T> {
    let mut rows: Vec<_> = rows.collect();
    rows.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));
    Page::from_sorted(rows.into_iter().map(|(_, _, v)| v).collect(), page)
}

#[derive(Clone)]
pub struct InMemoryUserRepository(Arc<InMemoryDatabase>);

impl InMemoryUserRepository {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self(db)
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.users.get(&id).map(|r| r.value.clone()))
    }

    async fn create(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.0.tables.write().await;

        if tables.users.contains_key(&user.id) {
            return Err(RepoError::Constraint("users_pkey".to_string()));
        }
        for row in tables.users.values() {
            if row.value.username == user.username {
                return Err(RepoError::Constraint("users_username_key".to_string()));
            }
            if row.value.email == user.email {
                return Err(RepoError::Constraint("users_email_key".to_string()));
            }
        }

        let seq = tables.next_seq();
        tables.users.insert(
            user.id,
            Row {
                seq,
                value: user.clone(),
            },
        );
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.0.tables.write().await;

        let clash = tables.users.values().any(|r| {
            r.value.id != user.id
                && (r.value.username == user.username || r.value.email == user.email)
        });
        if clash {
            return Err(RepoError::Constraint("users_username_key".to_string()));
        }

        let row = tables.users.get_mut(&user.id).ok_or(RepoError::NotFound)?;
        row.value = user.clone();
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;

        tables.users.remove(&id).ok_or(RepoError::NotFound)?;
        tables.follows.retain(|(a, b)| *a != id && *b != id);
        tables.posts.retain(|_, r| r.value.user_id != id);
        tables.videos.retain(|_, r| r.value.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|r| r.value.username == username)
            .map(|r| r.value.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|r| r.value.email == email)
            .map(|r| r.value.clone()))
    }

    async fn find_needing_follow_up(&self) -> Result<Vec<User>, RepoError> {
        let tables = self.0.tables.read().await;
        let mut rows: Vec<_> = tables
            .users
            .values()
            .filter(|r| r.value.needs_follow_up)
            .collect();
        rows.sort_by_key(|r| r.seq);
        Ok(rows.into_iter().map(|r| r.value.clone()).collect())
    }

    async fn follow(&self, follower: Uuid, followed: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;

        if !tables.users.contains_key(&follower) || !tables.users.contains_key(&followed) {
            return Err(RepoError::Constraint("follows_user_fkey".to_string()));
        }
        tables.follows.insert((follower, followed));
        Ok(())
    }

    async fn unfollow(&self, follower: Uuid, followed: Uuid) -> Result<(), RepoError> {
        self.0
            .tables
            .write()
            .await
            .follows
            .remove(&(follower, followed));
        Ok(())
    }

    async fn is_following(&self, follower: Uuid, followed: Uuid) -> Result<bool, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.follows.contains(&(follower, followed)))
    }

    async fn followed_ids(&self, follower: Uuid) -> Result<Vec<Uuid>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .follows
            .iter()
            .filter(|(a, _)| *a == follower)
            .map(|(_, b)| *b)
            .collect())
    }

    async fn follower_count(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.follows.iter().filter(|(_, b)| *b == user_id).count() as u64)
    }

    async fn following_count(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.follows.iter().filter(|(a, _)| *a == user_id).count() as u64)
    }
}

#[derive(Clone)]
pub struct InMemoryPostRepository(Arc<InMemoryDatabase>);

impl InMemoryPostRepository {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self(db)
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.posts.get(&id).map(|r| r.value.clone()))
    }

    async fn create(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.0.tables.write().await;

        if tables.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("posts_pkey".to_string()));
        }
        let seq = tables.next_seq();
        tables.posts.insert(
            post.id,
            Row {
                seq,
                value: post.clone(),
            },
        );
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.0.tables.write().await;
        let row = tables.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        row.value = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        tables.posts.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_authors(
        &self,
        authors: &[Uuid],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let tables = self.0.tables.read().await;
        let rows = tables
            .posts
            .values()
            .filter(|r| authors.contains(&r.value.user_id))
            .map(|r| (r.value.created_at, r.seq, r.value.clone()));
        Ok(newest_first(rows, page))
    }
}

#[derive(Clone)]
pub struct InMemoryVideoRepository(Arc<InMemoryDatabase>);

impl InMemoryVideoRepository {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self(db)
    }
}

#[async_trait]
impl BaseRepository<Video, Uuid> for InMemoryVideoRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables.videos.get(&id).map(|r| r.value.clone()))
    }

    async fn create(&self, video: Video) -> Result<Video, RepoError> {
        let mut tables = self.0.tables.write().await;

        let clash = tables
            .videos
            .values()
            .any(|r| r.value.id == video.id || r.value.title == video.title);
        if clash {
            return Err(RepoError::Constraint("videos_title_key".to_string()));
        }
        let seq = tables.next_seq();
        tables.videos.insert(
            video.id,
            Row {
                seq,
                value: video.clone(),
            },
        );
        Ok(video)
    }

    async fn update(&self, video: Video) -> Result<Video, RepoError> {
        let mut tables = self.0.tables.write().await;

        let clash = tables
            .videos
            .values()
            .any(|r| r.value.id != video.id && r.value.title == video.title);
        if clash {
            return Err(RepoError::Constraint("videos_title_key".to_string()));
        }
        let row = tables.videos.get_mut(&video.id).ok_or(RepoError::NotFound)?;
        row.value = video.clone();
        Ok(video)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.0.tables.write().await;
        tables.videos.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn find_by_title(&self, title: &str) -> Result<Option<Video>, RepoError> {
        let tables = self.0.tables.read().await;
        Ok(tables
            .videos
            .values()
            .find(|r| r.value.title == title)
            .map(|r| r.value.clone()))
    }

    async fn find_by_authors(
        &self,
        authors: &[Uuid],
        page: PageRequest,
    ) -> Result<Page<Video>, RepoError> {
        let tables = self.0.tables.read().await;
        let rows = tables
            .videos
            .values()
            .filter(|r| authors.contains(&r.value.user_id))
            .map(|r| (r.value.created_at, r.seq, r.value.clone()));
        Ok(newest_first(rows, page))
    }

    async fn increment_views(&self, id: Uuid) -> Result<Video, RepoError> {
        let mut tables = self.0.tables.write().await;
        let row = tables.videos.get_mut(&id).ok_or(RepoError::NotFound)?;
        row.value.views += 1;
        Ok(row.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        User::new(
            name.to_string(),
            format!("{name}@example.com"),
            "hash".to_string(),
            "token".to_string(),
        )
    }

    #[tokio::test]
    async fn rejects_duplicate_username_and_email() {
        let repo = InMemoryUserRepository::new(InMemoryDatabase::new());
        repo.create(user("alice")).await.unwrap();

        let mut same_name = user("alice");
        same_name.email = "other@example.com".to_string();
        assert!(matches!(
            repo.create(same_name).await,
            Err(RepoError::Constraint(_))
        ));

        let mut same_email = user("bob");
        same_email.email = "alice@example.com".to_string();
        assert!(matches!(
            repo.create(same_email).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn update_of_missing_user_is_not_found() {
        let repo = InMemoryUserRepository::new(InMemoryDatabase::new());
        assert!(matches!(
            repo.update(user("ghost")).await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn follow_is_idempotent_and_counted() {
        let repo = InMemoryUserRepository::new(InMemoryDatabase::new());
        let a = repo.create(user("a")).await.unwrap();
        let b = repo.create(user("b")).await.unwrap();

        repo.follow(a.id, b.id).await.unwrap();
        repo.follow(a.id, b.id).await.unwrap();

        assert!(repo.is_following(a.id, b.id).await.unwrap());
        assert!(!repo.is_following(b.id, a.id).await.unwrap());
        assert_eq!(repo.follower_count(b.id).await.unwrap(), 1);
        assert_eq!(repo.following_count(a.id).await.unwrap(), 1);

        repo.unfollow(a.id, b.id).await.unwrap();
        repo.unfollow(a.id, b.id).await.unwrap();
        assert_eq!(repo.follower_count(b.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn posts_are_paged_newest_first() {
        let db = InMemoryDatabase::new();
        let users = InMemoryUserRepository::new(db.clone());
        let posts = InMemoryPostRepository::new(db);
        let a = users.create(user("a")).await.unwrap();

        for i in 0..5 {
            posts.create(Post::new(a.id, format!("post {i}"))).await.unwrap();
        }

        let first = posts
            .find_by_authors(&[a.id], PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.items[0].body, "post 4");
        assert_eq!(first.items[1].body, "post 3");
        assert_eq!(first.next_page(), Some(2));

        let last = posts
            .find_by_authors(&[a.id], PageRequest::new(3, 2))
            .await
            .unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].body, "post 0");
        assert_eq!(last.next_page(), None);
    }

    #[tokio::test]
    async fn video_titles_are_unique() {
        let repo = InMemoryVideoRepository::new(InMemoryDatabase::new());
        let owner = Uuid::new_v4();
        repo.create(Video::new(owner, "Clip".into(), None, "a.mp4".into()))
            .await
            .unwrap();

        let dup = Video::new(owner, "Clip".into(), None, "b.mp4".into());
        assert!(matches!(repo.create(dup).await, Err(RepoError::Constraint(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_view_increments_are_all_counted() {
        let repo = Arc::new(InMemoryVideoRepository::new(InMemoryDatabase::new()));
        let video = repo
            .create(Video::new(Uuid::new_v4(), "Clip".into(), None, "a.mp4".into()))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.increment_views(video.id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(repo.find_by_id(video.id).await.unwrap().unwrap().views, 20);
        assert!(matches!(
            repo.increment_views(Uuid::new_v4()).await,
            Err(RepoError::NotFound)
        ));
    }
}
