//! Video upload, viewing and deletion.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    MediaKind, Page, PageRequest, User, Video, has_allowed_extension, sanitize_filename,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{MediaFile, MediaStore, StorageError, UserRepository, VideoRepository};

use super::author_names;
use super::validation::Validator;

const DESCRIPTION_MAX: usize = 512;
const TITLE_TAKEN: &str = "Video title already being used.";

#[derive(Debug, Clone)]
pub struct UploadVideo {
    pub title: String,
    pub description: Option<String>,
    /// File name as sent by the client.
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct VideoView {
    pub video: Video,
    pub author: String,
}

pub struct VideoService {
    users: Arc<dyn UserRepository>,
    videos: Arc<dyn VideoRepository>,
    store: Arc<dyn MediaStore>,
    extensions: Vec<String>,
    per_page: u64,
}

impl VideoService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        videos: Arc<dyn VideoRepository>,
        store: Arc<dyn MediaStore>,
        extensions: Vec<String>,
        per_page: u64,
    ) -> Self {
        Self {
            users,
            videos,
            store,
            extensions,
            per_page,
        }
    }

    pub async fn upload(&self, author: &User, input: UploadVideo) -> Result<Video, DomainError> {
        let title = input.title.trim();
        let description = input
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        let mut v = Validator::new();
        v.required("title", title)
            .max_len("description", description.unwrap_or_default(), DESCRIPTION_MAX)
            .required("upload", &input.filename);
        if !v.has_error("title") && self.videos.find_by_title(title).await?.is_some() {
            v.push("title", TITLE_TAKEN);
        }
        v.finish()?;

        if !has_allowed_extension(&input.filename, &self.extensions) {
            return Err(DomainError::invalid("upload", "Invalid file type"));
        }
        let filename = sanitize_filename(&input.filename)
            .ok_or_else(|| DomainError::invalid("upload", "Invalid file type"))?;

        let video_id = Uuid::new_v4();
        let filename = self.store_file(video_id, filename, &input.bytes).await?;

        let mut video = Video::new(
            author.id,
            title.to_string(),
            description.map(String::from),
            filename.clone(),
        );
        video.id = video_id;

        let video = match self.videos.create(video).await {
            Ok(video) => video,
            Err(e) => {
                self.discard_file(&filename).await;
                return Err(match e {
                    RepoError::Constraint(_) => DomainError::invalid("title", TITLE_TAKEN),
                    other => other.into(),
                });
            }
        };

        tracing::info!(
            user_id = %author.id,
            title = %video.title,
            filename = %video.filename,
            bytes = input.bytes.len(),
            "Video uploaded"
        );
        Ok(video)
    }

    /// Videos by `user` and everyone `user` follows, newest first.
    pub async fn feed(&self, user: &User, page: u64) -> Result<Page<VideoView>, DomainError> {
        let mut authors = self.users.followed_ids(user.id).await?;
        authors.push(user.id);

        let page = self
            .videos
            .find_by_authors(&authors, PageRequest::new(page, self.per_page))
            .await?;
        self.with_authors(page).await
    }

    pub async fn by_user(
        &self,
        username: &str,
        page: u64,
    ) -> Result<(User, Page<VideoView>), DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))?;

        let page = self
            .videos
            .find_by_authors(&[user.id], PageRequest::new(page, self.per_page))
            .await?;
        let page = self.with_authors(page).await?;
        Ok((user, page))
    }

    /// Open a video for playback. Views by anyone but the author are counted.
    pub async fn watch(&self, viewer: &User, title: &str) -> Result<(Video, MediaFile), DomainError> {
        let mut video = self.find(title).await?;

        let file = self
            .store
            .open(MediaKind::Video, &video.filename)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        if viewer.id != video.user_id {
            video = self.videos.increment_views(video.id).await?;
        }

        Ok((video, file))
    }

    /// Remove a video row, then its file. Only the author may delete.
    ///
    /// The two removals are not atomic: if the file cannot be removed the
    /// row is still gone and the file is left orphaned.
    pub async fn delete(&self, actor: &User, title: &str) -> Result<Video, DomainError> {
        let video = self.find(title).await?;

        if actor.id != video.user_id {
            return Err(DomainError::Forbidden(
                "you cannot delete another user's video".to_string(),
            ));
        }

        self.videos.delete(video.id).await?;

        if let Err(e) = self.store.delete(MediaKind::Video, &video.filename).await {
            tracing::error!(
                title = %video.title,
                filename = %video.filename,
                error = %e,
                "Video row deleted but file removal failed"
            );
        }

        tracing::info!(user_id = %actor.id, title = %video.title, "Video deleted");
        Ok(video)
    }

    pub async fn find(&self, title: &str) -> Result<Video, DomainError> {
        self.videos
            .find_by_title(title)
            .await?
            .ok_or_else(|| DomainError::not_found("video", title))
    }

    /// Write a new upload without touching existing files. A taken name gets
    /// the first eight hex digits of the video id as a prefix.
    async fn store_file(
        &self,
        video_id: Uuid,
        filename: String,
        bytes: &[u8],
    ) -> Result<String, DomainError> {
        match self.store.create(MediaKind::Video, &filename, bytes).await {
            Ok(()) => return Ok(filename),
            Err(StorageError::AlreadyExists(_)) => {}
            Err(e) => return Err(DomainError::Storage(e.to_string())),
        }

        let prefixed = format!("{}-{}", &video_id.simple().to_string()[..8], filename);
        self.store
            .create(MediaKind::Video, &prefixed, bytes)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;
        Ok(prefixed)
    }

    async fn discard_file(&self, filename: &str) {
        if let Err(e) = self.store.delete(MediaKind::Video, filename).await {
            tracing::error!(filename, error = %e, "Upload rejected but its file could not be removed");
        }
    }

    async fn with_authors(&self, page: Page<Video>) -> Result<Page<VideoView>, DomainError> {
        let ids: Vec<Uuid> = page.items.iter().map(|v| v.user_id).collect();
        let names = author_names(self.users.as_ref(), ids).await?;

        Ok(page.map(|video| VideoView {
            author: names.get(&video.user_id).cloned().unwrap_or_default(),
            video,
        }))
    }
}
