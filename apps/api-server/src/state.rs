//! Application state - shared across all handlers.

use std::sync::Arc;

use rysetor_core::ports::{
    Mailer, NotificationDispatcher, PostRepository, TokenService, UserRepository, VideoRepository,
};
use rysetor_core::services::{
    ApprovalService, FeedService, ProfileService, RegistrationService, SessionService,
    VideoService,
};
use rysetor_infra::{
    Argon2PasswordService, FileDropMailer, InMemoryDatabase, InMemoryMailer,
    InMemoryPostRepository, InMemoryUserRepository, InMemoryVideoRepository, JwtTokenService,
    LocalMediaStore, QueuedDispatcher, RandomAuthTokens, WebhookMailer,
};

#[cfg(feature = "postgres")]
use rysetor_infra::{
    DatabaseConnections, PostgresPostRepository, PostgresUserRepository, PostgresVideoRepository,
};

#[cfg(feature = "rate-limit")]
use rysetor_core::ports::AttemptThrottle;
#[cfg(feature = "rate-limit")]
use rysetor_infra::GovernorThrottle;

use crate::config::{AppConfig, MailBackend};

/// The three repositories the services run on.
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub videos: Arc<dyn VideoRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let db = InMemoryDatabase::new();
        Self {
            users: Arc::new(InMemoryUserRepository::new(db.clone())),
            posts: Arc::new(InMemoryPostRepository::new(db.clone())),
            videos: Arc::new(InMemoryVideoRepository::new(db)),
        }
    }

    #[cfg(feature = "postgres")]
    fn postgres(connections: &DatabaseConnections) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(connections.main.clone())),
            posts: Arc::new(PostgresPostRepository::new(connections.main.clone())),
            videos: Arc::new(PostgresVideoRepository::new(connections.main.clone())),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<RegistrationService>,
    pub approval: Arc<ApprovalService>,
    pub sessions: Arc<SessionService>,
    pub feed: Arc<FeedService>,
    pub videos: Arc<VideoService>,
    pub profiles: Arc<ProfileService>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub max_upload_bytes: usize,
    #[cfg(feature = "rate-limit")]
    pub throttle: Arc<dyn AttemptThrottle>,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with the configured backends.
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        #[cfg(feature = "postgres")]
        let (db, repos) = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let repos = Repositories::postgres(&connections);
                    (Some(Arc::new(connections)), repos)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    (None, Repositories::in_memory())
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (None, Repositories::in_memory())
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            Repositories::in_memory()
        };

        let mailer: Arc<dyn Mailer> = match config.mail.backend {
            MailBackend::File => Arc::new(FileDropMailer::new(
                config.mail.drop_dir.clone(),
                config.mail.sender.clone(),
            )),
            MailBackend::Webhook => {
                let url = config
                    .mail
                    .webhook_url
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("MAIL_WEBHOOK_URL is required"))?;
                Arc::new(WebhookMailer::new(url, config.mail.sender.clone())?)
            }
            MailBackend::Memory => Arc::new(InMemoryMailer::new()),
        };
        tracing::info!(backend = mailer.name(), "Mail backend selected");

        let store = LocalMediaStore::new(config.upload_folder.clone());
        store.prepare().await?;

        #[allow(unused_mut)]
        let mut state = Self::assemble(config, repos, mailer, store);

        #[cfg(feature = "postgres")]
        {
            state.db = db;
        }

        tracing::info!("Application state initialized");
        Ok(state)
    }

    /// Wire services over the given backends and start the dispatcher.
    pub fn assemble(
        config: &AppConfig,
        repos: Repositories,
        mailer: Arc<dyn Mailer>,
        store: LocalMediaStore,
    ) -> Self {
        let dispatcher = Arc::new(QueuedDispatcher::new(mailer, config.dispatcher.clone()));
        dispatcher.start();

        let store = Arc::new(store);
        let passwords = Arc::new(Argon2PasswordService::new());
        let auth_tokens = Arc::new(RandomAuthTokens);
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));

        Self {
            registration: Arc::new(RegistrationService::new(
                repos.users.clone(),
                passwords.clone(),
                auth_tokens.clone(),
                dispatcher.clone(),
                config.admins.clone(),
            )),
            approval: Arc::new(ApprovalService::new(
                repos.users.clone(),
                dispatcher.clone(),
                Arc::new(config.admin_key.clone()),
                config.admins.clone(),
            )),
            sessions: Arc::new(SessionService::new(
                repos.users.clone(),
                passwords,
                auth_tokens,
                tokens.clone(),
            )),
            feed: Arc::new(FeedService::new(
                repos.users.clone(),
                repos.posts,
                config.posts_per_page,
            )),
            videos: Arc::new(VideoService::new(
                repos.users.clone(),
                repos.videos,
                store.clone(),
                config.video_extensions.clone(),
                config.videos_per_page,
            )),
            profiles: Arc::new(ProfileService::new(
                repos.users.clone(),
                store,
                config.image_extensions.clone(),
            )),
            users: repos.users,
            tokens,
            dispatcher,
            max_upload_bytes: config.max_upload_bytes,
            #[cfg(feature = "rate-limit")]
            throttle: Arc::new(GovernorThrottle::new(&config.throttle)),
            #[cfg(feature = "postgres")]
            db: None,
        }
    }
}
