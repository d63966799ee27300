//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use rysetor_core::domain::AdminRoster;
use rysetor_infra::database::DatabaseConfig;
use rysetor_infra::{DispatcherConfig, JwtConfig, Sha256AdminKey};

#[cfg(feature = "rate-limit")]
use rysetor_infra::ThrottleConfig;

const DEFAULT_SENDER: &str = "noreply@rysetor.local";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is required: {reason}")]
    Missing { var: &'static str, reason: &'static str },

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Which mail backend delivers notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailBackend {
    File,
    Webhook,
    Memory,
}

impl FromStr for MailBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "webhook" => Ok(Self::Webhook),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid {
                var: "MAIL_BACKEND",
                reason: format!("unknown backend '{other}' (expected file, webhook or memory)"),
            }),
        }
    }
}

/// Mail delivery settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub backend: MailBackend,
    pub drop_dir: PathBuf,
    pub webhook_url: Option<String>,
    pub sender: String,
}

/// When and whether flagged registrations are retried.
#[derive(Debug, Clone)]
#[cfg_attr(not(feature = "scheduler"), allow(dead_code))]
pub struct FollowUpSchedule {
    pub enabled: bool,
    /// Six-field cron expression, seconds first.
    pub cron: String,
}

impl Default for FollowUpSchedule {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: "0 */15 * * * *".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub admins: AdminRoster,
    pub admin_key: Sha256AdminKey,
    pub upload_folder: PathBuf,
    pub video_extensions: Vec<String>,
    pub image_extensions: Vec<String>,
    pub posts_per_page: u64,
    pub videos_per_page: u64,
    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: usize,
    pub mail: MailConfig,
    pub dispatcher: DispatcherConfig,
    pub jwt: JwtConfig,
    #[cfg(feature = "rate-limit")]
    pub throttle: ThrottleConfig,
    #[cfg_attr(not(feature = "scheduler"), allow(dead_code))]
    pub follow_up: FollowUpSchedule,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            admins: AdminRoster::default(),
            admin_key: Sha256AdminKey::disabled(),
            upload_folder: PathBuf::from("uploads"),
            video_extensions: list("mp4,webm,ogg,mov"),
            image_extensions: list("jpg,jpeg,png,gif"),
            posts_per_page: 25,
            videos_per_page: 10,
            max_upload_bytes: 256 * 1024 * 1024,
            mail: MailConfig {
                backend: MailBackend::File,
                drop_dir: PathBuf::from("email"),
                webhook_url: None,
                sender: DEFAULT_SENDER.to_string(),
            },
            dispatcher: DispatcherConfig::default(),
            jwt: JwtConfig::default(),
            #[cfg(feature = "rate-limit")]
            throttle: ThrottleConfig::default(),
            follow_up: FollowUpSchedule::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parsed("DB_MAX_CONNECTIONS").unwrap_or(100),
            min_connections: parsed("DB_MIN_CONNECTIONS").unwrap_or(10),
        });

        let admins = AdminRoster::new(list(&env::var("ADMINS").unwrap_or_default()));
        if admins.is_empty() {
            tracing::warn!("ADMINS is empty; registrations will be flagged for follow-up");
        }

        let admin_key = match (env::var("ADMIN_KEY_SHA256"), env::var("ADMIN_KEY")) {
            (Ok(digest), _) => {
                Sha256AdminKey::from_hex_digest(&digest).map_err(|e| ConfigError::Invalid {
                    var: "ADMIN_KEY_SHA256",
                    reason: e.to_string(),
                })?
            }
            (Err(_), Ok(key)) => Sha256AdminKey::from_plaintext(&key),
            _ => Sha256AdminKey::disabled(),
        };
        if !admin_key.is_configured() {
            tracing::warn!("No admin key configured; approvals will be rejected");
        }

        let backend = match env::var("MAIL_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.mail.backend,
        };
        let webhook_url = env::var("MAIL_WEBHOOK_URL").ok();
        if backend == MailBackend::Webhook && webhook_url.is_none() {
            return Err(ConfigError::Missing {
                var: "MAIL_WEBHOOK_URL",
                reason: "MAIL_BACKEND is webhook",
            });
        }
        let sender = env::var("MAIL_SENDER")
            .ok()
            .or_else(|| admins.emails().first().cloned())
            .unwrap_or_else(|| DEFAULT_SENDER.to_string());

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT").unwrap_or(defaults.port),
            database,
            admins,
            admin_key,
            upload_folder: env::var("UPLOAD_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_folder),
            video_extensions: env::var("VIDEO_EXTENSIONS")
                .map(|v| list(&v))
                .unwrap_or(defaults.video_extensions),
            image_extensions: env::var("IMAGE_EXTENSIONS")
                .map(|v| list(&v))
                .unwrap_or(defaults.image_extensions),
            posts_per_page: parsed("POSTS_PER_PAGE").unwrap_or(defaults.posts_per_page),
            videos_per_page: parsed("VIDEOS_PER_PAGE").unwrap_or(defaults.videos_per_page),
            max_upload_bytes: parsed::<usize>("MAX_UPLOAD_MB")
                .map(|mb| mb.saturating_mul(1024 * 1024))
                .unwrap_or(defaults.max_upload_bytes),
            mail: MailConfig {
                backend,
                drop_dir: env::var("MAIL_DROP_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.mail.drop_dir),
                webhook_url,
                sender,
            },
            dispatcher: DispatcherConfig::from_env(),
            jwt: JwtConfig::from_env(),
            #[cfg(feature = "rate-limit")]
            throttle: ThrottleConfig::from_env(),
            follow_up: FollowUpSchedule {
                enabled: env::var("SCHEDULER_ENABLED")
                    .map(|v| !matches!(v.trim(), "false" | "0"))
                    .unwrap_or(defaults.follow_up.enabled),
                cron: env::var("NOTIFY_RETRY_CRON").unwrap_or(defaults.follow_up.cron),
            },
        })
    }
}

fn parsed<T: FromStr>(var: &str) -> Option<T> {
    env::var(var).ok().and_then(|s| s.trim().parse().ok())
}

/// Split a comma-separated list, dropping blanks.
fn list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
