//! # RyseTor Infrastructure
//!
//! Concrete implementations of the ports defined in `rysetor-core`:
//! persistence, authentication primitives, notification delivery, media
//! storage and rate limiting.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory repositories only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `rate-limit` - Login and approval throttling via governor

pub mod auth;
pub mod database;
pub mod notify;
pub mod storage;

#[cfg(feature = "rate-limit")]
pub mod throttle;

pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService, RandomAuthTokens, Sha256AdminKey};
pub use database::{
    DatabaseConfig, InMemoryDatabase, InMemoryPostRepository, InMemoryUserRepository,
    InMemoryVideoRepository,
};
pub use notify::{DispatcherConfig, FileDropMailer, InMemoryMailer, QueuedDispatcher, WebhookMailer};
pub use storage::LocalMediaStore;

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConnections, PostgresPostRepository, PostgresUserRepository, PostgresVideoRepository,
};

#[cfg(feature = "rate-limit")]
pub use throttle::{GovernorThrottle, ThrottleConfig};
