//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod notify;
mod repository;
mod storage;
mod throttle;

pub use auth::{
    AdminKeyVerifier, AuthError, AuthTokenService, IssuedToken, PasswordService, SessionLifetime,
    TokenClaims, TokenService,
};
pub use notify::{DeliveryReport, DispatchStats, Mailer, NotificationDispatcher, NotifyError};
pub use repository::{BaseRepository, PostRepository, UserRepository, VideoRepository};
pub use storage::{MediaChunks, MediaFile, MediaStore, StorageError};
pub use throttle::{AttemptThrottle, Verdict};
