//! Notification ports - mail backends and the delivery dispatcher.

use async_trait::async_trait;

use crate::domain::Notification;

/// A mail backend that delivers a single message once.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Attempt delivery. Retries are the dispatcher's job.
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Queues notifications for delivery and reports the outcome to the caller.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Enqueue a notification and wait for its final delivery outcome.
    async fn dispatch(&self, notification: Notification) -> Result<DeliveryReport, NotifyError>;

    /// Snapshot of dispatcher counters.
    fn stats(&self) -> DispatchStats;
}

/// Outcome of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Dispatcher counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub pending: usize,
    pub processing: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Notification errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NotifyError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Message rejected: {0}")]
    Rejected(String),

    #[error("Notification queue is full")]
    QueueFull,

    #[error("Dispatcher is shut down")]
    Closed,

    #[error("Delivery failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl NotifyError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NotifyError::Io(_) | NotifyError::Transport(_))
    }
}
