//! Queued notification dispatcher.
//!
//! A fixed pool of workers drains a bounded channel. Each notification is
//! retried with exponential backoff and its final outcome is handed back to
//! the caller over a oneshot channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot};

use rysetor_core::domain::Notification;
use rysetor_core::ports::{
    DeliveryReport, DispatchStats, Mailer, NotificationDispatcher, NotifyError,
};

type Reply = oneshot::Sender<Result<DeliveryReport, NotifyError>>;

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker tasks.
    pub workers: usize,
    /// Channel capacity. Dispatch fails with `QueueFull` beyond this.
    pub queue_size: usize,
    /// Attempts per notification, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub base_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_size: 1024,
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
        }
    }
}

impl DispatcherConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let var = |name: &str| std::env::var(name).ok();

        Self {
            workers: var("NOTIFY_WORKERS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.workers),
            queue_size: var("NOTIFY_QUEUE_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.queue_size),
            max_attempts: var("NOTIFY_MAX_ATTEMPTS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_attempts),
            base_backoff: var("NOTIFY_BACKOFF_MS")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_backoff),
        }
    }

    /// Delay after failed attempt number `attempt` (1-based).
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

struct Envelope {
    notification: Notification,
    reply: Reply,
}

#[derive(Default)]
struct Counters {
    pending: AtomicUsize,
    processing: AtomicUsize,
    delivered: AtomicUsize,
    failed: AtomicUsize,
}

/// Bounded-queue dispatcher over a single [`Mailer`].
pub struct QueuedDispatcher {
    mailer: Arc<dyn Mailer>,
    config: DispatcherConfig,
    stats: Arc<Counters>,
    sender: mpsc::Sender<Envelope>,
    receiver: Arc<Mutex<mpsc::Receiver<Envelope>>>,
    started: AtomicBool,
}

impl QueuedDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, config: DispatcherConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_size.max(1));

        Self {
            mailer,
            config,
            stats: Arc::new(Counters::default()),
            sender: tx,
            receiver: Arc::new(Mutex::new(rx)),
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the worker pool. Calling this more than once has no effect.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        for worker_id in 0..self.config.workers.max(1) {
            let mailer = self.mailer.clone();
            let receiver = self.receiver.clone();
            let stats = self.stats.clone();
            let config = self.config.clone();

            tokio::spawn(async move {
                tracing::info!(worker = worker_id, mailer = mailer.name(), "Notification worker started");

                loop {
                    let envelope = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };

                    let Some(Envelope {
                        notification,
                        reply,
                    }) = envelope
                    else {
                        tracing::info!(worker = worker_id, "Notification worker shutting down");
                        break;
                    };

                    stats.pending.fetch_sub(1, Ordering::Relaxed);
                    stats.processing.fetch_add(1, Ordering::Relaxed);

                    let result = deliver_with_retry(mailer.as_ref(), &config, &notification).await;

                    stats.processing.fetch_sub(1, Ordering::Relaxed);
                    match &result {
                        Ok(report) => {
                            stats.delivered.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(
                                worker = worker_id,
                                kind = ?notification.kind,
                                username = %notification.username,
                                attempts = report.attempts,
                                "Notification delivered"
                            );
                        }
                        Err(e) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            tracing::error!(
                                worker = worker_id,
                                kind = ?notification.kind,
                                username = %notification.username,
                                error = %e,
                                "Notification failed"
                            );
                        }
                    }

                    // The caller may have gone away; the outcome is already logged.
                    let _ = reply.send(result);
                }
            });
        }
    }
}

async fn deliver_with_retry(
    mailer: &dyn Mailer,
    config: &DispatcherConfig,
    notification: &Notification,
) -> Result<DeliveryReport, NotifyError> {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match mailer.deliver(notification).await {
            Ok(()) => return Ok(DeliveryReport { attempts: attempt }),
            Err(e) if !e.is_retryable() => return Err(e),
            Err(e) if attempt >= max_attempts => {
                return Err(NotifyError::Exhausted {
                    attempts: attempt,
                    last_error: e.to_string(),
                });
            }
            Err(e) => {
                let delay = config.backoff(attempt);
                tracing::warn!(
                    username = %notification.username,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Notification attempt failed, will retry"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[async_trait]
impl NotificationDispatcher for QueuedDispatcher {
    async fn dispatch(&self, notification: Notification) -> Result<DeliveryReport, NotifyError> {
        let (reply, outcome) = oneshot::channel();

        self.stats.pending.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.sender.try_send(Envelope {
            notification,
            reply,
        }) {
            self.stats.pending.fetch_sub(1, Ordering::Relaxed);
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => NotifyError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => NotifyError::Closed,
            });
        }

        outcome.await.map_err(|_| NotifyError::Closed)?
    }

    fn stats(&self) -> DispatchStats {
        DispatchStats {
            pending: self.stats.pending.load(Ordering::Relaxed),
            processing: self.stats.processing.load(Ordering::Relaxed),
            delivered: self.stats.delivered.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::InMemoryMailer;
    use rysetor_core::domain::{NotificationKind, User};

    fn notice() -> Notification {
        let user = User::new(
            "alice".into(),
            "alice@x.com".into(),
            "hash".into(),
            "tok".into(),
        );
        Notification::registration(&user)
    }

    fn fast(max_attempts: u32) -> DispatcherConfig {
        DispatcherConfig {
            workers: 2,
            queue_size: 8,
            max_attempts,
            base_backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn backoff_doubles() {
        let config = DispatcherConfig {
            base_backoff: Duration::from_millis(100),
            ..DispatcherConfig::default()
        };
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn delivers_on_first_attempt() {
        let mailer = Arc::new(InMemoryMailer::new());
        let dispatcher = QueuedDispatcher::new(mailer.clone(), fast(3));
        dispatcher.start();

        let report = dispatcher.dispatch(notice()).await.unwrap();

        assert_eq!(report.attempts, 1);
        assert_eq!(mailer.messages().len(), 1);
        assert_eq!(mailer.messages()[0].kind, NotificationKind::Registration);
        assert_eq!(dispatcher.stats().delivered, 1);
        assert_eq!(dispatcher.stats().pending, 0);
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let mailer = Arc::new(InMemoryMailer::new());
        mailer.fail_next(2);
        let dispatcher = QueuedDispatcher::new(mailer.clone(), fast(3));
        dispatcher.start();

        let report = dispatcher.dispatch(notice()).await.unwrap();

        assert_eq!(report.attempts, 3);
        assert_eq!(mailer.messages().len(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mailer = Arc::new(InMemoryMailer::new());
        mailer.fail_next(5);
        let dispatcher = QueuedDispatcher::new(mailer.clone(), fast(2));
        dispatcher.start();

        let err = dispatcher.dispatch(notice()).await.unwrap_err();

        assert!(matches!(err, NotifyError::Exhausted { attempts: 2, .. }));
        assert!(mailer.messages().is_empty());
        assert_eq!(dispatcher.stats().failed, 1);
    }

    #[tokio::test]
    async fn full_queue_fails_fast() {
        let mailer = Arc::new(InMemoryMailer::new());
        let dispatcher = QueuedDispatcher::new(
            mailer,
            DispatcherConfig {
                queue_size: 1,
                ..fast(1)
            },
        );
        // No workers: the first message occupies the only slot.
        let dispatcher = Arc::new(dispatcher);
        let first = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move { dispatcher.dispatch(notice()).await })
        };
        tokio::task::yield_now().await;
        while dispatcher.stats().pending == 0 {
            tokio::task::yield_now().await;
        }

        let err = dispatcher.dispatch(notice()).await.unwrap_err();
        assert!(matches!(err, NotifyError::QueueFull));

        dispatcher.start();
        assert!(first.await.unwrap().is_ok());
    }
}
