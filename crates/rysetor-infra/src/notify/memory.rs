//! In-process outbox - used for development and tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use rysetor_core::domain::Notification;
use rysetor_core::ports::{Mailer, NotifyError};

/// Collects delivered notifications in memory.
#[derive(Default)]
pub struct InMemoryMailer {
    outbox: Mutex<Vec<Notification>>,
    failures: AtomicU32,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` deliveries fail with a transport error.
    pub fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Everything delivered so far, oldest first.
    pub fn messages(&self) -> Vec<Notification> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    /// Messages addressed to `recipient`.
    pub fn messages_to(&self, recipient: &str) -> Vec<Notification> {
        self.messages()
            .into_iter()
            .filter(|n| n.to.iter().any(|to| to == recipient))
            .collect()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(NotifyError::Transport("simulated outage".to_string()));
        }

        self.outbox
            .lock()
            .map_err(|_| NotifyError::Io("outbox lock poisoned".to_string()))?
            .push(notification.clone());

        tracing::debug!(
            kind = ?notification.kind,
            username = %notification.username,
            "Notification stored in memory outbox"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
