//! Notification delivery: mail backends and the queued dispatcher.

mod dispatcher;
mod file_drop;
mod memory;
mod webhook;

pub use dispatcher::{DispatcherConfig, QueuedDispatcher};
pub use file_drop::FileDropMailer;
pub use memory::InMemoryMailer;
pub use webhook::WebhookMailer;
