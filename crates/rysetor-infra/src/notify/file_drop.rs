//! File-drop mail backend: one plaintext file per message.
//!
//! Admin-bound mail goes to `<root>/inbox`, user-bound mail to
//! `<root>/outgoing`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::io::AsyncWriteExt;

use rysetor_core::domain::Notification;
use rysetor_core::ports::{Mailer, NotifyError};

pub struct FileDropMailer {
    root: PathBuf,
    sender: String,
}

impl FileDropMailer {
    pub fn new(root: impl Into<PathBuf>, sender: String) -> Self {
        Self {
            root: root.into(),
            sender,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn mailbox(&self, notification: &Notification) -> PathBuf {
        let dir = if notification.kind.is_admin_bound() {
            "inbox"
        } else {
            "outgoing"
        };
        self.root.join(dir)
    }

    fn render(&self, notification: &Notification) -> String {
        format!(
            "Subject: {}\nFrom: {}\nTo: {}\n\n{}",
            notification.subject,
            self.sender,
            notification.to.join(", "),
            notification.body
        )
    }
}

/// `<prefix>-<username>-<utc stamp>-<random>.txt`
fn file_name(notification: &Notification) -> String {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
    let suffix: u32 = rand::rng().random();

    format!(
        "{}-{}-{}-{:08x}.txt",
        notification.kind.file_prefix(),
        safe_component(&notification.username),
        stamp,
        suffix
    )
}

/// Reduce a username to characters that are safe in a file name.
fn safe_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl Mailer for FileDropMailer {
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let dir = self.mailbox(notification);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| NotifyError::Io(format!("{}: {e}", dir.display())))?;

        let path = dir.join(file_name(notification));
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| NotifyError::Io(format!("{}: {e}", path.display())))?;

        file.write_all(self.render(notification).as_bytes())
            .await
            .map_err(|e| NotifyError::Io(format!("{}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| NotifyError::Io(format!("{}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), "Notification written to drop directory");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rysetor_core::domain::User;

    fn user(name: &str) -> User {
        User::new(name.into(), "alice@x.com".into(), "hash".into(), "tok".into())
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn sanitises_usernames() {
        assert_eq!(safe_component("../../etc/passwd"), "______etc_passwd");
        assert_eq!(safe_component("alice"), "alice");
        assert_eq!(safe_component(""), "unknown");
    }

    #[tokio::test]
    async fn admin_mail_lands_in_inbox() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = FileDropMailer::new(dir.path(), "admin@x.com".into());
        let notice =
            Notification::new_registration(&user("alice"), "hi", &["admin@x.com".to_string()]);

        mailer.deliver(&notice).await.unwrap();

        let names = files_in(&dir.path().join("inbox"));
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("new-user-alice-"));

        let content = std::fs::read_to_string(dir.path().join("inbox").join(&names[0])).unwrap();
        assert!(content.starts_with("Subject: [RyseTor] New Registration\nFrom: admin@x.com\nTo: admin@x.com\n\n"));
        assert!(content.contains("alice@x.com"));
    }

    #[tokio::test]
    async fn repeated_messages_never_share_a_path() {
        let dir = tempfile::tempdir().unwrap();
        let mailer = FileDropMailer::new(dir.path(), "admin@x.com".into());
        let notice = Notification::registration(&user("alice"));

        mailer.deliver(&notice).await.unwrap();
        mailer.deliver(&notice).await.unwrap();

        let names = files_in(&dir.path().join("outgoing"));
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.starts_with("registration-alice-")));
    }
}
