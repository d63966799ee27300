//! Domain entities - the core business objects.

mod admin;
mod media;
mod notification;
mod page;
mod post;
mod user;
mod video;

pub use admin::AdminRoster;
pub use media::{MediaKind, has_allowed_extension, sanitize_filename};
pub use notification::{Notification, NotificationKind};
pub use page::{Page, PageRequest};
pub use post::Post;
pub use user::{User, mask_email};
pub use video::Video;
