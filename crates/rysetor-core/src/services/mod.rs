//! Workflows over the ports: registration, approval, sessions, the social
//! feed, videos and profiles.

mod approval;
mod feed;
mod profile;
mod registration;
mod session;
mod validation;
mod videos;

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::RepoError;
use crate::ports::UserRepository;

pub use approval::{ApprovalOutcome, ApprovalRequest, ApprovalService};
pub use feed::{FeedService, PostView};
pub use profile::{EditProfile, Profile, ProfileService};
pub use registration::{FollowUpReport, RegisterUser, Registration, RegistrationService};
pub use session::{LoginRequest, Session, SessionService};
pub use validation::is_valid_email;
pub use videos::{UploadVideo, VideoService, VideoView};

/// Look up usernames for a set of author IDs. Unknown IDs map to "[deleted]".
pub(crate) async fn author_names(
    users: &dyn UserRepository,
    ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, String>, RepoError> {
    let mut names = HashMap::new();
    for id in ids {
        if names.contains_key(&id) {
            continue;
        }
        let name = users
            .find_by_id(id)
            .await?
            .map(|u| u.username)
            .unwrap_or_else(|| "[deleted]".to_string());
        names.insert(id, name);
    }
    Ok(names)
}
