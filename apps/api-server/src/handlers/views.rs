//! Domain-to-DTO conversions.

use rysetor_core::domain::Page;
use rysetor_core::services::{PostView, Profile, VideoView};
use rysetor_shared::dto::{PageResponse, PostResponse, UserResponse, VideoResponse};

pub fn page<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PageResponse<U> {
    let has_next = page.has_next();
    let has_prev = page.has_prev();
    let next_page = page.next_page();
    let prev_page = page.prev_page();
    let page = page.map(f);

    PageResponse {
        items: page.items,
        page: page.page,
        per_page: page.per_page,
        total: page.total,
        has_next,
        has_prev,
        next_page,
        prev_page,
    }
}

pub fn post(view: PostView) -> PostResponse {
    PostResponse {
        id: view.post.id.to_string(),
        author: view.author,
        body: view.post.body,
        timestamp: view.post.created_at.to_rfc3339(),
    }
}

pub fn video(view: VideoView) -> VideoResponse {
    VideoResponse {
        id: view.video.id.to_string(),
        author: view.author,
        title: view.video.title,
        description: view.video.description,
        views: view.video.views,
        timestamp: view.video.created_at.to_rfc3339(),
    }
}

pub fn profile(profile: Profile) -> UserResponse {
    UserResponse {
        username: profile.user.username,
        about_me: profile.user.about_me,
        last_seen: profile.user.last_seen.map(|t| t.to_rfc3339()),
        has_avatar: profile.user.avatar.is_some(),
        approved: profile.user.approved,
        followers: profile.followers,
        following: profile.following,
        followed_by_you: profile.followed_by_viewer,
    }
}
