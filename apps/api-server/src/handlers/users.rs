//! Profiles, follows and avatars.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};

use rysetor_core::services::EditProfile;
use rysetor_shared::dto::{EditProfileRequest, MessageResponse, PageQuery, UserPageResponse};

use super::upload::read_form;
use super::views;
use crate::middleware::auth::CurrentUser;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /user/{username}
pub async fn user_page(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();

    let profile = state.profiles.profile(&username, me.id).await?;
    let (_, posts) = state
        .feed
        .user_posts(&username, query.page.unwrap_or(1))
        .await?;

    Ok(HttpResponse::Ok().json(UserPageResponse {
        user: views::profile(profile),
        posts: views::page(posts, views::post),
    }))
}

/// POST /edit_profile
pub async fn edit_profile(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    body: web::Json<EditProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .profiles
        .edit(
            me,
            EditProfile {
                username: req.username,
                about_me: req.about_me,
            },
        )
        .await?;

    let profile = state.profiles.profile(&user.username, user.id).await?;
    Ok(HttpResponse::Ok().json(views::profile(profile)))
}

/// POST /follow/{username}
pub async fn follow(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let target = state.feed.follow(&me, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(format!(
        "You are now following {}",
        target.username
    ))))
}

/// POST /unfollow/{username}
pub async fn unfollow(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let target = state.feed.unfollow(&me, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new(format!(
        "You are no longer following {}",
        target.username
    ))))
}

/// GET /user/{username}/avatar
pub async fn avatar(
    state: web::Data<AppState>,
    _me: CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (filename, bytes) = state.profiles.avatar(&path.into_inner()).await?;
    let content_type = mime_guess::from_path(&filename).first_or_octet_stream();

    Ok(HttpResponse::Ok()
        .content_type(content_type.essence_str())
        .body(bytes))
}

/// POST /upload/avatar (multipart: upload)
pub async fn upload_avatar(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let form = read_form(payload, "upload", state.max_upload_bytes).await?;
    let (filename, bytes) = form
        .file
        .map(|f| (f.filename, f.bytes))
        .unwrap_or_default();

    state.profiles.upload_avatar(me, &filename, &bytes).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Avatar successfully uploaded.")))
}
