//! Video feed, upload, playback and deletion.

use actix_multipart::Multipart;
use actix_web::body::SizedStream;
use actix_web::{HttpResponse, web};
use futures::TryStreamExt;

use rysetor_core::services::{UploadVideo, VideoView};
use rysetor_shared::dto::{MessageResponse, PageQuery};

use super::upload::read_form;
use super::views;
use crate::middleware::auth::CurrentUser;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /eyewitness
pub async fn feed(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.videos.feed(&me, query.page.unwrap_or(1)).await?;

    Ok(HttpResponse::Ok().json(views::page(page, views::video)))
}

/// POST /eyewitness (multipart: title, description, upload)
pub async fn upload(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let form = read_form(payload, "upload", state.max_upload_bytes).await?;
    let title = form.text("title").unwrap_or_default();
    let description = form.text("description");
    let (filename, bytes) = form
        .file
        .map(|f| (f.filename, f.bytes))
        .unwrap_or_default();

    let video = state
        .videos
        .upload(
            &me,
            UploadVideo {
                title,
                description,
                filename,
                bytes,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(views::video(VideoView {
        video,
        author: me.username,
    })))
}

/// GET /user/{username}/videos
pub async fn user_videos(
    state: web::Data<AppState>,
    _me: CurrentUser,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let (_, page) = state
        .videos
        .by_user(&path.into_inner(), query.page.unwrap_or(1))
        .await?;

    Ok(HttpResponse::Ok().json(views::page(page, views::video)))
}

/// GET /watch/{title}
pub async fn watch(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let (video, file) = state.videos.watch(&me, &path.into_inner()).await?;
    let content_type = mime_guess::from_path(&video.filename).first_or_octet_stream();
    let body = SizedStream::new(file.len, file.chunks.map_ok(web::Bytes::from));

    Ok(HttpResponse::Ok()
        .content_type(content_type.essence_str())
        .insert_header(("X-Video-Views", video.views.to_string()))
        .body(body))
}

/// DELETE /delete_video/{title}
pub async fn delete(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.videos.delete(&me, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Video successfully deleted")))
}
