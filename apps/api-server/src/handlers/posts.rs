//! Status posts and the followed-posts feed.

use actix_web::{HttpResponse, web};

use rysetor_core::services::PostView;
use rysetor_shared::dto::{CreatePostRequest, PageQuery};

use super::views;
use crate::middleware::auth::CurrentUser;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET / and /index
pub async fn feed(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = state.feed.feed(&me, query.page.unwrap_or(1)).await?;

    Ok(HttpResponse::Ok().json(views::page(page, views::post)))
}

/// POST / and /index
pub async fn create_post(
    state: web::Data<AppState>,
    CurrentUser(me): CurrentUser,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let post = state.feed.create_post(&me, &body.post).await?;

    Ok(HttpResponse::Created().json(views::post(PostView {
        post,
        author: me.username,
    })))
}
