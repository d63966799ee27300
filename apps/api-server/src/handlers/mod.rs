//! HTTP handlers and route configuration.

mod approval;
mod auth;
mod health;
mod posts;
mod upload;
mod users;
mod videos;
mod views;

#[cfg(test)]
mod tests;

use actix_web::web;

#[cfg(feature = "rate-limit")]
use actix_web::middleware::from_fn;

#[cfg(feature = "rate-limit")]
use crate::middleware::throttle::throttle_attempts;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    let login = web::resource("/login").route(web::post().to(auth::login));
    let send_token = web::resource("/send_token/{username}")
        .route(web::get().to(approval::pending_user))
        .route(web::post().to(approval::approve));

    // Credential and admin-key guessing is throttled per client.
    #[cfg(feature = "rate-limit")]
    let login = login.wrap(from_fn(throttle_attempts));
    #[cfg(feature = "rate-limit")]
    let send_token = send_token.wrap(from_fn(throttle_attempts));

    cfg.route("/api/health", web::get().to(health::health_check))
        .route("/register", web::post().to(auth::register))
        .service(login)
        .route("/logout", web::get().to(auth::logout))
        .service(send_token)
        .service(
            web::resource(["/", "/index"])
                .route(web::get().to(posts::feed))
                .route(web::post().to(posts::create_post)),
        )
        .route("/user/{username}", web::get().to(users::user_page))
        .route("/user/{username}/videos", web::get().to(videos::user_videos))
        .route("/user/{username}/avatar", web::get().to(users::avatar))
        .route("/edit_profile", web::post().to(users::edit_profile))
        .route("/follow/{username}", web::post().to(users::follow))
        .route("/unfollow/{username}", web::post().to(users::unfollow))
        .service(
            web::resource("/eyewitness")
                .route(web::get().to(videos::feed))
                .route(web::post().to(videos::upload)),
        )
        .route("/watch/{title}", web::get().to(videos::watch))
        .route("/delete_video/{title}", web::delete().to(videos::delete))
        .route("/upload/avatar", web::post().to(users::upload_avatar));
}
