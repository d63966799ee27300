//! Registration, login and logout.

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{HttpResponse, web};

use rysetor_core::services::{LoginRequest, RegisterUser};
use rysetor_shared::ApiResponse;
use rysetor_shared::dto::{
    AuthResponse, LoginRequest as LoginBody, MessageResponse, RegisterRequest,
    RegistrationResponse,
};

use crate::middleware::auth::SESSION_COOKIE;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let registration = state
        .registration
        .register(RegisterUser {
            username: req.username,
            email: req.email,
            password: req.password,
            password_confirm: req.password2,
            note_to_admin: req.note_to_admin,
        })
        .await?;

    let response = RegistrationResponse {
        username: registration.user.username,
        approved: registration.user.approved,
        message: "Success. Check your email for further instructions.".to_string(),
    };

    Ok(HttpResponse::Created().json(ApiResponse::ok(response)))
}

/// POST /login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginBody>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let session = state
        .sessions
        .login(LoginRequest {
            username: req.username,
            password: req.password,
            token: req.token,
            remember_me: req.remember_me,
        })
        .await?;

    let mut cookie = Cookie::build(SESSION_COOKIE, session.token.clone())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();
    if session.remember_me {
        cookie.set_max_age(CookieDuration::seconds(session.expires_in));
    }

    Ok(HttpResponse::Ok().cookie(cookie).json(AuthResponse {
        access_token: session.token,
        token_type: "Bearer".to_string(),
        expires_in: session.expires_in.max(0) as u64,
        username: session.user.username,
    }))
}

/// GET /logout
pub async fn logout() -> HttpResponse {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(MessageResponse::new("You are no longer logged in."))
}
