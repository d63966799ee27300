use std::sync::Arc;

use actix_web::body::{BodySize, MessageBody};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};
use tempfile::TempDir;

use rysetor_core::domain::AdminRoster;
use rysetor_core::ports::UserRepository;
use rysetor_core::services::{ApprovalRequest, LoginRequest, RegisterUser};
use rysetor_infra::{InMemoryMailer, LocalMediaStore, Sha256AdminKey};

use super::configure_routes;
use crate::config::AppConfig;
use crate::middleware::auth::SESSION_COOKIE;
use crate::state::{AppState, Repositories};

const ADMIN: &str = "root@rysetor.org";
const ADMIN_KEY: &str = "correct horse battery staple";
const BOUNDARY: &str = "rysetor-test-boundary";

macro_rules! init_app {
    ($state:expr) => {{
        let state: AppState = $state.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .app_data(web::Data::new(state.tokens.clone()))
                .configure(configure_routes),
        )
        .await
    }};
}

fn test_state(max_upload_bytes: usize) -> (AppState, Arc<InMemoryMailer>, TempDir) {
    let media = tempfile::tempdir().unwrap();
    let config = AppConfig {
        admins: AdminRoster::new([ADMIN]),
        admin_key: Sha256AdminKey::from_plaintext(ADMIN_KEY),
        upload_folder: media.path().to_path_buf(),
        max_upload_bytes,
        ..AppConfig::default()
    };
    let mailer = Arc::new(InMemoryMailer::new());
    let state = AppState::assemble(
        &config,
        Repositories::in_memory(),
        mailer.clone(),
        LocalMediaStore::new(media.path()),
    );
    (state, mailer, media)
}

fn registration(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "hunter22",
        "password2": "hunter22",
        "note_to_admin": "Met at the film club",
    })
}

async fn auth_token(state: &AppState, username: &str) -> String {
    state
        .users
        .find_by_username(username)
        .await
        .unwrap()
        .unwrap()
        .auth_token
}

/// Register, approve and log in `username` without going through HTTP.
async fn approved_session(state: &AppState, username: &str) -> String {
    state
        .registration
        .register(RegisterUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "hunter22".to_string(),
            password_confirm: "hunter22".to_string(),
            note_to_admin: "Please".to_string(),
        })
        .await
        .unwrap();
    state
        .approval
        .approve(ApprovalRequest {
            username: username.to_string(),
            admin: ADMIN.to_string(),
            admin_key: ADMIN_KEY.to_string(),
            message: "Welcome".to_string(),
        })
        .await
        .unwrap();

    let token = auth_token(state, username).await;
    state
        .sessions
        .login(LoginRequest {
            username: username.to_string(),
            password: "hunter22".to_string(),
            token,
            remember_me: false,
        })
        .await
        .unwrap()
        .token
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn video_form(title: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"title\"\r\n\r\n\
         {title}\r\n\
         --{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"description\"\r\n\r\n\
         Shot from the pier\r\n\
         --{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"upload\"; filename=\"{filename}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_type() -> (header::HeaderName, String) {
    (
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    )
}

#[actix_web::test]
async fn health_reports_in_memory_backend() {
    let (state, _mailer, _media) = test_state(1024);
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "in-memory");
    assert_eq!(body["notifications"]["failed"], 0);
}

#[actix_web::test]
async fn register_accepts_once_then_rejects_duplicates() {
    let (state, mailer, _media) = test_state(1024);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(registration("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["approved"], false);
    assert_eq!(mailer.messages_to(ADMIN).len(), 1);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(registration("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"email"));
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let (state, _mailer, _media) = test_state(1024);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/register")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"username\":")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_client_error());
}

#[actix_web::test]
async fn pending_account_cannot_log_in() {
    let (state, _mailer, _media) = test_state(1024);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(registration("bob"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let token = auth_token(&state, "bob").await;
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({"username": "bob", "password": "hunter22", "token": token}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn feed_requires_a_session() {
    let (state, _mailer, _media) = test_state(1024);
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/index")
        .insert_header(bearer("not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_approves_over_http_with_session_cookie() {
    let (state, mailer, _media) = test_state(1024);
    let app = init_app!(state);
    approved_session(&state, "boss").await;

    // Log the moderator in through the route to pick up the cookie.
    let token = auth_token(&state, "boss").await;
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({"username": "boss", "password": "hunter22", "token": token}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap()
        .into_owned();

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(registration("alice"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/send_token/alice")
        .cookie(cookie.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["approved"], false);

    let req = test::TestRequest::post()
        .uri("/send_token/alice")
        .cookie(cookie.clone())
        .set_json(json!({"admin": ADMIN, "admin_key": ADMIN_KEY, "message": "Welcome aboard"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["message"], "User approved for registration.");
    assert!(
        mailer
            .messages_to("alice@example.com")
            .iter()
            .any(|m| m.body.contains("Welcome aboard"))
    );

    // A second approval changes nothing.
    let req = test::TestRequest::post()
        .uri("/send_token/alice")
        .cookie(cookie)
        .set_json(json!({"admin": ADMIN, "admin_key": ADMIN_KEY, "message": "Again"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "already_approved");

    let token = auth_token(&state, "alice").await;
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({"username": "alice", "password": "hunter22", "token": token}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["token_type"], "Bearer");
}

#[actix_web::test]
async fn wrong_admin_key_is_forbidden() {
    let (state, _mailer, _media) = test_state(1024);
    let app = init_app!(state);
    let session = approved_session(&state, "boss").await;

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(registration("carol"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/send_token/carol")
        .insert_header(bearer(&session))
        .set_json(json!({"admin": ADMIN, "admin_key": "guess", "message": "hi"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let carol = state.users.find_by_username("carol").await.unwrap().unwrap();
    assert!(!carol.approved);
}

#[actix_web::test]
async fn posts_follow_and_profile() {
    let (state, _mailer, _media) = test_state(1024);
    let app = init_app!(state);
    let alice = approved_session(&state, "alice").await;
    let bob = approved_session(&state, "bob").await;

    let req = test::TestRequest::post()
        .uri("/")
        .insert_header(bearer(&bob))
        .set_json(json!({"post": "Bridge is closed"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/follow/bob")
        .insert_header(bearer(&alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "You are now following bob");

    let req = test::TestRequest::get()
        .uri("/index")
        .insert_header(bearer(&alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["author"], "bob");

    let req = test::TestRequest::get()
        .uri("/user/bob")
        .insert_header(bearer(&alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user"]["followers"], 1);
    assert_eq!(body["user"]["followed_by_you"], true);
    assert_eq!(body["posts"]["items"][0]["body"], "Bridge is closed");

    let req = test::TestRequest::post()
        .uri("/follow/alice")
        .insert_header(bearer(&alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/unfollow/bob")
        .insert_header(bearer(&alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "You are no longer following bob");
}

#[actix_web::test]
async fn edit_profile_saves_changes() {
    let (state, _mailer, _media) = test_state(1024);
    let app = init_app!(state);
    let alice = approved_session(&state, "alice").await;

    let req = test::TestRequest::post()
        .uri("/edit_profile")
        .insert_header(bearer(&alice))
        .set_json(json!({"username": "alice", "about_me": "Night shift"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["about_me"], "Night shift");
}

#[actix_web::test]
async fn video_upload_watch_and_delete() {
    let (state, _mailer, _media) = test_state(1024);
    let app = init_app!(state);
    let alice = approved_session(&state, "alice").await;
    let bob = approved_session(&state, "bob").await;

    let req = test::TestRequest::post()
        .uri("/eyewitness")
        .insert_header(bearer(&alice))
        .insert_header(multipart_type())
        .set_payload(video_form("Sunset", "sunset.mp4", b"fake mp4 bytes"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Sunset");
    assert_eq!(body["description"], "Shot from the pier");

    let req = test::TestRequest::get()
        .uri("/watch/Sunset")
        .insert_header(bearer(&bob))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "video/mp4"
    );
    assert_eq!(resp.headers().get("x-video-views").unwrap(), "1");
    assert_eq!(resp.response().body().size(), BodySize::Sized(14));
    assert_eq!(&test::read_body(resp).await[..], b"fake mp4 bytes");

    let req = test::TestRequest::delete()
        .uri("/delete_video/Sunset")
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri("/delete_video/Sunset")
        .insert_header(bearer(&alice))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "Video successfully deleted");

    let req = test::TestRequest::get()
        .uri("/watch/Sunset")
        .insert_header(bearer(&alice))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn rejects_disallowed_extension_and_oversized_upload() {
    let (state, _mailer, _media) = test_state(64);
    let app = init_app!(state);
    let alice = approved_session(&state, "alice").await;

    let req = test::TestRequest::post()
        .uri("/eyewitness")
        .insert_header(bearer(&alice))
        .insert_header(multipart_type())
        .set_payload(video_form("Script", "payload.exe", b"MZ"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::post()
        .uri("/eyewitness")
        .insert_header(bearer(&alice))
        .insert_header(multipart_type())
        .set_payload(video_form("Long", "long.mp4", &[0u8; 256]))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn logout_clears_the_cookie() {
    let (state, _mailer, _media) = test_state(1024);
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/logout").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .unwrap();
    assert_eq!(cookie.value(), "");
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn repeated_login_attempts_are_throttled() {
    use rysetor_infra::{GovernorThrottle, ThrottleConfig};

    let (mut state, _mailer, _media) = test_state(1024);
    state.throttle = Arc::new(GovernorThrottle::new(&ThrottleConfig {
        attempts: 2,
        window: std::time::Duration::from_secs(60),
    }));
    let app = init_app!(state);

    let attempt = |ip: &str| {
        test::TestRequest::post()
            .uri("/login")
            .peer_addr(format!("{ip}:4000").parse().unwrap())
            .set_json(json!({"username": "mallory", "password": "guess", "token": "guess"}))
            .to_request()
    };

    for _ in 0..2 {
        let resp = test::call_service(&app, attempt("10.0.0.9")).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    let resp = test::call_service(&app, attempt("10.0.0.9")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));

    let resp = test::call_service(&app, attempt("10.0.0.10")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[cfg(feature = "rate-limit")]
#[actix_web::test]
async fn forwarded_for_headers_do_not_reset_the_budget() {
    use rysetor_infra::{GovernorThrottle, ThrottleConfig};

    let (mut state, _mailer, _media) = test_state(1024);
    state.throttle = Arc::new(GovernorThrottle::new(&ThrottleConfig {
        attempts: 2,
        window: std::time::Duration::from_secs(60),
    }));
    let app = init_app!(state);

    let mut statuses = Vec::new();
    for i in 0..3 {
        let req = test::TestRequest::post()
            .uri("/login")
            .peer_addr(format!("10.0.0.9:{}", 4000 + i).parse().unwrap())
            .insert_header(("X-Forwarded-For", format!("203.0.113.{i}")))
            .insert_header(("Forwarded", format!("for=198.51.100.{i}")))
            .set_json(json!({"username": "mallory", "password": "guess", "token": "guess"}))
            .to_request();
        statuses.push(test::call_service(&app, req).await.status());
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );
}
