use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use super::{build_router, create_session_store, AppState};
use crate::config::AppConfig;
use crate::mail::ConsoleEmailService;
use crate::managers::{create_shared_account_manager, create_shared_study_manager};
use crate::state::{create_shared_store, Store};

struct TestApp {
    router: Router,
    state: AppState,
    mailer: Arc<ConsoleEmailService>,
}

impl TestApp {
    fn new() -> Self {
        let config = Arc::new(AppConfig::for_tests());
        let store = create_shared_store(Store::in_memory());
        let mailer = Arc::new(ConsoleEmailService::new());

        let state = AppState {
            accounts: create_shared_account_manager(
                store.clone(),
                mailer.clone(),
                config.host.clone(),
            ),
            studies: create_shared_study_manager(store),
            sessions: create_session_store(config.session_ttl_secs),
            config,
        };

        Self {
            router: build_router(state.clone()),
            state,
            mailer,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn post_json(&self, uri: &str, body: &str, cookie: &str) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, cookie)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Sign up `studyolle` / `a@a.com` and return the session cookie
    async fn sign_up(&self) -> String {
        let response = self
            .post_form(
                "/sign-up",
                "nickname=studyolle&email=a%40a.com&password=12345678",
                None,
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/"));
        session_cookie(&response).expect("sign-up logs the account in")
    }

    async fn stored_token(&self) -> String {
        self.state
            .accounts
            .find_by_nickname("studyolle")
            .await
            .unwrap()
            .email_check_token
            .unwrap()
    }

    async fn age_token(&self) {
        let account = self.state.accounts.find_by_nickname("studyolle").await.unwrap();
        self.state
            .accounts
            .store()
            .transaction(|db| {
                db.find_account_mut(account.id)?.email_check_token_generated_at =
                    Some(Utc::now() - Duration::hours(2));
                Ok(())
            })
            .await
            .unwrap();
    }
}

/// `session=<token>` from a Set-Cookie header, ignoring logout cookies
fn session_cookie(response: &Response<Body>) -> Option<String> {
    let value = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let pair = value.split(';').next()?.trim();
    match pair.strip_prefix("session=") {
        Some(token) if !token.is_empty() => Some(pair.to_string()),
        _ => None,
    }
}

fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn entry(key: &str, value: &str) -> String {
    format!("<dt>{}</dt><dd>{}</dd>", key, value)
}

#[tokio::test]
async fn test_sign_up_then_verify_email() {
    let app = TestApp::new();
    app.sign_up().await;

    let account = app.state.accounts.find_by_nickname("studyolle").await.unwrap();
    assert!(!account.email_verified);
    assert!(app.mailer.last_sent_to("a@a.com").is_some());

    let token = app.stored_token().await;
    let response = app
        .get(
            &format!("/check-email-token?token={}&email=a%40a.com", token),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("verification logs the account in");
    let body = body_string(response).await;
    assert!(body.contains(r#"data-view="account/checked-email""#));
    assert!(body.contains(&entry("numberOfUser", "1")));
    assert!(body.contains(&entry("nickname", "studyolle")));
    assert!(!body.contains("<dt>error</dt>"));

    let account = app.state.accounts.find_by_nickname("studyolle").await.unwrap();
    assert!(account.email_verified);
    assert!(account.joined_at.is_some());

    // The new session carries the verified principal
    let body = body_string(app.get("/", Some(&cookie)).await).await;
    assert!(body.contains(&entry("account", "studyolle")));
    assert!(body.contains(&entry("emailVerified", "true")));
}

#[tokio::test]
async fn test_verification_refreshes_other_sessions() {
    let app = TestApp::new();
    let sign_up_cookie = app.sign_up().await;

    // Link opened in another browser, without the sign-up session
    let token = app.stored_token().await;
    let response = app
        .get(
            &format!("/check-email-token?token={}&email=a%40a.com", token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(app.get("/", Some(&sign_up_cookie)).await).await;
    assert!(body.contains(&entry("account", "studyolle")));
    assert!(body.contains(&entry("emailVerified", "true")));
}

#[tokio::test]
async fn test_verify_with_wrong_token() {
    let app = TestApp::new();
    app.sign_up().await;

    let response = app
        .get("/check-email-token?token=wrong&email=a%40a.com", None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = body_string(response).await;
    assert!(body.contains(&entry("error", "wrong.token")));

    let account = app.state.accounts.find_by_nickname("studyolle").await.unwrap();
    assert!(!account.email_verified);
}

#[tokio::test]
async fn test_verify_with_unknown_email() {
    let app = TestApp::new();

    let response = app
        .get("/check-email-token?token=whatever&email=nobody%40a.com", None)
        .await;

    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_string(response)
        .await
        .contains(&entry("error", "wrong.email")));
}

#[tokio::test]
async fn test_sign_up_with_invalid_input() {
    let app = TestApp::new();

    let response = app
        .post_form("/sign-up", "nickname=st&email=not-an-email&password=123", None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = body_string(response).await;
    assert!(body.contains(r#"<li data-field="email">email</li>"#));
    assert!(body.contains(r#"<li data-field="nickname">pattern</li>"#));
    assert!(body.contains(r#"<li data-field="password">length</li>"#));
    assert_eq!(app.state.accounts.account_count().await, 0);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_duplicate_sign_up_is_rejected() {
    let app = TestApp::new();
    app.sign_up().await;

    let response = app
        .post_form(
            "/sign-up",
            "nickname=studyolle&email=b%40b.com&password=12345678",
            None,
        )
        .await;

    let body = body_string(response).await;
    assert!(body.contains(r#"<li data-field="nickname">invalid.nickname</li>"#));
    assert_eq!(app.state.accounts.account_count().await, 1);
}

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let app = TestApp::new();

    for uri in ["/check-email", "/settings/profile", "/settings/tags", "/new-study"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location(&response), Some("/login"), "{}", uri);
    }

    let response = app.get("/settings/profile", Some("session=bogus")).await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_password_login_and_logout() {
    let app = TestApp::new();
    app.sign_up().await;

    let response = app
        .post_form("/login", "username=studyolle&password=nope-nope", None)
        .await;
    assert_eq!(location(&response), Some("/login?error"));

    let body = body_string(app.get("/login?error", None).await).await;
    assert!(body.contains(&entry("error", "login.failed")));

    let response = app
        .post_form("/login", "username=a%40a.com&password=12345678", None)
        .await;
    assert_eq!(location(&response), Some("/"));
    let cookie = session_cookie(&response).unwrap();

    assert_eq!(
        app.get("/settings/password", Some(&cookie)).await.status(),
        StatusCode::OK
    );

    let response = app.post_form("/logout", "", Some(&cookie)).await;
    assert_eq!(location(&response), Some("/"));
    assert!(session_cookie(&response).is_none());

    let response = app.get("/settings/password", Some(&cookie)).await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_resend_confirm_email_cooldown() {
    let app = TestApp::new();
    let cookie = app.sign_up().await;

    let body = body_string(app.get("/resend-confirm-email", Some(&cookie)).await).await;
    assert!(body.contains(&entry("error", "email.too.soon")));
    assert_eq!(app.mailer.sent().len(), 1);

    app.age_token().await;
    let response = app.get("/resend-confirm-email", Some(&cookie)).await;
    assert_eq!(location(&response), Some("/"));
    assert_eq!(app.mailer.sent().len(), 2);
}

#[tokio::test]
async fn test_login_by_email_link() {
    let app = TestApp::new();
    app.sign_up().await;

    let body = body_string(app.post_form("/email-login", "email=nobody%40a.com", None).await).await;
    assert!(body.contains(&entry("error", "wrong.email")));

    let body = body_string(app.post_form("/email-login", "email=a%40a.com", None).await).await;
    assert!(body.contains(&entry("error", "email.too.soon")));

    app.age_token().await;
    let body = body_string(app.post_form("/email-login", "email=a%40a.com", None).await).await;
    assert!(body.contains(&entry("message", "email.sent")));

    let response = app
        .get("/login-by-email?token=wrong&email=a%40a.com", None)
        .await;
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(body_string(response)
        .await
        .contains(&entry("error", "login.failed")));

    let token = app.stored_token().await;
    let response = app
        .get(&format!("/login-by-email?token={}&email=a%40a.com", token), None)
        .await;
    let cookie = session_cookie(&response).expect("email link logs in");

    // Logging in by link does not verify the address
    let body = body_string(app.get("/", Some(&cookie)).await).await;
    assert!(body.contains(&entry("emailVerified", "false")));
}

#[tokio::test]
async fn test_profile_view() {
    let app = TestApp::new();
    let cookie = app.sign_up().await;

    let response = app.get("/profile/nobody", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains(r#"data-view="error""#));

    let body = body_string(app.get("/profile/studyolle", None).await).await;
    assert!(body.contains(&entry("isOwner", "false")));
    assert!(!body.contains("<dt>email</dt>"));

    let body = body_string(app.get("/profile/studyolle", Some(&cookie)).await).await;
    assert!(body.contains(&entry("isOwner", "true")));
    assert!(body.contains(&entry("email", "a@a.com")));
}

#[tokio::test]
async fn test_profile_update_flashes_once() {
    let app = TestApp::new();
    let cookie = app.sign_up().await;

    let response = app
        .post_form("/settings/profile", &format!("bio={}", "b".repeat(36)), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response)
        .await
        .contains(r#"<li data-field="bio">length</li>"#));

    let response = app
        .post_form("/settings/profile", "bio=hello&url=&occupation=dev", Some(&cookie))
        .await;
    assert_eq!(location(&response), Some("/settings/profile"));

    let body = body_string(app.get("/settings/profile", Some(&cookie)).await).await;
    assert!(body.contains(r#"<div class="flash">profile.updated</div>"#));
    assert!(body.contains(&entry("bio", "hello")));
    assert!(body.contains(&entry("occupation", "dev")));
    assert!(!body.contains("<dt>url</dt>"));

    let body = body_string(app.get("/settings/profile", Some(&cookie)).await).await;
    assert!(!body.contains("class=\"flash\""));
}

#[tokio::test]
async fn test_password_change() {
    let app = TestApp::new();
    let cookie = app.sign_up().await;

    let response = app
        .post_form(
            "/settings/password",
            "newPassword=abcdefgh&newPasswordConfirm=abcdefgx",
            Some(&cookie),
        )
        .await;
    assert!(body_string(response)
        .await
        .contains(r#"<li data-field="newPassword">wrong.value</li>"#));

    let response = app
        .post_form(
            "/settings/password",
            "newPassword=abcdefgh&newPasswordConfirm=abcdefgh",
            Some(&cookie),
        )
        .await;
    assert_eq!(location(&response), Some("/settings/password"));

    let response = app
        .post_form("/login", "username=studyolle&password=abcdefgh", None)
        .await;
    assert_eq!(location(&response), Some("/"));
}

#[tokio::test]
async fn test_notifications_update() {
    let app = TestApp::new();
    let cookie = app.sign_up().await;

    let response = app
        .post_form(
            "/settings/notifications",
            "studyCreatedByEmail=true&studyUpdatedByWeb=true",
            Some(&cookie),
        )
        .await;
    assert_eq!(location(&response), Some("/settings/notifications"));

    let body = body_string(app.get("/settings/notifications", Some(&cookie)).await).await;
    assert!(body.contains(&entry("studyCreatedByEmail", "true")));
    assert!(body.contains(&entry("studyCreatedByWeb", "false")));
    assert!(body.contains(&entry("studyUpdatedByWeb", "true")));
}

#[tokio::test]
async fn test_notifications_accept_browser_checkbox_values() {
    let app = TestApp::new();
    let cookie = app.sign_up().await;

    let response = app
        .post_form(
            "/settings/notifications",
            "studyCreatedByEmail=on&studyEnrollmentResultByWeb=on",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/settings/notifications"));

    let body = body_string(app.get("/settings/notifications", Some(&cookie)).await).await;
    assert!(body.contains(&entry("studyCreatedByEmail", "true")));
    assert!(body.contains(&entry("studyEnrollmentResultByWeb", "true")));
    // Unchecked boxes are absent from the form
    assert!(body.contains(&entry("studyUpdatedByWeb", "false")));
}

#[tokio::test]
async fn test_nickname_change_refreshes_session() {
    let app = TestApp::new();
    let cookie = app.sign_up().await;

    let body = body_string(
        app.post_form("/settings/account", "nickname=No+Spaces", Some(&cookie))
            .await,
    )
    .await;
    assert!(body.contains(r#"<li data-field="nickname">pattern</li>"#));

    let response = app
        .post_form("/settings/account", "nickname=renamed", Some(&cookie))
        .await;
    assert_eq!(location(&response), Some("/settings/account"));

    let body = body_string(app.get("/", Some(&cookie)).await).await;
    assert!(body.contains(&entry("account", "renamed")));
    assert_eq!(
        app.get("/profile/renamed", None).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_tag_endpoints() {
    let app = TestApp::new();
    let cookie = app.sign_up().await;

    let response = app
        .post_json("/settings/tags/add", r#"{"tagTitle":"spring"}"#, &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post_json("/settings/tags/remove", r#"{"tagTitle":"unknown"}"#, &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_string(app.get("/settings/tags", Some(&cookie)).await).await;
    assert!(body.contains(&entry("tags", "[&quot;spring&quot;]")));

    let response = app
        .post_json("/settings/tags/remove", r#"{"tagTitle":"spring"}"#, &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(app
        .state
        .accounts
        .get_tags(1)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_zone_endpoints() {
    let app = TestApp::new();
    let cookie = app.sign_up().await;
    app.state
        .accounts
        .store()
        .transaction(|db| {
            db.insert_zone("Seoul", "서울특별시", "none");
            Ok(())
        })
        .await
        .unwrap();

    let response = app
        .post_json("/settings/zones/add", r#"{"zoneName":"Busan(부산광역시)/none"}"#, &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_json("/settings/zones/add", r#"{"zoneName":"Seoul(서울특별시)/none"}"#, &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(app.get("/settings/zones", Some(&cookie)).await).await;
    assert!(body.contains("Seoul(서울특별시)/none"));

    let response = app
        .post_json(
            "/settings/zones/remove",
            r#"{"cityName":"Seoul","provinceName":"none"}"#,
            &cookie,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_and_view_study() {
    let app = TestApp::new();
    let cookie = app.sign_up().await;

    let body = body_string(
        app.post_form(
            "/new-study",
            "path=Bad+Path&title=Rust&shortDescription=Weekly&fullDescription=Book",
            Some(&cookie),
        )
        .await,
    )
    .await;
    assert!(body.contains(r#"<li data-field="path">pattern</li>"#));

    let response = app
        .post_form(
            "/new-study",
            "path=rust-study&title=Rust&shortDescription=Weekly&fullDescription=Book",
            Some(&cookie),
        )
        .await;
    assert_eq!(location(&response), Some("/study/rust-study"));

    let body = body_string(app.get("/study/rust-study", Some(&cookie)).await).await;
    assert!(body.contains(&entry("title", "Rust")));
    assert!(body.contains(&entry("isManager", "true")));
    assert!(body.contains(&entry("managers", "[&quot;studyolle&quot;]")));

    let response = app.get("/study/nope", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
