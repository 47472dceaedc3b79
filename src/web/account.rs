//! Home page, login/logout, sign-up and email-token handlers

use axum::{
    extract::{Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use std::collections::HashMap;
use tracing::info;

use super::auth::{create_logout_cookie, get_session_token, log_in, CurrentAccount, MaybeAccount};
use super::server::AppState;
use super::views::View;
use crate::error::Result;
use crate::forms::{EmailLoginForm, LoginForm, SignUpForm, TokenParams, Validated};
use crate::managers::{EmailCheck, TokenEmail};

/// GET /
pub async fn index(State(state): State<AppState>, MaybeAccount(current): MaybeAccount) -> View {
    match current {
        Some(current) => View::new("index")
            .with("account", &current.principal.nickname)
            .with("emailVerified", current.principal.email_verified)
            .flash(state.sessions.take_flash(&current.token)),
        None => View::new("index"),
    }
}

/// GET /login
pub async fn login_form(Query(params): Query<HashMap<String, String>>) -> View {
    let view = View::new("login");
    if params.contains_key("error") {
        view.with("error", "login.failed")
    } else {
        view
    }
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.accounts.authenticate(&form.username, &form.password).await {
        Some(account) => (
            log_in(&state.sessions, &headers, &account),
            Redirect::to("/"),
        )
            .into_response(),
        None => Redirect::to("/login?error").into_response(),
    }
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = get_session_token(&headers) {
        state.sessions.remove_session(&token);
    }

    ([(SET_COOKIE, create_logout_cookie())], Redirect::to("/"))
}

/// GET /sign-up
pub async fn sign_up_form() -> View {
    View::new("account/sign-up")
}

/// POST /sign-up - create the account and log it in
pub async fn sign_up(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SignUpForm>,
) -> Result<Response> {
    match state.accounts.process_new_account(&form).await? {
        Validated::Valid(account) => Ok((
            log_in(&state.sessions, &headers, &account),
            Redirect::to("/"),
        )
            .into_response()),
        Validated::Invalid(errors) => Ok(View::new("account/sign-up")
            .with("nickname", &form.nickname)
            .with("email", &form.email)
            .errors(errors)
            .into_response()),
    }
}

/// GET /check-email-token?token=..&email=..
pub async fn check_email_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TokenParams>,
) -> Result<Response> {
    let view = View::new("account/checked-email");

    let response = match state
        .accounts
        .complete_sign_up(&params.email, &params.token)
        .await?
    {
        EmailCheck::WrongEmail => view.with("error", "wrong.email").into_response(),
        EmailCheck::WrongToken => view.with("error", "wrong.token").into_response(),
        EmailCheck::Verified {
            account,
            number_of_user,
        } => {
            // Sessions opened elsewhere still carry the unverified principal
            state.sessions.refresh_principal(&account);
            (
                log_in(&state.sessions, &headers, &account),
                view.with("numberOfUser", number_of_user)
                    .with("nickname", &account.nickname),
            )
                .into_response()
        }
    };

    Ok(response)
}

/// GET /check-email
pub async fn check_email(current: CurrentAccount) -> View {
    View::new("account/check-email").with("email", &current.principal.email)
}

/// GET /resend-confirm-email
pub async fn resend_confirm_email(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> Result<Response> {
    match state.accounts.resend_confirm_email(current.principal.id).await? {
        TokenEmail::Sent(_) => Ok(Redirect::to("/").into_response()),
        TokenEmail::TooSoon | TokenEmail::UnknownEmail => Ok(View::new("account/check-email")
            .with("error", "email.too.soon")
            .with("email", &current.principal.email)
            .into_response()),
    }
}

/// GET /email-login
pub async fn email_login_form() -> View {
    View::new("account/email-login")
}

/// POST /email-login
pub async fn send_email_login_link(
    State(state): State<AppState>,
    Form(form): Form<EmailLoginForm>,
) -> Result<View> {
    let view = View::new("account/email-login");

    Ok(match state.accounts.send_login_link(&form.email).await? {
        TokenEmail::Sent(_) => view.with("message", "email.sent"),
        TokenEmail::UnknownEmail => view.with("error", "wrong.email"),
        TokenEmail::TooSoon => view.with("error", "email.too.soon"),
    })
}

/// GET /login-by-email?token=..&email=..
pub async fn login_by_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TokenParams>,
) -> Response {
    let view = View::new("account/logged-in-by-email");

    match state
        .accounts
        .login_by_email(&params.email, &params.token)
        .await
    {
        Some(account) => {
            info!("Account {} logged in by email link", account.nickname);
            (log_in(&state.sessions, &headers, &account), view).into_response()
        }
        None => view.with("error", "login.failed").into_response(),
    }
}

/// GET /profile/:nickname
pub async fn view_profile(
    State(state): State<AppState>,
    MaybeAccount(current): MaybeAccount,
    Path(nickname): Path<String>,
) -> Result<View> {
    let account = state.accounts.find_by_nickname(&nickname).await?;
    let is_owner = current
        .as_ref()
        .is_some_and(|c| c.principal.id == account.id);

    let mut view = View::new("account/profile")
        .with("nickname", &account.nickname)
        .with("isOwner", is_owner)
        .with("emailVerified", account.email_verified)
        .with_opt("bio", account.bio.as_ref())
        .with_opt("url", account.url.as_ref())
        .with_opt("occupation", account.occupation.as_ref())
        .with_opt("location", account.location.as_ref())
        .with_opt("profileImage", account.profile_image.as_ref())
        .with_opt(
            "joinedAt",
            account.joined_at.map(|t| t.format("%Y-%m-%d").to_string()),
        );

    if is_owner {
        view = view.with("email", &account.email);
    }

    Ok(view)
}
