//! Account settings pages and the JSON tag/zone endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::Serialize;

use super::auth::CurrentAccount;
use super::server::AppState;
use super::views::View;
use crate::error::Result;
use crate::forms::{
    NicknameForm, NotificationsForm, PasswordForm, ProfileForm, TagForm, Validated, ZoneForm,
};

/// Copy every non-null field of `fields` into the view model
fn with_fields(mut view: View, fields: &impl Serialize) -> Result<View> {
    if let serde_json::Value::Object(map) = serde_json::to_value(fields)? {
        for (key, value) in map {
            view = match value {
                serde_json::Value::Null => view,
                serde_json::Value::String(s) => view.with(&key, s),
                other => view.with(&key, other),
            };
        }
    }
    Ok(view)
}

/// Flash the message and go back to the settings page
fn saved(state: &AppState, current: &CurrentAccount, message: &str, to: &str) -> Response {
    state.sessions.set_flash(&current.token, message);
    Redirect::to(to).into_response()
}

/// GET /settings/profile
pub async fn profile_form(State(state): State<AppState>, current: CurrentAccount) -> Result<View> {
    let account = state.accounts.find_by_id(current.principal.id).await?;
    let view = View::new("settings/profile")
        .with("nickname", &account.nickname)
        .flash(state.sessions.take_flash(&current.token));
    with_fields(view, &ProfileForm::from_account(&account))
}

/// POST /settings/profile
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentAccount,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    let errors = form.validate();
    if errors.has_errors() {
        let view = View::new("settings/profile")
            .with("nickname", &current.principal.nickname)
            .errors(errors);
        return Ok(with_fields(view, &form)?.into_response());
    }

    state.accounts.update_profile(current.principal.id, &form).await?;
    Ok(saved(&state, &current, "profile.updated", "/settings/profile"))
}

/// GET /settings/password
pub async fn password_form(State(state): State<AppState>, current: CurrentAccount) -> View {
    View::new("settings/password")
        .with("nickname", &current.principal.nickname)
        .flash(state.sessions.take_flash(&current.token))
}

/// POST /settings/password
pub async fn update_password(
    State(state): State<AppState>,
    current: CurrentAccount,
    Form(form): Form<PasswordForm>,
) -> Result<Response> {
    let errors = form.validate();
    if errors.has_errors() {
        return Ok(View::new("settings/password")
            .with("nickname", &current.principal.nickname)
            .errors(errors)
            .into_response());
    }

    state
        .accounts
        .update_password(current.principal.id, &form.new_password)
        .await?;
    Ok(saved(&state, &current, "password.updated", "/settings/password"))
}

/// GET /settings/notifications
pub async fn notifications_form(
    State(state): State<AppState>,
    current: CurrentAccount,
) -> Result<View> {
    let account = state.accounts.find_by_id(current.principal.id).await?;
    let view = View::new("settings/notifications")
        .with("nickname", &account.nickname)
        .flash(state.sessions.take_flash(&current.token));
    with_fields(view, &NotificationsForm::from(account.notifications))
}

/// POST /settings/notifications
pub async fn update_notifications(
    State(state): State<AppState>,
    current: CurrentAccount,
    Form(form): Form<NotificationsForm>,
) -> Result<Response> {
    state
        .accounts
        .update_notifications(current.principal.id, form)
        .await?;
    Ok(saved(
        &state,
        &current,
        "notifications.updated",
        "/settings/notifications",
    ))
}

/// GET /settings/account
pub async fn account_form(State(state): State<AppState>, current: CurrentAccount) -> View {
    View::new("settings/account")
        .with("nickname", &current.principal.nickname)
        .flash(state.sessions.take_flash(&current.token))
}

/// POST /settings/account - change nickname
pub async fn update_account(
    State(state): State<AppState>,
    current: CurrentAccount,
    Form(form): Form<NicknameForm>,
) -> Result<Response> {
    match state
        .accounts
        .update_nickname(current.principal.id, &form)
        .await?
    {
        Validated::Valid(account) => {
            state.sessions.refresh_principal(&account);
            Ok(saved(&state, &current, "nickname.updated", "/settings/account"))
        }
        Validated::Invalid(errors) => Ok(View::new("settings/account")
            .with("nickname", &form.nickname)
            .errors(errors)
            .into_response()),
    }
}

/// GET /settings/tags
pub async fn tags_form(State(state): State<AppState>, current: CurrentAccount) -> Result<View> {
    let tags = state.accounts.get_tags(current.principal.id).await?;
    let whitelist = state.accounts.tag_whitelist().await;

    Ok(View::new("settings/tags")
        .with("nickname", &current.principal.nickname)
        .with("tags", serde_json::to_string(&tags)?)
        .with("whitelist", serde_json::to_string(&whitelist)?))
}

/// POST /settings/tags/add
pub async fn add_tag(
    State(state): State<AppState>,
    current: CurrentAccount,
    Json(form): Json<TagForm>,
) -> Result<StatusCode> {
    match state
        .accounts
        .add_tag(current.principal.id, &form.tag_title)
        .await?
    {
        Some(_) => Ok(StatusCode::OK),
        None => Ok(StatusCode::BAD_REQUEST),
    }
}

/// POST /settings/tags/remove
pub async fn remove_tag(
    State(state): State<AppState>,
    current: CurrentAccount,
    Json(form): Json<TagForm>,
) -> Result<StatusCode> {
    let removed = state
        .accounts
        .remove_tag(current.principal.id, &form.tag_title)
        .await?;
    Ok(if removed {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    })
}

/// GET /settings/zones
pub async fn zones_form(State(state): State<AppState>, current: CurrentAccount) -> Result<View> {
    let zones = state.accounts.get_zones(current.principal.id).await?;
    let whitelist = state.accounts.zone_whitelist().await;

    Ok(View::new("settings/zones")
        .with("nickname", &current.principal.nickname)
        .with("zones", serde_json::to_string(&zones)?)
        .with("whitelist", serde_json::to_string(&whitelist)?))
}

/// POST /settings/zones/add
pub async fn add_zone(
    State(state): State<AppState>,
    current: CurrentAccount,
    Json(form): Json<ZoneForm>,
) -> Result<StatusCode> {
    let Some((city, province)) = form.city_and_province() else {
        return Ok(StatusCode::BAD_REQUEST);
    };

    let added = state
        .accounts
        .add_zone(current.principal.id, &city, &province)
        .await?;
    Ok(if added {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    })
}

/// POST /settings/zones/remove
pub async fn remove_zone(
    State(state): State<AppState>,
    current: CurrentAccount,
    Json(form): Json<ZoneForm>,
) -> Result<StatusCode> {
    let Some((city, province)) = form.city_and_province() else {
        return Ok(StatusCode::BAD_REQUEST);
    };

    let removed = state
        .accounts
        .remove_zone(current.principal.id, &city, &province)
        .await?;
    Ok(if removed {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    })
}
