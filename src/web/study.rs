use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};

use super::auth::CurrentAccount;
use super::server::AppState;
use super::views::View;
use crate::error::Result;
use crate::forms::{StudyForm, Validated};

/// GET /new-study
pub async fn new_study_form(current: CurrentAccount) -> View {
    View::new("study/form").with("account", &current.principal.nickname)
}

/// POST /new-study
pub async fn new_study(
    State(state): State<AppState>,
    current: CurrentAccount,
    Form(form): Form<StudyForm>,
) -> Result<Response> {
    match state
        .studies
        .create_new_study(&form, current.principal.id)
        .await?
    {
        Validated::Valid(study) => Ok(Redirect::to(&format!(
            "/study/{}",
            urlencoding::encode(&study.path)
        ))
        .into_response()),
        Validated::Invalid(errors) => Ok(View::new("study/form")
            .with("account", &current.principal.nickname)
            .with("path", &form.path)
            .with("title", &form.title)
            .with("shortDescription", &form.short_description)
            .with("fullDescription", &form.full_description)
            .errors(errors)
            .into_response()),
    }
}

/// GET /study/:path
pub async fn view_study(
    State(state): State<AppState>,
    current: CurrentAccount,
    Path(path): Path<String>,
) -> Result<View> {
    let study = state.studies.get_study(&path).await?;
    let managers = state.studies.manager_nicknames(&study).await;

    Ok(View::new("study/view")
        .with("path", &study.path)
        .with("title", &study.title)
        .with("shortDescription", &study.short_description)
        .with("fullDescription", &study.full_description)
        .with("managers", serde_json::to_string(&managers)?)
        .with("isManager", study.is_manager(current.principal.id))
        .with("isJoinable", study.is_joinable(current.principal.id))
        .with("published", study.published)
        .with("recruiting", study.recruiting))
}
