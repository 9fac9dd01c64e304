//! Server actions: mutate the store, wait for the commit, then re-render from a fresh read.

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    application::{
        error::{AppError, HttpError},
        stream::StreamBuilder,
    },
    presentation::views::{ActionStatusTemplate, PreferencesPanelTemplate, render_document},
    revalidate::HOME_PATH,
};

use super::{
    public::HttpState,
    selectors::{ACTION_STATUS, PREFERENCES_PANEL},
};

#[derive(Debug, Deserialize)]
pub(crate) struct CurrencyForm {
    currency: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlagToggleForm {
    #[serde(rename = "flagName")]
    flag_name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RevalidateForm {
    path: String,
}

pub(crate) async fn set_currency(
    State(state): State<HttpState>,
    Form(form): Form<CurrencyForm>,
) -> Response {
    if let Err(err) = state.preferences.set_currency(&form.currency).await {
        return AppError::from(err).into_response();
    }

    respond_with_panel(
        &state,
        ActionStatusTemplate::success(format!("Currency saved as {}", form.currency)),
        "infra::http::actions::set_currency",
    )
    .await
}

pub(crate) async fn toggle_flag(
    State(state): State<HttpState>,
    Form(form): Form<FlagToggleForm>,
) -> Response {
    let enabled = state.preferences.toggle_flag(&form.flag_name).await;
    let verb = if enabled { "enabled" } else { "disabled" };

    respond_with_panel(
        &state,
        ActionStatusTemplate::success(format!("Flag {} {verb}", form.flag_name)),
        "infra::http::actions::toggle_flag",
    )
    .await
}

pub(crate) async fn revalidate(
    State(state): State<HttpState>,
    Form(form): Form<RevalidateForm>,
) -> Response {
    let path = form.path.trim();
    if !path.starts_with('/') {
        return HttpError::new(
            "infra::http::actions::revalidate",
            StatusCode::BAD_REQUEST,
            "Invalid revalidation path",
            format!("revalidation path `{path}` must start with `/`"),
        )
        .into_response();
    }

    let status = match state.preferences.revalidator().revalidate_path(path) {
        Some(epoch) => {
            ActionStatusTemplate::success(format!("Revalidated {path} at epoch {epoch}"))
        }
        None => ActionStatusTemplate::error("Revalidation is disabled"),
    };

    respond_with_panel(&state, status, "infra::http::actions::revalidate").await
}

/// Read the store afresh and render the preferences panel.
pub(super) async fn render_preferences_panel(
    state: &HttpState,
    source: &'static str,
) -> Result<String, HttpError> {
    let snapshot = state.preferences.get_preferences().await;
    let epoch = state.preferences.revalidator().path_epoch(HOME_PATH);
    let html = render_document(&PreferencesPanelTemplate::new(&snapshot, epoch), source)?;
    Ok(html)
}

async fn respond_with_panel(
    state: &HttpState,
    status: ActionStatusTemplate,
    source: &'static str,
) -> Response {
    let panel = match render_preferences_panel(state, source).await {
        Ok(html) => html,
        Err(err) => return err.into_response(),
    };
    let status = match render_document(&status, source) {
        Ok(html) => html,
        Err(err) => return HttpError::from(err).into_response(),
    };

    let mut stream = StreamBuilder::new();
    stream
        .replace(PREFERENCES_PANEL, panel)
        .replace(ACTION_STATUS, status);
    stream.into_response()
}
