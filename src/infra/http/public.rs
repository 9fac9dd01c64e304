use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use time::format_description::well_known::Rfc3339;

use crate::{
    application::{
        error::HttpError, page::PageService, preferences::PreferencesService,
    },
    domain::derived::RequestInputs,
    presentation::views::{HomeTemplate, render_template_response},
    revalidate::{EventKind, RevalidationEvent},
};

use super::{
    actions, client,
    middleware::{log_responses, simulate_request_context},
    updates,
};

#[derive(Clone)]
pub struct HttpState {
    pub pages: Arc<PageService>,
    pub preferences: Arc<PreferencesService>,
    /// Inputs the simulated middleware attaches to every request.
    pub simulation: RequestInputs,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/_health", get(health))
        .route("/updates", get(updates::preferences_updates))
        .route("/api/preferences", get(api_preferences))
        .route("/api/revalidations", get(api_revalidations))
        .route("/actions/currency", post(actions::set_currency))
        .route("/actions/flags/toggle", post(actions::toggle_flag))
        .route("/actions/revalidate", post(actions::revalidate))
        .route("/ui/client/cycle-location", post(client::cycle_location))
        .route("/ui/client/toggle-login", post(client::toggle_login))
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            simulate_request_context,
        ))
        .with_state(state)
}

async fn index(
    State(state): State<HttpState>,
    Extension(inputs): Extension<RequestInputs>,
) -> Response {
    let page = match state.pages.compose_home(&inputs).await {
        Ok(page) => page,
        Err(err) => return err.into_response(),
    };

    match HomeTemplate::from_page(&page) {
        Ok(template) => render_template_response(template, StatusCode::OK),
        Err(err) => HttpError::from_error(
            "infra::http::public::index",
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode client state",
            &err,
        )
        .into_response(),
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn api_preferences(State(state): State<HttpState>) -> impl IntoResponse {
    Json(state.preferences.get_preferences().await)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RevalidationView {
    id: String,
    epoch: u64,
    kind: &'static str,
    paths: Vec<String>,
    detail: String,
    timestamp: String,
}

impl From<&RevalidationEvent> for RevalidationView {
    fn from(event: &RevalidationEvent) -> Self {
        let detail = match &event.kind {
            EventKind::PreferencesUpdated { currency } => format!("currency={currency}"),
            EventKind::FeatureFlagToggled { flag, enabled } => format!("{flag}={enabled}"),
            EventKind::PathRevalidated { path } => format!("path={path}"),
        };

        Self {
            id: event.id.to_string(),
            epoch: event.epoch,
            kind: event.kind.label(),
            paths: event.kind.affected_paths(),
            detail,
            timestamp: event.timestamp.format(&Rfc3339).unwrap_or_default(),
        }
    }
}

async fn api_revalidations(State(state): State<HttpState>) -> impl IntoResponse {
    let events: Vec<RevalidationView> = state
        .preferences
        .revalidator()
        .recent()
        .iter()
        .map(RevalidationView::from)
        .collect();
    Json(events)
}
