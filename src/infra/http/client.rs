//! Browser transport for the client island.
//!
//! The island's state lives in datastar signals. Each button posts the current signals; the
//! handler rebuilds a container from them, applies the mutation and patches the signals back.
//! Nothing is stored server-side.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    application::{
        client_state::{ClientScope, ClientSignals, ClientState},
        error::{AppError, HttpError},
        stream::StreamBuilder,
    },
    domain::derived::DerivedConfig,
};

pub(crate) async fn cycle_location(Json(signals): Json<ClientSignals>) -> Response {
    apply(signals, ClientState::cycle_location, "infra::http::client::cycle_location")
}

pub(crate) async fn toggle_login(Json(signals): Json<ClientSignals>) -> Response {
    apply(signals, ClientState::toggle_login, "infra::http::client::toggle_login")
}

fn apply(
    signals: ClientSignals,
    mutate: fn(&ClientState) -> DerivedConfig,
    source: &'static str,
) -> Response {
    let current = match DerivedConfig::try_from(signals) {
        Ok(config) => config,
        Err(err) => return AppError::from(err).into_response(),
    };

    let scope = ClientScope::root().provide(ClientState::new(current));
    let container = match scope.nested().use_client_state() {
        Ok(container) => container,
        Err(err) => return AppError::from(err).into_response(),
    };
    let next = mutate(&container);

    let mut stream = StreamBuilder::new();
    if let Err(err) = stream.signals(&ClientSignals::from(&next)) {
        return HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode client state",
            &err,
        )
        .into_response();
    }
    stream.into_response()
}
