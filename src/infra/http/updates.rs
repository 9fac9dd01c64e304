use std::convert::Infallible;

use async_stream::stream;
use axum::{
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use datastar::prelude::{ElementPatchMode, PatchElements};
use tracing::{debug, warn};

use super::{actions::render_preferences_panel, public::HttpState, selectors::PREFERENCES_PANEL};

const SOURCE: &str = "infra::http::updates::preferences_updates";

/// Long-lived SSE stream re-rendering the preferences panel after every revalidation.
pub(crate) async fn preferences_updates(State(state): State<HttpState>) -> Response {
    let mut receiver = state.preferences.revalidator().subscribe();

    let stream = stream! {
        while receiver.changed().await.is_ok() {
            let epoch = *receiver.borrow_and_update();
            match render_preferences_panel(&state, SOURCE).await {
                Ok(html) => {
                    debug!(
                        target = "splitrender::http::updates",
                        epoch,
                        "Pushing re-rendered preferences panel"
                    );
                    let event = PatchElements::new(html)
                        .selector(PREFERENCES_PANEL)
                        .mode(ElementPatchMode::Replace)
                        .write_as_axum_sse_event();
                    yield Ok::<Event, Infallible>(event);
                }
                Err(err) => {
                    warn!(
                        target = "splitrender::http::updates",
                        epoch,
                        error = ?err,
                        "Skipping panel update after render failure"
                    );
                }
            }
        }
    };

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
