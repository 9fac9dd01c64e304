//! Datastar SSE responses for the interactive parts of the page.

use std::convert::Infallible;

use async_stream::stream;
use axum::response::{
    IntoResponse, Response,
    sse::{Event, Sse},
};
use datastar::prelude::{ElementPatchMode, PatchElements, PatchSignals};
use serde::Serialize;

/// Collects datastar events and replays them as one SSE response.
#[derive(Default)]
pub struct StreamBuilder {
    events: Vec<Event>,
}

impl StreamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the element matched by `selector` with `html`.
    pub fn replace(&mut self, selector: &str, html: String) -> &mut Self {
        let event = PatchElements::new(html)
            .selector(selector)
            .mode(ElementPatchMode::Replace)
            .write_as_axum_sse_event();
        self.events.push(event);
        self
    }

    /// Merge `signals` into the client's signal store.
    pub fn signals<T: Serialize>(&mut self, signals: &T) -> Result<&mut Self, serde_json::Error> {
        let payload = serde_json::to_string(signals)?;
        let event = PatchSignals::new(payload.as_str()).write_as_axum_sse_event();
        self.events.push(event);
        Ok(self)
    }

    pub fn into_response(self) -> Response {
        let events = self.events;
        let stream = stream! {
            for event in events {
                yield Ok::<Event, Infallible>(event);
            }
        };
        Sse::new(stream).into_response()
    }
}
