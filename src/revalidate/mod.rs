//! Invalidate-and-recompute.
//!
//! Write paths publish a revalidation event once their change is committed. The
//! [`Revalidator`] stamps it with a monotonic epoch, keeps a short history for
//! diagnostics and wakes every subscriber so downstream readers re-fetch and
//! re-render. Nothing is cached here: readers always go back to the store.

mod config;
mod events;
mod trigger;

pub use config::RevalidateConfig;
pub use events::{Epoch, EventKind, HOME_PATH, RevalidationEvent};
pub use trigger::Revalidator;
