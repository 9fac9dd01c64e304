mod actions;
mod client;
mod middleware;
mod public;
mod selectors;
mod updates;

pub use public::{HttpState, build_router};
