//! Application services layer.

pub mod client_state;
pub mod error;
pub mod page;
pub mod preferences;
pub mod repos;
pub mod stream;
