//! Askama views and templates.

pub mod views;
