//! HTTP surface: the upload-notification webhook and health check.

pub mod app;
pub mod routes;

pub use app::{build_app, AppState};
