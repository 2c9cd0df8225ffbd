//! HTTP API: server, routing, and request/response mapping.

pub mod app;
pub mod context;
pub mod middleware;

pub use app::{build_app, build_app_from_config};
