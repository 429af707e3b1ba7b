//! HTTP API layer for volunteer-hub.
//!
//! - **Endpoints**: applications, attendance, penalties, certificates
//! - **Extractors**: authenticated user, JSON bodies with domain errors
//! - **Middleware**: bearer token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::{healthz, router};
pub use middleware::{AppState, auth_middleware};
