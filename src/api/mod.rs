//! API layer - HTTP handlers and routing
//!
//! Versioned routes, request extractors and the OpenAPI document. Errors
//! reach the client through `AppError`'s `IntoResponse` impl only.

pub mod extractors;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
