//! Layered User API - a layered web-API template
//!
//! HTTP handlers call services, services work through a Unit of Work, and
//! the Unit of Work hands out repositories of either kind: a tracked-session
//! repository on SeaORM or a raw-SQL repository built from table metadata.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Request/response types and password hashing
//! - **services**: Application use cases and business logic
//! - **infra**: Database, session, repositories and Unit of Work
//! - **api**: HTTP handlers, extractors and routes
//! - **types**: Response envelope
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server on the raw-SQL repositories
//! cargo run -- serve --repository sql
//!
//! # Run migrations
//! cargo run -- migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{CreateUser, Password, UpdateUser, UserResponse};
pub use errors::{AppError, AppResult};
pub use infra::{Database, RepositoryKind};
