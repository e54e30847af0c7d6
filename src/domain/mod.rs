//! Domain layer - request/response shapes and value objects
//!
//! Persistence rows live in `infra::repositories::entities`; the types here
//! are what services accept and return.

pub mod password;
pub mod user;

pub use password::Password;
pub use user::{CreateUser, UpdateUser, UserResponse};
