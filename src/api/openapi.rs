//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::OpenApi;

use crate::api::handlers::user_handler;
use crate::domain::{CreateUser, UpdateUser, UserResponse};

/// OpenAPI documentation for version 1 of the API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Layered User API",
        version = "1.0",
        description = "User management over interchangeable ORM and raw-SQL repositories",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        user_handler::list_users,
        user_handler::get_user,
        user_handler::get_user_by_username,
        user_handler::get_user_by_email,
        user_handler::create_user,
        user_handler::create_users,
        user_handler::update_user,
        user_handler::delete_user,
    ),
    components(
        schemas(UserResponse, CreateUser, UpdateUser)
    ),
    tags(
        (name = "Users", description = "User management operations")
    )
)]
pub struct ApiDoc;
