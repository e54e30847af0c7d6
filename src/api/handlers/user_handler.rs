//! User handlers.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use crate::api::extractors::{ValidatedJson, ValidatedJsonList};
use crate::api::state::AppState;
use crate::domain::{CreateUser, UpdateUser, UserResponse};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::{ApiResponse, Created};

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user).put(update_user))
        .route("/batch", post(create_users))
        .route("/:id", get(get_user).delete(delete_user))
        .route("/by-username/:username", get(get_user_by_username))
        .route("/by-email/:email", get(get_user_by_email))
}

/// List all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    responses(
        (status = 200, description = "Every registered user", body = Vec<UserResponse>),
        (status = 500, description = "No users are registered")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state.services.users().list_users().await?;
    Ok(ApiResponse::success(users))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .services
        .users()
        .get_user(id)
        .await?
        .ok_or_not_found(format!("User {} does not exist", id))?;
    Ok(ApiResponse::success(user))
}

/// Get user by username
#[utoipa::path(
    get,
    path = "/api/v1/users/by-username/{username}",
    tag = "Users",
    params(
        ("username" = String, Path, description = "Username")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .services
        .users()
        .get_user_by_username(&username)
        .await?
        .ok_or_not_found(format!("User '{}' does not exist", username))?;
    Ok(ApiResponse::success(user))
}

/// Get user by email
#[utoipa::path(
    get,
    path = "/api/v1/users/by-email/{email}",
    tag = "Users",
    params(
        ("email" = String, Path, description = "Email address")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .services
        .users()
        .get_user_by_email(&email)
        .await?
        .ok_or_not_found(format!("No user registered with '{}'", email))?;
    Ok(ApiResponse::success(user))
}

/// Register a user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error or username/email taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateUser>,
) -> AppResult<Created<UserResponse>> {
    let user = state.services.users().create_user(payload).await?;
    Ok(Created(user))
}

/// Register several users atomically
#[utoipa::path(
    post,
    path = "/api/v1/users/batch",
    tag = "Users",
    request_body = Vec<CreateUser>,
    responses(
        (status = 201, description = "All users created", body = Vec<UserResponse>),
        (status = 400, description = "Validation error or duplicate in batch or store")
    )
)]
pub async fn create_users(
    State(state): State<AppState>,
    ValidatedJsonList(payload): ValidatedJsonList<CreateUser>,
) -> AppResult<Created<Vec<UserResponse>>> {
    let users = state.services.users().create_users(payload).await?;
    Ok(Created(users))
}

/// Update the provided fields of a user
#[utoipa::path(
    put,
    path = "/api/v1/users",
    tag = "Users",
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error or username/email taken"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateUser>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.services.users().update_user(payload).await?;
    Ok(ApiResponse::success(user))
}

/// Delete user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = bool),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<bool>> {
    if !state.services.users().delete_user(id).await? {
        return Err(AppError::not_found(format!("User {} does not exist", id)));
    }
    Ok(ApiResponse::success(true))
}
