//! User request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User creation data transfer object
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Plaintext password, hashed before it is stored
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
    #[validate(length(max = 50, message = "First name must be at most 50 characters"))]
    #[schema(example = "Alice")]
    pub first_name: Option<String>,
    #[validate(length(max = 50, message = "Last name must be at most 50 characters"))]
    #[schema(example = "Liddell")]
    pub last_name: Option<String>,
    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    #[schema(example = "+44 20 7946 0000")]
    pub phone_number: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 50, message = "City must be at most 50 characters"))]
    #[schema(example = "Oxford")]
    pub city: Option<String>,
    #[validate(length(max = 10, message = "Postal code must be at most 10 characters"))]
    pub postal_code: Option<String>,
    #[validate(length(max = 50, message = "Country must be at most 50 characters"))]
    pub country: Option<String>,
}

/// Partial user update.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    /// Identifier of the user to update
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: Option<String>,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 100, message = "Email must be at most 100 characters")
    )]
    pub email: Option<String>,
    #[validate(length(max = 50, message = "First name must be at most 50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(max = 50, message = "Last name must be at most 50 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 20, message = "Phone number must be at most 20 characters"))]
    pub phone_number: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 50, message = "City must be at most 50 characters"))]
    #[schema(example = "Cambridge")]
    pub city: Option<String>,
    #[validate(length(max = 10, message = "Postal code must be at most 10 characters"))]
    pub postal_code: Option<String>,
    #[validate(length(max = 50, message = "Country must be at most 50 characters"))]
    pub country: Option<String>,
    pub is_active: Option<bool>,
}

/// User response (safe to return to client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub user_id: Uuid,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub is_active: bool,
    pub registered_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}
