//! Conversions between request types and the stored user row.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{CreateUser, Password, UpdateUser};
use crate::errors::AppResult;
use crate::infra::repositories::entities::user;

/// Build a new row from a creation request.
///
/// Assigns a fresh id, hashes the password and stamps the registration time.
pub fn new_user(input: CreateUser) -> AppResult<user::Model> {
    let password = Password::hash(&input.password)?;

    Ok(user::Model {
        user_id: Uuid::new_v4(),
        username: input.username,
        email: input.email,
        password_hash: password.into_string(),
        first_name: input.first_name,
        last_name: input.last_name,
        phone_number: input.phone_number,
        address: input.address,
        city: input.city,
        postal_code: input.postal_code,
        country: input.country,
        is_active: true,
        registered_at: Utc::now(),
        last_login: None,
    })
}

/// Copy the fields present in `update` onto `existing`.
///
/// Absent fields keep their stored value; the id never changes.
pub fn apply_update(mut existing: user::Model, update: UpdateUser) -> user::Model {
    fn set<T>(target: &mut T, value: Option<T>) {
        if let Some(value) = value {
            *target = value;
        }
    }

    // Required columns are never blanked
    set(&mut existing.username, update.username.filter(|v| !v.is_empty()));
    set(&mut existing.email, update.email.filter(|v| !v.is_empty()));
    set(&mut existing.is_active, update.is_active);

    // Optional columns: a provided value replaces, absence keeps the old one
    set(&mut existing.first_name, update.first_name.map(Some));
    set(&mut existing.last_name, update.last_name.map(Some));
    set(&mut existing.phone_number, update.phone_number.map(Some));
    set(&mut existing.address, update.address.map(Some));
    set(&mut existing.city, update.city.map(Some));
    set(&mut existing.postal_code, update.postal_code.map(Some));
    set(&mut existing.country, update.country.map(Some));

    existing
}
