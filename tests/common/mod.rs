//! Shared fixtures for the integration suites.
//!
//! Every test gets its own in-memory SQLite database with the migrations
//! applied. The pool holds a single connection so the database lives as long
//! as the test.

#![allow(dead_code)]

use chrono::Utc;
use uuid::Uuid;

use layered_user_api::config::Config;
use layered_user_api::infra::repositories::entities::user;
use layered_user_api::infra::Database;
use layered_user_api::CreateUser;

pub async fn database() -> Database {
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        max_connections: 1,
        ..Config::default()
    };
    Database::connect(&config)
        .await
        .expect("in-memory database")
}

pub fn user_row(username: &str) -> user::Model {
    user::Model {
        user_id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: "$argon2id$placeholder".to_string(),
        first_name: None,
        last_name: None,
        phone_number: None,
        address: None,
        city: None,
        postal_code: None,
        country: None,
        is_active: true,
        registered_at: Utc::now(),
        last_login: None,
    }
}

pub fn create_request(username: &str) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: "SecurePass123!".to_string(),
        first_name: None,
        last_name: None,
        phone_number: None,
        address: None,
        city: Some("Oxford".to_string()),
        postal_code: None,
        country: None,
    }
}

pub fn usernames(rows: &[user::Model]) -> Vec<String> {
    let mut names: Vec<String> = rows.iter().map(|r| r.username.clone()).collect();
    names.sort();
    names
}
