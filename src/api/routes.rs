//! Application route configuration.

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, StatusCode},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::user_routes;
use super::openapi::ApiDoc;
use super::AppState;
use crate::config::{API_SUPPORTED_VERSIONS, API_V1_PREFIX, API_VERSIONS_HEADER};
use crate::types::{ApiResponse, HealthResponse};

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // OpenAPI Swagger UI documentation
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/v1/openapi.json", ApiDoc::openapi()),
        )
        .nest(&format!("{}/users", API_V1_PREFIX), user_routes())
        // Global middleware
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(API_VERSIONS_HEADER),
            HeaderValue::from_static(API_SUPPORTED_VERSIONS),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Layered User API"
}

/// Health check endpoint with database connectivity check
async fn health(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    match state.services.ping().await {
        Ok(()) => ApiResponse::success(HealthResponse {
            status: "healthy",
            database: "healthy",
        }),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            ApiResponse::failure(StatusCode::SERVICE_UNAVAILABLE, "Database is unreachable")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
    };
    use chrono::Utc;
    use serde_json::Value;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::domain::UserResponse;
    use crate::errors::AppError;
    use crate::services::{MockServiceContainer, MockUserService, UserService};

    fn sample_user(id: Uuid) -> UserResponse {
        UserResponse {
            user_id: id,
            username: "alice".into(),
            email: "alice@example.com".into(),
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

    fn router_with(users: MockUserService) -> Router {
        let users: Arc<dyn UserService> = Arc::new(users);
        let mut container = MockServiceContainer::new();
        container.expect_users().returning(move || users.clone());
        container.expect_ping().returning(|| Ok(()));
        create_router(AppState::new(Arc::new(container)))
    }

    fn router_with_unreachable_database() -> Router {
        let mut container = MockServiceContainer::new();
        container
            .expect_ping()
            .returning(|| Err(AppError::internal("connection refused")));
        create_router(AppState::new(Arc::new(container)))
    }

    async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let version = response
            .headers()
            .get(API_VERSIONS_HEADER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, version, json)
    }

    #[tokio::test]
    async fn test_get_user_wraps_result_in_envelope() {
        let id = Uuid::new_v4();
        let mut users = MockUserService::new();
        users
            .expect_get_user()
            .returning(|id| Ok(Some(sample_user(id))));

        let (status, version, body) =
            send(router_with(users), Method::GET, &format!("/api/v1/users/{}", id), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(version.as_deref(), Some("1.0"));
        assert_eq!(body["isSuccess"], true);
        assert_eq!(body["code"], 200);
        assert_eq!(body["result"]["userId"], id.to_string());
        assert!(body["result"].get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_is_404() {
        let mut users = MockUserService::new();
        users.expect_get_user().returning(|_| Ok(None));

        let (status, _, body) = send(
            router_with(users),
            Method::GET,
            &format!("/api/v1/users/{}", Uuid::new_v4()),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["isSuccess"], false);
        assert_eq!(body["code"], 404);
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_404() {
        let mut users = MockUserService::new();
        users.expect_delete_user().returning(|_| Ok(false));

        let (status, _, _) = send(
            router_with(users),
            Method::DELETE,
            &format!("/api/v1/users/{}", Uuid::new_v4()),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_conflict_is_400() {
        let mut users = MockUserService::new();
        users
            .expect_create_user()
            .returning(|_| Err(AppError::conflict("Username 'alice' is already taken")));

        let payload = serde_json::json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "SecurePass123!"
        });
        let (status, _, body) =
            send(router_with(users), Method::POST, "/api/v1/users", Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Username 'alice' is already taken");
    }

    #[tokio::test]
    async fn test_invalid_body_never_reaches_service() {
        let mut users = MockUserService::new();
        users.expect_create_user().never();

        let payload = serde_json::json!({
            "username": "alice",
            "email": "not-an-email",
            "password": "SecurePass123!"
        });
        let (status, _, body) =
            send(router_with(users), Method::POST, "/api/v1/users", Some(payload)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid email format");
    }

    #[tokio::test]
    async fn test_empty_store_is_opaque_500() {
        let mut users = MockUserService::new();
        users
            .expect_list_users()
            .returning(|| Err(AppError::internal("No users found")));

        let (status, _, body) = send(router_with(users), Method::GET, "/api/v1/users", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn test_health_pings_container() {
        let (status, _, body) =
            send(router_with(MockUserService::new()), Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isSuccess"], true);
        assert_eq!(body["result"]["database"], "healthy");
    }

    #[tokio::test]
    async fn test_health_with_unreachable_database_is_a_failure() {
        let (status, version, body) =
            send(router_with_unreachable_database(), Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(version.as_deref(), Some("1.0"));
        assert_eq!(body["isSuccess"], false);
        assert_eq!(body["code"], 503);
        assert_eq!(body["result"], Value::Null);
        assert_eq!(body["error"], "Database is unreachable");
    }
}
