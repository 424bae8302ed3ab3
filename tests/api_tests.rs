use axum::{
    http::{Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower::ServiceExt;

// Función helper para crear la app de test. El router real necesita
// Postgres y SMTP; acá se replica la superficie HTTP mínima para
// verificar contratos de status y formato.
fn create_test_app() -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async {
                Json(json!({
                    "status": "ok",
                    "service": "intellidrive-backend",
                }))
            }),
        )
        .route(
            "/api/auth/login",
            post(|body: Json<serde_json::Value>| async move {
                if body.get("email").is_none() || body.get("password").is_none() {
                    return (StatusCode::BAD_REQUEST, Json(json!({"success": false})));
                }
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "success": false,
                        "error": "Invalid credentials",
                    })),
                )
            }),
        )
        .route(
            "/api/bookings",
            post(|headers: axum::http::HeaderMap| async move {
                if !headers.contains_key("authorization") {
                    return (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({
                            "success": false,
                            "error": "Missing authorization token",
                        })),
                    );
                }
                // Usuario con reserva vigente: la segunda creación choca
                (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "error": "Conflict",
                        "message": "You already have an active booking. Only one vehicle can be rented at a time.",
                        "code": "CONFLICT",
                    })),
                )
            }),
        )
        .route(
            "/api/vehicles/:id/location",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "success": false,
                        "error": "Missing authorization token",
                    })),
                )
            }),
        )
}

async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(json!(null));
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let request = Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "intellidrive-backend");
}

#[tokio::test]
async fn test_login_with_invalid_credentials() {
    let app = create_test_app();
    let (status, body) = send_json(
        app,
        "POST",
        "/api/auth/login",
        json!({
            "email": "nadie@test.com",
            "password": "incorrecta"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_with_missing_fields() {
    let app = create_test_app();
    let (status, _) = send_json(app, "POST", "/api/auth/login", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_second_booking_conflicts() {
    let app = create_test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("content-type", "application/json")
        .header("authorization", "Bearer token-de-prueba")
        .body(axum::body::Body::from(
            json!({
                "vehicleId": "7f2c3a04-9a3f-4a8e-9d1e-111122223333",
                "startDate": "2026-09-01T10:00:00Z",
                "endDate": "2026-09-01T14:00:00Z"
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Only one vehicle can be rented at a time"));
}

#[tokio::test]
async fn test_location_update_is_a_post() {
    // El cliente de GPS manda POST; PUT no forma parte del contrato
    let app = create_test_app();
    let (status, _) = send_json(
        app.clone(),
        "POST",
        "/api/vehicles/7f2c3a04-9a3f-4a8e-9d1e-111122223333/location",
        json!({ "lat": 40.4, "lng": -3.7 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        app,
        "PUT",
        "/api/vehicles/7f2c3a04-9a3f-4a8e-9d1e-111122223333/location",
        json!({ "lat": 40.4, "lng": -3.7 }),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_bookings_require_authentication() {
    let app = create_test_app();
    let (status, body) = send_json(
        app,
        "POST",
        "/api/bookings",
        json!({
            "vehicleId": "7f2c3a04-9a3f-4a8e-9d1e-111122223333",
            "startDate": "2026-09-01T10:00:00Z",
            "endDate": "2026-09-01T14:00:00Z"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}
