use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub mod admin;
pub mod bookings;
pub mod tickets;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "entrada-api",
    };

    Json(payload).into_response()
}
