use axum::http::{header, HeaderValue};
use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::PgPool;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::create_cors_layer;
use crate::handlers::{self, admin, bookings, tickets};

pub fn create_routes(pool: PgPool) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/v1/get-available-ticket",
            get(tickets::available_tickets),
        )
        .route("/api/v1/book-ticket", post(bookings::reserve))
        .route(
            "/api/v1/get-booked-ticket/:reservation_id",
            get(bookings::booked_ticket_details),
        )
        .route(
            "/api/v1/revoke-ticket/:reservation_id/:ticket_code/:qty",
            delete(bookings::revoke),
        )
        .route(
            "/api/v1/edit-booked-ticket/:reservation_id",
            put(bookings::edit),
        )
        .route("/api/v1/admin/add-tickets", post(admin::add_ticket))
        .route(
            "/api/v1/admin/delete-tickets/:ticket_id",
            delete(admin::delete_ticket),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer())
        .with_state(pool)
}
