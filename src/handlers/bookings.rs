use axum::extract::{Path, State};
use axum::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::booking::{
    BookedCategoryDetails, BookedTicketLine, EditBookedTicketRequest, ReservationSummary,
    ReserveTicketRequest,
};
use crate::services::BookingService;
use crate::utils::error::AppError;

pub async fn reserve(
    State(pool): State<PgPool>,
    Json(lines): Json<Vec<ReserveTicketRequest>>,
) -> Result<Json<ReservationSummary>, AppError> {
    if lines.is_empty() {
        return Err(AppError::validation("Request body cannot be empty."));
    }

    let summary = BookingService::new(pool).reserve(lines).await?;
    Ok(Json(summary))
}

pub async fn booked_ticket_details(
    State(pool): State<PgPool>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<Vec<BookedCategoryDetails>>, AppError> {
    let details = BookingService::new(pool)
        .booking_details(reservation_id)
        .await?;
    Ok(Json(details))
}

pub async fn revoke(
    State(pool): State<PgPool>,
    Path((reservation_id, ticket_code, qty)): Path<(Uuid, String, i32)>,
) -> Result<Json<Vec<BookedTicketLine>>, AppError> {
    if qty <= 0 {
        return Err(AppError::validation(
            "The quantity to revoke must be greater than zero.",
        ));
    }

    let remaining = BookingService::new(pool)
        .revoke(reservation_id, &ticket_code, qty)
        .await?;
    Ok(Json(remaining))
}

pub async fn edit(
    State(pool): State<PgPool>,
    Path(reservation_id): Path<Uuid>,
    Json(changes): Json<Vec<EditBookedTicketRequest>>,
) -> Result<Json<Vec<BookedTicketLine>>, AppError> {
    if changes.is_empty() {
        return Err(AppError::validation("Request body cannot be empty."));
    }

    let updated = BookingService::new(pool)
        .edit(reservation_id, changes)
        .await?;
    Ok(Json(updated))
}
