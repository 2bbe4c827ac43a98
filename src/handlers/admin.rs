use axum::extract::{Path, State};
use axum::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::services::ticket::{AddTicketRequest, CreatedTicket, DeletedTicket};
use crate::services::TicketService;
use crate::utils::error::AppError;

pub async fn add_ticket(
    State(pool): State<PgPool>,
    Json(request): Json<AddTicketRequest>,
) -> Result<Json<CreatedTicket>, AppError> {
    let created = TicketService::new(pool).add_ticket(request).await?;
    Ok(Json(created))
}

pub async fn delete_ticket(
    State(pool): State<PgPool>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<DeletedTicket>, AppError> {
    let deleted = TicketService::new(pool).delete_ticket(ticket_id).await?;
    Ok(Json(deleted))
}
