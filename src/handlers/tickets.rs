use axum::extract::{Query, State};
use axum::Json;
use sqlx::PgPool;

use crate::services::ticket::{AvailableTicketList, AvailableTicketParams};
use crate::services::TicketService;
use crate::utils::error::AppError;

pub async fn available_tickets(
    State(pool): State<PgPool>,
    Query(params): Query<AvailableTicketParams>,
) -> Result<Json<AvailableTicketList>, AppError> {
    let list = TicketService::new(pool).available_tickets(params).await?;
    Ok(Json(list))
}
