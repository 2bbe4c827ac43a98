use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One reserved quantity of one ticket within a booking. Addressed
/// externally through its booking id (the "reservation id"), which
/// resolves all sibling line items as a group.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookedTicket {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub ticket_id: Uuid,
    pub quantity: i32,
}
