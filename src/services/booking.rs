use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{BookedTicket, Booking};
use crate::utils::datetime::format_event_date;
use crate::utils::error::AppError;

/// One requested line of a reservation batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveTicketRequest {
    pub ticket_code: String,
    pub quantity: i32,
}

/// One requested change of an amendment batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBookedTicketRequest {
    pub ticket_code: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSummary {
    pub price_summary: Decimal,
    pub tickets_per_categories: Vec<CategoryReservation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryReservation {
    pub category_name: String,
    pub summary_price: Decimal,
    pub tickets: Vec<ReservedTicketLine>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedTicketLine {
    pub ticket_code: String,
    pub ticket_name: String,
    pub price: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedCategoryDetails {
    pub category_name: String,
    pub qty_per_category: i32,
    pub tickets: Vec<BookedTicketDetails>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedTicketDetails {
    pub ticket_code: String,
    pub ticket_name: String,
    pub event_date: String,
}

/// Row shape shared by the revoke and edit responses: one remaining or
/// updated line item of a booking.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedTicketLine {
    pub ticket_code: String,
    pub ticket_name: String,
    pub quantity: i32,
    pub category_name: String,
}

#[derive(Debug, FromRow)]
struct TicketForReserve {
    id: Uuid,
    code: String,
    name: String,
    event_date: DateTime<Utc>,
    price: Decimal,
    quota: i32,
    category_name: String,
}

#[derive(Debug, FromRow)]
struct BookedLineDetail {
    quantity: i32,
    code: String,
    name: String,
    event_date: DateTime<Utc>,
    category_name: String,
}

#[derive(Debug, FromRow)]
struct LineForRevoke {
    id: Uuid,
    booking_id: Uuid,
    quantity: i32,
    ticket_id: Uuid,
}

#[derive(Debug, FromRow)]
struct LineForEdit {
    id: Uuid,
    quantity: i32,
    code: String,
}

#[derive(Debug, FromRow)]
struct TicketForEdit {
    id: Uuid,
    code: String,
    name: String,
    quota: i32,
    category_name: String,
}

#[derive(Debug, FromRow)]
struct RemainingLine {
    code: String,
    name: String,
    quantity: i32,
    category_name: String,
}

/// Transaction engine over the booking ledger. Every mutating operation
/// runs inside a single transaction: commit on full success, rollback on
/// any early return (the `Transaction` drop path).
#[derive(Clone)]
pub struct BookingService {
    pool: PgPool,
}

impl BookingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reserves a batch of ticket quantities against catalog quota.
    ///
    /// Every line is validated and every failure collected before the
    /// outcome is decided: a batch containing any failure is rejected as a
    /// whole, debiting nothing. On full success the quota debits, the new
    /// booking and its line items are committed as one unit.
    pub async fn reserve(
        &self,
        lines: Vec<ReserveTicketRequest>,
    ) -> Result<ReservationSummary, AppError> {
        info!(count = lines.len(), "Starting ticket reservation");

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let mut errors = Vec::new();
        let mut accepted: Vec<(TicketForReserve, i32)> = Vec::new();
        // Debits already accepted earlier in this batch, so duplicate codes
        // validate against the quota they will actually see.
        let mut pending_debits: HashMap<Uuid, i32> = HashMap::new();

        for line in &lines {
            let ticket = sqlx::query_as::<_, TicketForReserve>(
                "SELECT t.id, t.code, t.name, t.event_date, t.price, t.quota, \
                        c.name AS category_name \
                 FROM tickets t \
                 JOIN categories c ON c.id = t.category_id \
                 WHERE t.code = $1 \
                 FOR UPDATE OF t",
            )
            .bind(&line.ticket_code)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(ticket) = ticket else {
                warn!(code = %line.ticket_code, "Ticket code is not registered");
                errors.push(format!(
                    "Ticket code '{}' is not registered.",
                    line.ticket_code
                ));
                continue;
            };

            let quota = ticket.quota - pending_debits.get(&ticket.id).copied().unwrap_or(0);

            if quota <= 0 {
                warn!(code = %ticket.code, "Ticket is sold out");
                errors.push(format!("Ticket code '{}' is sold out.", ticket.code));
                continue;
            }
            if line.quantity > quota {
                warn!(code = %ticket.code, requested = line.quantity, quota, "Quota exceeded");
                errors.push(format!(
                    "Ticket code '{}' exceeds available quota.",
                    ticket.code
                ));
                continue;
            }
            if ticket.event_date <= now {
                warn!(code = %ticket.code, "Event date has passed");
                errors.push(format!(
                    "Ticket code '{}' event date has passed.",
                    ticket.code
                ));
                continue;
            }

            *pending_debits.entry(ticket.id).or_insert(0) += line.quantity;
            accepted.push((ticket, line.quantity));
        }

        if !errors.is_empty() {
            warn!(?errors, "Reservation batch rejected");
            return Err(AppError::batch_validation(
                "Some errors occurred while processing the request.",
                errors,
            ));
        }

        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id) VALUES ($1) RETURNING id, created_at",
        )
        .bind(Uuid::new_v4())
        .fetch_one(&mut *tx)
        .await?;

        for (ticket, quantity) in &accepted {
            sqlx::query("UPDATE tickets SET quota = quota - $1 WHERE id = $2")
                .bind(quantity)
                .bind(ticket.id)
                .execute(&mut *tx)
                .await?;

            let line = BookedTicket {
                id: Uuid::new_v4(),
                booking_id: booking.id,
                ticket_id: ticket.id,
                quantity: *quantity,
            };
            sqlx::query(
                "INSERT INTO booked_tickets (id, booking_id, ticket_id, quantity) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(line.id)
            .bind(line.booking_id)
            .bind(line.ticket_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let summary = summarize_reservation(&accepted);
        info!(
            booking_id = %booking.id,
            created_at = %booking.created_at,
            total_price = %summary.price_summary,
            "Reservation committed"
        );
        Ok(summary)
    }

    /// Returns the line items of a reservation grouped by category, with
    /// aggregate quantity per category.
    pub async fn booking_details(
        &self,
        reservation_id: Uuid,
    ) -> Result<Vec<BookedCategoryDetails>, AppError> {
        info!(reservation_id = %reservation_id, "Fetching booked ticket details");

        let lines = sqlx::query_as::<_, BookedLineDetail>(
            "SELECT bt.quantity, t.code, t.name, t.event_date, c.name AS category_name \
             FROM booked_tickets bt \
             JOIN tickets t ON t.id = bt.ticket_id \
             JOIN categories c ON c.id = t.category_id \
             WHERE bt.booking_id = $1",
        )
        .bind(reservation_id)
        .fetch_all(&self.pool)
        .await?;

        if lines.is_empty() {
            warn!(reservation_id = %reservation_id, "Booked ticket not found");
            return Err(AppError::NotFound(format!(
                "BookedTicketId '{reservation_id}' is not registered."
            )));
        }

        let mut groups: Vec<BookedCategoryDetails> = Vec::new();
        for line in lines {
            let detail = BookedTicketDetails {
                ticket_code: line.code,
                ticket_name: line.name,
                event_date: format_event_date(line.event_date),
            };
            match groups
                .iter_mut()
                .find(|g| g.category_name == line.category_name)
            {
                Some(group) => {
                    group.qty_per_category += line.quantity;
                    group.tickets.push(detail);
                }
                None => groups.push(BookedCategoryDetails {
                    category_name: line.category_name,
                    qty_per_category: line.quantity,
                    tickets: vec![detail],
                }),
            }
        }

        Ok(groups)
    }

    /// Revokes `quantity` units from the line item identified by
    /// (reservation id, ticket code), crediting the same amount back to the
    /// ticket's quota. A line item reaching zero is deleted, and a booking
    /// losing its last line item is deleted with it.
    pub async fn revoke(
        &self,
        reservation_id: Uuid,
        ticket_code: &str,
        quantity: i32,
    ) -> Result<Vec<BookedTicketLine>, AppError> {
        info!(
            reservation_id = %reservation_id,
            ticket_code,
            quantity,
            "Revoking booked tickets"
        );

        let mut tx = self.pool.begin().await?;

        let line = sqlx::query_as::<_, LineForRevoke>(
            "SELECT bt.id, bt.booking_id, bt.quantity, bt.ticket_id \
             FROM booked_tickets bt \
             JOIN tickets t ON t.id = bt.ticket_id \
             WHERE bt.booking_id = $1 AND t.code = $2 \
             FOR UPDATE",
        )
        .bind(reservation_id)
        .bind(ticket_code)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(line) = line else {
            warn!(reservation_id = %reservation_id, ticket_code, "Booked line not found");
            return Err(AppError::NotFound(format!(
                "BookedTicketId '{reservation_id}' with TicketCode '{ticket_code}' not found."
            )));
        };

        if quantity > line.quantity {
            warn!(
                requested = quantity,
                booked = line.quantity,
                "Revoke quantity exceeds booked quantity"
            );
            return Err(AppError::validation(format!(
                "Cannot revoke {quantity} tickets. Only {} are booked.",
                line.quantity
            )));
        }

        let remaining_quantity = line.quantity - quantity;
        if remaining_quantity == 0 {
            sqlx::query("DELETE FROM booked_tickets WHERE id = $1")
                .bind(line.id)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query("UPDATE booked_tickets SET quantity = $1 WHERE id = $2")
                .bind(remaining_quantity)
                .bind(line.id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE tickets SET quota = quota + $1 WHERE id = $2")
            .bind(quantity)
            .bind(line.ticket_id)
            .execute(&mut *tx)
            .await?;

        let remaining = sqlx::query_as::<_, RemainingLine>(
            "SELECT t.code, t.name, bt.quantity, c.name AS category_name \
             FROM booked_tickets bt \
             JOIN tickets t ON t.id = bt.ticket_id \
             JOIN categories c ON c.id = t.category_id \
             WHERE bt.booking_id = $1",
        )
        .bind(line.booking_id)
        .fetch_all(&mut *tx)
        .await?;

        if remaining.is_empty() {
            info!(booking_id = %line.booking_id, "Last line item revoked, removing booking");
            sqlx::query("DELETE FROM bookings WHERE id = $1")
                .bind(line.booking_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(remaining = remaining.len(), "Revocation committed");
        Ok(remaining
            .into_iter()
            .map(|l| BookedTicketLine {
                ticket_code: l.code,
                ticket_name: l.name,
                quantity: l.quantity,
                category_name: l.category_name,
            })
            .collect())
    }

    /// Applies a batch of quantity edits to the line items of a reservation.
    ///
    /// Changes are processed in request order and the first failure aborts
    /// the whole batch with nothing committed. An accepted line sets its new
    /// quantity and recomputes the ticket's quota as `current quota − new
    /// quantity` from a fresh read inside the transaction — deliberately not
    /// a delta against the previously reserved amount.
    pub async fn edit(
        &self,
        reservation_id: Uuid,
        changes: Vec<EditBookedTicketRequest>,
    ) -> Result<Vec<BookedTicketLine>, AppError> {
        info!(reservation_id = %reservation_id, count = changes.len(), "Editing booked tickets");

        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, LineForEdit>(
            "SELECT bt.id, bt.quantity, t.code \
             FROM booked_tickets bt \
             JOIN tickets t ON t.id = bt.ticket_id \
             WHERE bt.booking_id = $1 \
             FOR UPDATE",
        )
        .bind(reservation_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            warn!(reservation_id = %reservation_id, "Booked ticket not found");
            return Err(AppError::NotFound(format!(
                "BookedTicketId '{reservation_id}' not found."
            )));
        }

        let mut updated = Vec::new();

        for change in &changes {
            let Some(line) = lines.iter().find(|l| l.code == change.ticket_code) else {
                warn!(code = %change.ticket_code, "Ticket code not part of this booking");
                return Err(AppError::NotFound(format!(
                    "TicketCode '{}' not found in BookedTicket.",
                    change.ticket_code
                )));
            };

            if change.quantity < 1 {
                warn!(code = %change.ticket_code, quantity = change.quantity, "Invalid quantity");
                return Err(AppError::validation(format!(
                    "Quantity for TicketCode '{}' must be at least 1.",
                    change.ticket_code
                )));
            }

            let ticket = Self::fetch_ticket_for_edit(&mut tx, &change.ticket_code).await?;

            let Some(ticket) = ticket else {
                warn!(code = %change.ticket_code, "Ticket missing from catalog");
                return Err(AppError::NotFound(format!(
                    "TicketCode '{}' not found in Tickets table.",
                    change.ticket_code
                )));
            };

            if change.quantity > ticket.quota {
                warn!(
                    code = %change.ticket_code,
                    requested = change.quantity,
                    quota = ticket.quota,
                    "Requested quantity exceeds available quota"
                );
                return Err(AppError::validation(format!(
                    "Quantity for TicketCode '{}' exceeds available quota ({}).",
                    change.ticket_code, ticket.quota
                )));
            }

            sqlx::query("UPDATE booked_tickets SET quantity = $1 WHERE id = $2")
                .bind(change.quantity)
                .bind(line.id)
                .execute(&mut *tx)
                .await?;

            sqlx::query("UPDATE tickets SET quota = $1 WHERE id = $2")
                .bind(ticket.quota - change.quantity)
                .bind(ticket.id)
                .execute(&mut *tx)
                .await?;

            info!(
                code = %ticket.code,
                quantity = change.quantity,
                quota = ticket.quota - change.quantity,
                "Line item updated"
            );

            updated.push(BookedTicketLine {
                ticket_code: ticket.code,
                ticket_name: ticket.name,
                quantity: change.quantity,
                category_name: ticket.category_name,
            });
        }

        tx.commit().await?;

        info!(reservation_id = %reservation_id, "Edit committed");
        Ok(updated)
    }

    /// Current catalog state of a ticket, read fresh inside the transaction
    /// so each edit line sees the quota left by the lines before it.
    async fn fetch_ticket_for_edit(
        tx: &mut Transaction<'_, Postgres>,
        ticket_code: &str,
    ) -> Result<Option<TicketForEdit>, AppError> {
        let ticket = sqlx::query_as::<_, TicketForEdit>(
            "SELECT t.id, t.code, t.name, t.quota, c.name AS category_name \
             FROM tickets t \
             JOIN categories c ON c.id = t.category_id \
             WHERE t.code = $1 \
             FOR UPDATE OF t",
        )
        .bind(ticket_code)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(ticket)
    }
}

/// Groups accepted reservation lines by category, preserving first-seen
/// category order, with per-category and total price as unit price ×
/// quantity.
fn summarize_reservation(lines: &[(TicketForReserve, i32)]) -> ReservationSummary {
    let mut groups: Vec<CategoryReservation> = Vec::new();

    for (ticket, quantity) in lines {
        let line_price = ticket.price * Decimal::from(*quantity);
        let entry = ReservedTicketLine {
            ticket_code: ticket.code.clone(),
            ticket_name: ticket.name.clone(),
            price: ticket.price,
            quantity: *quantity,
        };
        match groups
            .iter_mut()
            .find(|g| g.category_name == ticket.category_name)
        {
            Some(group) => {
                group.summary_price += line_price;
                group.tickets.push(entry);
            }
            None => groups.push(CategoryReservation {
                category_name: ticket.category_name.clone(),
                summary_price: line_price,
                tickets: vec![entry],
            }),
        }
    }

    let price_summary = groups.iter().map(|g| g.summary_price).sum();
    ReservationSummary {
        price_summary,
        tickets_per_categories: groups,
    }
}
