use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Category, Ticket};
use crate::utils::datetime::{format_event_date, parse_event_date};
use crate::utils::error::AppError;

const DEFAULT_PAGE_SIZE: i64 = 10;

/// Query parameters of the availability listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTicketParams {
    pub category_name: Option<String>,
    pub ticket_code: Option<String>,
    pub ticket_name: Option<String>,
    /// Maximum price, inclusive.
    pub price: Option<Decimal>,
    /// Inclusive lower event-date bound, `dd-MM-yyyy HH:mm`.
    pub min_event_date: Option<String>,
    /// Inclusive upper event-date bound, `dd-MM-yyyy HH:mm`.
    pub max_event_date: Option<String>,
    pub order_by: Option<String>,
    pub order_state: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTicketList {
    pub tickets: Vec<AvailableTicket>,
    pub total_tickets: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTicket {
    pub ticket_code: String,
    pub ticket_name: String,
    pub category_name: String,
    pub event_date: String,
    pub price: Decimal,
    pub quota: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTicketRequest {
    pub category_id: Uuid,
    pub ticket_code: String,
    pub ticket_name: String,
    /// `dd-MM-yyyy HH:mm`
    pub event_date: String,
    pub price: Decimal,
    pub quota: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTicket {
    pub message: String,
    pub ticket_id: Uuid,
    pub category_id: Uuid,
    pub ticket_code: String,
    pub ticket_name: String,
    pub event_date: String,
    pub price: Decimal,
    pub quota: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedTicket {
    pub message: String,
    pub ticket_id: Uuid,
}

#[derive(Debug, FromRow)]
struct AvailableTicketRow {
    code: String,
    name: String,
    category_name: String,
    event_date: DateTime<Utc>,
    price: Decimal,
    quota: i32,
}

/// Sort keys accepted by the availability listing. Parsed from a closed
/// set so user input never reaches the ORDER BY clause directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    EventDate,
    Quota,
    TicketCode,
    TicketName,
    CategoryName,
    Price,
}

impl SortKey {
    fn parse(input: Option<&str>) -> Self {
        match input.map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("eventdate") => SortKey::EventDate,
            Some("quota") => SortKey::Quota,
            Some("ticketcode") => SortKey::TicketCode,
            Some("ticketname") => SortKey::TicketName,
            Some("categoryname") => SortKey::CategoryName,
            Some("price") => SortKey::Price,
            _ => SortKey::TicketCode,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortKey::EventDate => "t.event_date",
            SortKey::Quota => "t.quota",
            SortKey::TicketCode => "t.code",
            SortKey::TicketName => "t.name",
            SortKey::CategoryName => "c.name",
            SortKey::Price => "t.price",
        }
    }
}

fn is_descending(order_state: Option<&str>) -> bool {
    order_state.map(|s| s.eq_ignore_ascii_case("DESC")).unwrap_or(false)
}

/// Filters shared between the count and the page query.
struct AvailabilityFilter {
    category_name: Option<String>,
    ticket_code: Option<String>,
    ticket_name: Option<String>,
    max_price: Option<Decimal>,
    min_event_date: Option<DateTime<Utc>>,
    max_event_date: Option<DateTime<Utc>>,
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &AvailabilityFilter) {
    builder.push(" WHERE t.quota > 0");
    if let Some(name) = &filter.category_name {
        builder.push(" AND c.name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(code) = &filter.ticket_code {
        builder.push(" AND t.code ILIKE ").push_bind(format!("%{code}%"));
    }
    if let Some(name) = &filter.ticket_name {
        builder.push(" AND t.name ILIKE ").push_bind(format!("%{name}%"));
    }
    if let Some(price) = filter.max_price {
        builder.push(" AND t.price <= ").push_bind(price);
    }
    if let Some(min) = filter.min_event_date {
        builder.push(" AND t.event_date >= ").push_bind(min);
    }
    if let Some(max) = filter.max_event_date {
        builder.push(" AND t.event_date <= ").push_bind(max);
    }
}

/// Catalog read path and admin mutations.
#[derive(Clone)]
pub struct TicketService {
    pool: PgPool,
}

impl TicketService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Filtered, sorted, paginated listing of tickets with quota left.
    /// Read-only; runs on the pool outside any transaction. Unmatched
    /// filters yield an empty page with a total of 0.
    pub async fn available_tickets(
        &self,
        params: AvailableTicketParams,
    ) -> Result<AvailableTicketList, AppError> {
        info!(?params, "Fetching available tickets");

        let filter = AvailabilityFilter {
            category_name: params.category_name,
            ticket_code: params.ticket_code,
            ticket_name: params.ticket_name,
            max_price: params.price,
            min_event_date: parse_date_param(params.min_event_date.as_deref())?,
            max_event_date: parse_date_param(params.max_event_date.as_deref())?,
        };

        let sort_key = SortKey::parse(params.order_by.as_deref());
        let descending = is_descending(params.order_state.as_deref());
        let page = params.page.unwrap_or(1).max(1);
        let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

        let mut count_query = QueryBuilder::new(
            "SELECT COUNT(*) FROM tickets t JOIN categories c ON c.id = t.category_id",
        );
        push_filters(&mut count_query, &filter);
        let total_tickets: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut page_query = QueryBuilder::new(
            "SELECT t.code, t.name, c.name AS category_name, t.event_date, t.price, t.quota \
             FROM tickets t JOIN categories c ON c.id = t.category_id",
        );
        push_filters(&mut page_query, &filter);
        page_query
            .push(" ORDER BY ")
            .push(sort_key.column())
            .push(if descending { " DESC" } else { " ASC" })
            .push(" OFFSET ")
            .push_bind((page - 1) * page_size)
            .push(" LIMIT ")
            .push_bind(page_size);

        let rows = page_query
            .build_query_as::<AvailableTicketRow>()
            .fetch_all(&self.pool)
            .await?;

        info!(total_tickets, returned = rows.len(), "Availability query completed");

        Ok(AvailableTicketList {
            tickets: rows
                .into_iter()
                .map(|row| AvailableTicket {
                    ticket_code: row.code,
                    ticket_name: row.name,
                    category_name: row.category_name,
                    event_date: format_event_date(row.event_date),
                    price: row.price,
                    quota: row.quota,
                })
                .collect(),
            total_tickets,
        })
    }

    /// Admin creation of a catalog entry.
    pub async fn add_ticket(&self, request: AddTicketRequest) -> Result<CreatedTicket, AppError> {
        info!(ticket_name = %request.ticket_name, "Adding ticket to catalog");

        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
                .bind(request.category_id)
                .fetch_optional(&self.pool)
                .await?;
        let Some(category) = category else {
            warn!(category_id = %request.category_id, "Category not found");
            return Err(AppError::validation(format!(
                "CategoryId '{}' not found.",
                request.category_id
            )));
        };

        let code_taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tickets WHERE code = $1)")
                .bind(&request.ticket_code)
                .fetch_one(&self.pool)
                .await?;
        if code_taken {
            warn!(code = %request.ticket_code, "Ticket code already exists");
            return Err(AppError::validation(format!(
                "TicketCode '{}' already exists.",
                request.ticket_code
            )));
        }

        let Some(event_date) = parse_event_date(&request.event_date) else {
            return Err(AppError::validation(
                "Invalid date format. Use 'dd-MM-yyyy HH:mm' (e.g., 01-02-2026 13:00).",
            ));
        };

        if request.price <= Decimal::ZERO {
            return Err(AppError::validation("Price must be greater than 0."));
        }

        if request.quota <= 0 {
            return Err(AppError::validation("Quota must be greater than 0."));
        }

        let ticket = Ticket {
            id: Uuid::new_v4(),
            category_id: category.id,
            code: request.ticket_code,
            name: request.ticket_name,
            event_date,
            price: request.price,
            quota: request.quota,
        };
        sqlx::query(
            "INSERT INTO tickets (id, category_id, code, name, event_date, price, quota) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(ticket.id)
        .bind(ticket.category_id)
        .bind(&ticket.code)
        .bind(&ticket.name)
        .bind(ticket.event_date)
        .bind(ticket.price)
        .bind(ticket.quota)
        .execute(&self.pool)
        .await?;

        info!(ticket_id = %ticket.id, code = %ticket.code, "Ticket added");

        Ok(CreatedTicket {
            message: "Ticket added successfully".to_string(),
            ticket_id: ticket.id,
            category_id: ticket.category_id,
            ticket_code: ticket.code,
            ticket_name: ticket.name,
            event_date: format_event_date(ticket.event_date),
            price: ticket.price,
            quota: ticket.quota,
        })
    }

    /// Admin deletion of a catalog entry. A ticket still referenced by live
    /// booked lines cannot be deleted.
    pub async fn delete_ticket(&self, ticket_id: Uuid) -> Result<DeletedTicket, AppError> {
        info!(ticket_id = %ticket_id, "Deleting ticket from catalog");

        let ticket = sqlx::query_as::<_, Ticket>(
            "SELECT id, category_id, code, name, event_date, price, quota \
             FROM tickets WHERE id = $1",
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;
        let Some(ticket) = ticket else {
            warn!(ticket_id = %ticket_id, "Ticket not found");
            return Err(AppError::NotFound(format!(
                "TicketId '{ticket_id}' not found."
            )));
        };

        let has_bookings: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM booked_tickets WHERE ticket_id = $1)")
                .bind(ticket_id)
                .fetch_one(&self.pool)
                .await?;
        if has_bookings {
            warn!(ticket_id = %ticket_id, "Ticket has active bookings");
            return Err(AppError::validation(format!(
                "TicketId '{ticket_id}' has active bookings and cannot be deleted."
            )));
        }

        sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(ticket.id)
            .execute(&self.pool)
            .await?;

        info!(ticket_id = %ticket.id, code = %ticket.code, "Ticket deleted");

        Ok(DeletedTicket {
            message: "Ticket deleted successfully".to_string(),
            ticket_id: ticket.id,
        })
    }
}

fn parse_date_param(input: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    match input {
        None => Ok(None),
        Some(raw) => parse_event_date(raw).map(Some).ok_or_else(|| {
            AppError::validation("Invalid date format. Use 'dd-MM-yyyy HH:mm' (e.g., 01-02-2026 13:00).")
        }),
    }
}
