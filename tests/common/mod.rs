#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn seed_category(pool: &PgPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await
        .expect("insert category");
    id
}

pub async fn seed_ticket_at(
    pool: &PgPool,
    category_id: Uuid,
    code: &str,
    price: Decimal,
    quota: i32,
    event_date: DateTime<Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO tickets (id, category_id, code, name, event_date, price, quota) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(id)
    .bind(category_id)
    .bind(code)
    .bind(format!("{code} ticket"))
    .bind(event_date)
    .bind(price)
    .bind(quota)
    .execute(pool)
    .await
    .expect("insert ticket");
    id
}

/// Ticket with an event 30 days out.
pub async fn seed_ticket(
    pool: &PgPool,
    category_id: Uuid,
    code: &str,
    price: Decimal,
    quota: i32,
) -> Uuid {
    seed_ticket_at(
        pool,
        category_id,
        code,
        price,
        quota,
        Utc::now() + Duration::days(30),
    )
    .await
}

pub async fn ticket_quota(pool: &PgPool, code: &str) -> i32 {
    sqlx::query_scalar("SELECT quota FROM tickets WHERE code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .expect("fetch quota")
}

pub async fn booking_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(pool)
        .await
        .expect("count bookings")
}

pub async fn line_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM booked_tickets")
        .fetch_one(pool)
        .await
        .expect("count booked tickets")
}

/// The id of the single booking expected to exist.
pub async fn only_booking_id(pool: &PgPool) -> Uuid {
    sqlx::query_scalar("SELECT id FROM bookings")
        .fetch_one(pool)
        .await
        .expect("exactly one booking")
}

pub async fn line_quantity(pool: &PgPool, booking_id: Uuid, code: &str) -> i32 {
    sqlx::query_scalar(
        "SELECT bt.quantity FROM booked_tickets bt \
         JOIN tickets t ON t.id = bt.ticket_id \
         WHERE bt.booking_id = $1 AND t.code = $2",
    )
    .bind(booking_id)
    .bind(code)
    .fetch_one(pool)
    .await
    .expect("fetch line quantity")
}
