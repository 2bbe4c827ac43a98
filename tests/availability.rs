mod common;

use chrono::{Duration, Utc};
use entrada_server::services::ticket::{AddTicketRequest, AvailableTicketParams};
use entrada_server::services::TicketService;
use entrada_server::utils::error::AppError;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use common::{seed_category, seed_ticket, seed_ticket_at, ticket_quota};

#[sqlx::test]
async fn excludes_tickets_with_no_quota(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;
    seed_ticket(&pool, category, "IN-STOCK", Decimal::new(1000, 2), 5).await;
    seed_ticket(&pool, category, "SOLD-OUT", Decimal::new(1000, 2), 0).await;

    let list = TicketService::new(pool.clone())
        .available_tickets(AvailableTicketParams::default())
        .await
        .expect("listing should succeed");

    assert_eq!(list.total_tickets, 1);
    assert_eq!(list.tickets.len(), 1);
    assert_eq!(list.tickets[0].ticket_code, "IN-STOCK");
}

#[sqlx::test]
async fn filters_by_category_substring_case_insensitively(pool: PgPool) {
    let concerts = seed_category(&pool, "Concert").await;
    let sports = seed_category(&pool, "Sports").await;
    seed_ticket(&pool, concerts, "ROCK-1", Decimal::new(1000, 2), 5).await;
    seed_ticket(&pool, sports, "CUP-1", Decimal::new(1000, 2), 5).await;

    let list = TicketService::new(pool.clone())
        .available_tickets(AvailableTicketParams {
            category_name: Some("cert".to_string()),
            ..Default::default()
        })
        .await
        .expect("listing should succeed");

    assert_eq!(list.total_tickets, 1);
    assert_eq!(list.tickets[0].category_name, "Concert");
}

#[sqlx::test]
async fn filters_by_maximum_price_inclusive(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;
    seed_ticket(&pool, category, "CHEAP", Decimal::new(1000, 2), 5).await;
    seed_ticket(&pool, category, "EXACT", Decimal::new(2500, 2), 5).await;
    seed_ticket(&pool, category, "PRICEY", Decimal::new(9000, 2), 5).await;

    let list = TicketService::new(pool.clone())
        .available_tickets(AvailableTicketParams {
            price: Some(Decimal::new(2500, 2)),
            ..Default::default()
        })
        .await
        .expect("listing should succeed");

    assert_eq!(list.total_tickets, 2);
    let codes: Vec<_> = list.tickets.iter().map(|t| t.ticket_code.as_str()).collect();
    assert_eq!(codes, vec!["CHEAP", "EXACT"]);
}

#[sqlx::test]
async fn filters_by_event_date_range_inclusive(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;
    let base = Utc::now() + Duration::days(10);
    seed_ticket_at(&pool, category, "EARLY", Decimal::new(1000, 2), 5, base).await;
    seed_ticket_at(
        &pool,
        category,
        "MIDDLE",
        Decimal::new(1000, 2),
        5,
        base + Duration::days(5),
    )
    .await;
    seed_ticket_at(
        &pool,
        category,
        "LATE",
        Decimal::new(1000, 2),
        5,
        base + Duration::days(20),
    )
    .await;

    let list = TicketService::new(pool.clone())
        .available_tickets(AvailableTicketParams {
            min_event_date: Some((base + Duration::days(1)).format("%d-%m-%Y %H:%M").to_string()),
            max_event_date: Some((base + Duration::days(6)).format("%d-%m-%Y %H:%M").to_string()),
            ..Default::default()
        })
        .await
        .expect("listing should succeed");

    assert_eq!(list.total_tickets, 1);
    assert_eq!(list.tickets[0].ticket_code, "MIDDLE");
}

#[sqlx::test]
async fn rejects_malformed_date_bounds(pool: PgPool) {
    let err = TicketService::new(pool.clone())
        .available_tickets(AvailableTicketParams {
            min_event_date: Some("2026-02-01".to_string()),
            ..Default::default()
        })
        .await
        .expect_err("ISO input does not match the wire format");

    assert!(matches!(err, AppError::Validation { .. }));
}

#[sqlx::test]
async fn sorts_by_price_descending(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;
    seed_ticket(&pool, category, "A", Decimal::new(3000, 2), 5).await;
    seed_ticket(&pool, category, "B", Decimal::new(9000, 2), 5).await;
    seed_ticket(&pool, category, "C", Decimal::new(1000, 2), 5).await;

    let list = TicketService::new(pool.clone())
        .available_tickets(AvailableTicketParams {
            order_by: Some("price".to_string()),
            order_state: Some("DESC".to_string()),
            ..Default::default()
        })
        .await
        .expect("listing should succeed");

    let prices: Vec<_> = list.tickets.iter().map(|t| t.price).collect();
    let mut sorted = prices.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(prices, sorted);
}

#[sqlx::test]
async fn default_sort_is_ticket_code_ascending(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;
    seed_ticket(&pool, category, "CHARLIE", Decimal::new(1000, 2), 5).await;
    seed_ticket(&pool, category, "ALPHA", Decimal::new(1000, 2), 5).await;
    seed_ticket(&pool, category, "BRAVO", Decimal::new(1000, 2), 5).await;

    let list = TicketService::new(pool.clone())
        .available_tickets(AvailableTicketParams::default())
        .await
        .expect("listing should succeed");

    let codes: Vec<_> = list.tickets.iter().map(|t| t.ticket_code.as_str()).collect();
    assert_eq!(codes, vec!["ALPHA", "BRAVO", "CHARLIE"]);
}

#[sqlx::test]
async fn paginates_and_reports_full_total(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;
    for code in ["A-1", "A-2", "A-3"] {
        seed_ticket(&pool, category, code, Decimal::new(1000, 2), 5).await;
    }

    let list = TicketService::new(pool.clone())
        .available_tickets(AvailableTicketParams {
            page: Some(2),
            page_size: Some(2),
            ..Default::default()
        })
        .await
        .expect("listing should succeed");

    assert_eq!(list.total_tickets, 3);
    assert_eq!(list.tickets.len(), 1);
    assert_eq!(list.tickets[0].ticket_code, "A-3");
}

#[sqlx::test]
async fn unmatched_filters_return_empty_page_not_an_error(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;
    seed_ticket(&pool, category, "ROCK-1", Decimal::new(1000, 2), 5).await;

    let list = TicketService::new(pool.clone())
        .available_tickets(AvailableTicketParams {
            ticket_name: Some("does-not-exist".to_string()),
            ..Default::default()
        })
        .await
        .expect("no match is not an error");

    assert_eq!(list.total_tickets, 0);
    assert!(list.tickets.is_empty());
}

fn add_request(category_id: Uuid, code: &str) -> AddTicketRequest {
    AddTicketRequest {
        category_id,
        ticket_code: code.to_string(),
        ticket_name: format!("{code} ticket"),
        event_date: "01-02-2027 13:00".to_string(),
        price: Decimal::new(1500, 2),
        quota: 25,
    }
}

#[sqlx::test]
async fn admin_add_ticket_persists_the_catalog_entry(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;

    let created = TicketService::new(pool.clone())
        .add_ticket(add_request(category, "NEW-1"))
        .await
        .expect("add should succeed");

    assert_eq!(created.ticket_code, "NEW-1");
    assert_eq!(created.event_date, "01-02-2027 13:00");
    assert_eq!(ticket_quota(&pool, "NEW-1").await, 25);
}

#[sqlx::test]
async fn admin_add_ticket_rejects_duplicate_code(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;
    seed_ticket(&pool, category, "NEW-1", Decimal::new(1000, 2), 5).await;

    let err = TicketService::new(pool.clone())
        .add_ticket(add_request(category, "NEW-1"))
        .await
        .expect_err("duplicate code");

    match err {
        AppError::Validation { detail, .. } => {
            assert_eq!(detail, "TicketCode 'NEW-1' already exists.");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[sqlx::test]
async fn admin_add_ticket_rejects_unknown_category(pool: PgPool) {
    let err = TicketService::new(pool.clone())
        .add_ticket(add_request(Uuid::new_v4(), "NEW-1"))
        .await
        .expect_err("unknown category");

    assert!(matches!(err, AppError::Validation { .. }));
}

#[sqlx::test]
async fn admin_add_ticket_rejects_bad_date_price_and_quota(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;
    let service = TicketService::new(pool.clone());

    let mut bad_date = add_request(category, "NEW-1");
    bad_date.event_date = "February 1st".to_string();
    assert!(matches!(
        service.add_ticket(bad_date).await,
        Err(AppError::Validation { .. })
    ));

    let mut bad_price = add_request(category, "NEW-2");
    bad_price.price = Decimal::ZERO;
    assert!(matches!(
        service.add_ticket(bad_price).await,
        Err(AppError::Validation { .. })
    ));

    let mut bad_quota = add_request(category, "NEW-3");
    bad_quota.quota = 0;
    assert!(matches!(
        service.add_ticket(bad_quota).await,
        Err(AppError::Validation { .. })
    ));
}

#[sqlx::test]
async fn admin_delete_removes_an_unbooked_ticket(pool: PgPool) {
    let category = seed_category(&pool, "Concert").await;
    let ticket_id = seed_ticket(&pool, category, "NEW-1", Decimal::new(1000, 2), 5).await;

    TicketService::new(pool.clone())
        .delete_ticket(ticket_id)
        .await
        .expect("delete should succeed");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test]
async fn admin_delete_unknown_ticket_is_not_found(pool: PgPool) {
    let err = TicketService::new(pool.clone())
        .delete_ticket(Uuid::new_v4())
        .await
        .expect_err("unknown ticket id");

    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test]
async fn admin_delete_rejects_ticket_with_live_bookings(pool: PgPool) {
    use entrada_server::services::booking::ReserveTicketRequest;
    use entrada_server::services::BookingService;

    let category = seed_category(&pool, "Concert").await;
    let ticket_id = seed_ticket(&pool, category, "BOOKED", Decimal::new(1000, 2), 5).await;
    BookingService::new(pool.clone())
        .reserve(vec![ReserveTicketRequest {
            ticket_code: "BOOKED".to_string(),
            quantity: 1,
        }])
        .await
        .expect("reservation should succeed");

    let err = TicketService::new(pool.clone())
        .delete_ticket(ticket_id)
        .await
        .expect_err("ticket has a live booked line");

    assert!(matches!(err, AppError::Validation { .. }));
}
