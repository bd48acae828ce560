use crm_db::{PgStore, Store, UQ_ORDER_NUMBER};
use crm_schemas::{NewQuote, QuoteInput, QuoteStatus, ScheduleInput};
use rust_decimal::Decimal;

// DB-backed store tests.
//
// Ignored by default because they require a Postgres instance reachable via
// CRM_DATABASE_URL.
//
// Run:
//   CRM_DATABASE_URL=... cargo test -p crm-db --test scenario_pg_quote_promotion -- --ignored

async fn clean_store() -> PgStore {
    let pool = crm_db::testkit_db_pool().await.expect("db pool");
    sqlx::query("truncate customers, inventory_items, orders, employees, quotes, schedules restart identity")
        .execute(&pool)
        .await
        .expect("truncate");
    PgStore::new(pool)
}

fn quote(number: &str, status: &str) -> NewQuote {
    serde_json::from_value::<QuoteInput>(serde_json::json!({
        "quote_number": number,
        "status": status,
        "departure_city": "Denver",
        "destination_city": "Boston",
        "travel_date": "2026-06-01",
        "flight_cost": 100,
        "boarding_cost": 50,
        "medical_cost": 25,
        "additional_fees": 0,
    }))
    .unwrap()
    .validate()
    .unwrap()
}

#[tokio::test]
#[ignore]
async fn accept_creates_exactly_one_linked_order() {
    let store = clean_store().await;
    let q = store.create_quote(&quote("DPT-123456", "draft")).await.unwrap();
    assert_eq!(q.total_amount, Decimal::from(175));

    let out = store
        .update_quote(q.id, &quote("DPT-123456", "accepted"))
        .await
        .unwrap()
        .unwrap();
    let order = out.order.expect("order");
    assert_eq!(out.quote.order_id, Some(order.id));
    assert_eq!(order.order_number, "ORD-123456");
    assert_eq!(order.total_amount, Some(Decimal::from(175)));

    store
        .update_quote(q.id, &quote("DPT-123456", "accepted"))
        .await
        .unwrap();
    assert_eq!(store.list_orders().await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore]
async fn order_number_conflict_rolls_back_quote() {
    let store = clean_store().await;
    let first = store.create_quote(&quote("DPT-1", "sent")).await.unwrap();
    store.promote_quote(first.id).await.unwrap().unwrap();

    // Different quote number, same derived order number.
    let second = store.create_quote(&quote("ORD-1", "sent")).await.unwrap();
    let clash = quote("1", "accepted");
    let err = store.update_quote(second.id, &clash).await.unwrap_err();
    assert!(err.to_string().contains(UQ_ORDER_NUMBER));

    let stored = store.get_quote(second.id).await.unwrap().unwrap();
    assert_eq!(stored.status, QuoteStatus::Sent);
    assert_eq!(stored.quote_number, "ORD-1");
    assert_eq!(stored.order_id, None);
}

#[tokio::test]
#[ignore]
async fn schedule_completion_is_stamped_and_cleared() {
    let store = clean_store().await;
    let s: ScheduleInput = serde_json::from_str(r#"{"scheduled_date": "2026-04-02"}"#).unwrap();
    let s = store.create_schedule(&s.validate().unwrap()).await.unwrap();

    let done: ScheduleInput =
        serde_json::from_str(r#"{"scheduled_date": "2026-04-02", "status": "completed"}"#).unwrap();
    let done = done.validate().unwrap();
    let a = store.update_schedule(s.id, &done).await.unwrap().unwrap();
    let b = store.update_schedule(s.id, &done).await.unwrap().unwrap();
    assert!(a.completed_at.is_some());
    assert_eq!(a.completed_at, b.completed_at);

    let open: ScheduleInput =
        serde_json::from_str(r#"{"scheduled_date": "2026-04-02", "status": "scheduled"}"#).unwrap();
    let c = store
        .update_schedule(s.id, &open.validate().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(c.completed_at, None);
}
