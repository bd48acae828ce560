//! Scenario: many concurrent saves of one quote as `accepted` create exactly
//! one order, on both backends.
//!
//! The Postgres case is ignored by default; run with CRM_DATABASE_URL set:
//!   CRM_DATABASE_URL=... cargo test -p crm-db --test scenario_concurrent_accept_fires_once -- --ignored

use std::sync::Arc;

use crm_db::{MemoryStore, PgStore, Store};
use crm_schemas::{NewQuote, QuoteInput};

const WRITERS: usize = 16;

fn quote(status: &str) -> NewQuote {
    serde_json::from_value::<QuoteInput>(serde_json::json!({
        "quote_number": "DPT-777777",
        "status": status,
        "travel_date": "2026-06-01",
        "flight_cost": 100,
        "boarding_cost": 50,
        "medical_cost": 25,
    }))
    .unwrap()
    .validate()
    .unwrap()
}

/// Fire `WRITERS` concurrent accepts at one quote; return how many reported
/// creating an order.
async fn race_accepts(store: Arc<dyn Store>, id: i64) -> usize {
    let mut tasks = Vec::with_capacity(WRITERS);
    for _ in 0..WRITERS {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            store
                .update_quote(id, &quote("accepted"))
                .await
                .expect("update failed")
                .expect("quote exists")
        }));
    }

    let mut fired = 0;
    for t in tasks {
        let out = t.await.expect("task panicked");
        if out.order.is_some() {
            fired += 1;
        }
    }
    fired
}

async fn assert_single_order(store: Arc<dyn Store>) {
    let q = store.create_quote(&quote("sent")).await.unwrap();

    let fired = race_accepts(Arc::clone(&store), q.id).await;
    assert_eq!(fired, 1, "exactly one writer creates the order");

    let orders = store.list_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order_number, "ORD-777777");

    let stored = store.get_quote(q.id).await.unwrap().expect("quote");
    assert_eq!(stored.order_id, Some(orders[0].id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_fire_once_in_memory() {
    assert_single_order(Arc::new(MemoryStore::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn concurrent_accepts_fire_once_in_postgres() {
    let pool = crm_db::testkit_db_pool().await.expect("db pool");
    sqlx::query("truncate customers, inventory_items, orders, employees, quotes, schedules restart identity")
        .execute(&pool)
        .await
        .expect("truncate");
    // Two pooled connections: writers contend for the quote row lock.
    assert_single_order(Arc::new(PgStore::new(pool))).await;
}
