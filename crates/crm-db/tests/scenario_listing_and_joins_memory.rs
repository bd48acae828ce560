use crm_db::{MemoryStore, Store};
use crm_schemas::{
    CustomerInput, EmployeeInput, NewSchedule, OrderInput, QuoteInput, ScheduleInput,
    ScheduleStatus,
};

fn schedule(v: serde_json::Value) -> NewSchedule {
    serde_json::from_value::<ScheduleInput>(v)
        .unwrap()
        .validate()
        .unwrap()
}

#[tokio::test]
async fn lists_are_newest_first() {
    let store = MemoryStore::new();
    for name in ["Ada", "Grace", "Linus"] {
        let c: CustomerInput = serde_json::from_value(serde_json::json!({ "name": name })).unwrap();
        store.create_customer(&c.validate().unwrap()).await.unwrap();
    }
    let names: Vec<String> = store
        .list_customers()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Linus", "Grace", "Ada"]);
}

#[tokio::test]
async fn display_names_resolve_at_read_time_and_go_null_after_delete() {
    let store = MemoryStore::new();
    let c: CustomerInput = serde_json::from_value(serde_json::json!({ "name": "Ada" })).unwrap();
    let customer = store.create_customer(&c.validate().unwrap()).await.unwrap();

    let q: QuoteInput = serde_json::from_value(serde_json::json!({
        "quote_number": "DPT-1",
        "customer_id": customer.id,
    }))
    .unwrap();
    store.create_quote(&q.validate().unwrap()).await.unwrap();

    let quotes = store.list_quotes().await.unwrap();
    assert_eq!(quotes[0].customer_name.as_deref(), Some("Ada"));

    let renamed: CustomerInput =
        serde_json::from_value(serde_json::json!({ "name": "Ada Lovelace" })).unwrap();
    store
        .update_customer(customer.id, &renamed.validate().unwrap())
        .await
        .unwrap();
    let quotes = store.list_quotes().await.unwrap();
    assert_eq!(quotes[0].customer_name.as_deref(), Some("Ada Lovelace"));

    store.delete_customer(customer.id).await.unwrap();
    let quotes = store.list_quotes().await.unwrap();
    assert_eq!(quotes[0].customer_id, Some(customer.id));
    assert_eq!(quotes[0].customer_name, None);
}

#[tokio::test]
async fn schedules_join_employee_and_order() {
    let store = MemoryStore::new();
    let e: EmployeeInput = serde_json::from_value(serde_json::json!({ "name": "Sam" })).unwrap();
    let emp = store.create_employee(&e.validate().unwrap()).await.unwrap();
    let o: OrderInput =
        serde_json::from_value(serde_json::json!({ "order_number": "ORD-9" })).unwrap();
    let order = store.create_order(&o.validate().unwrap()).await.unwrap();

    let s = store
        .create_schedule(&schedule(serde_json::json!({
            "employee_id": emp.id,
            "order_id": order.id,
            "scheduled_date": "2026-04-02",
            "scheduled_time": "09:30",
        })))
        .await
        .unwrap();

    assert_eq!(s.employee_name.as_deref(), Some("Sam"));
    assert_eq!(s.order_number.as_deref(), Some("ORD-9"));
}

#[tokio::test]
async fn completed_at_follows_status() {
    let store = MemoryStore::new();
    let s = store
        .create_schedule(&schedule(serde_json::json!({ "scheduled_date": "2026-04-02" })))
        .await
        .unwrap();
    assert_eq!(s.completed_at, None);

    let done = schedule(serde_json::json!({
        "scheduled_date": "2026-04-02",
        "status": "completed",
    }));
    let first = store.update_schedule(s.id, &done).await.unwrap().unwrap();
    let stamp = first.completed_at.expect("stamped on completion");

    let second = store.update_schedule(s.id, &done).await.unwrap().unwrap();
    assert_eq!(second.completed_at, Some(stamp));

    let reopened = schedule(serde_json::json!({
        "scheduled_date": "2026-04-02",
        "status": "in_progress",
    }));
    let third = store.update_schedule(s.id, &reopened).await.unwrap().unwrap();
    assert_eq!(third.status, ScheduleStatus::InProgress);
    assert_eq!(third.completed_at, None);
}

#[tokio::test]
async fn deletes_are_idempotent_and_updates_of_missing_rows_are_none() {
    let store = MemoryStore::new();
    store.delete_customer(42).await.unwrap();
    store.delete_schedule(42).await.unwrap();

    let c: CustomerInput = serde_json::from_value(serde_json::json!({ "name": "Ada" })).unwrap();
    assert!(store
        .update_customer(42, &c.validate().unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn duplicate_order_number_is_conflict() {
    let store = MemoryStore::new();
    let o: OrderInput =
        serde_json::from_value(serde_json::json!({ "order_number": "ORD-1" })).unwrap();
    let o = o.validate().unwrap();
    store.create_order(&o).await.unwrap();
    assert!(store.create_order(&o).await.unwrap_err().is_conflict());
}
