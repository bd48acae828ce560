use std::sync::Arc;

use axum::http::{Request, StatusCode};
use crm_config::load_layered_yaml_from_strings;
use crm_daemon::{routes, state};
use crm_db::MemoryStore;
use http_body_util::BodyExt;
use tower::ServiceExt;

async fn send(
    st: &Arc<state::AppState>,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(b.to_string())),
        None => builder.body(axum::body::Body::empty()),
    }
    .unwrap();
    let resp = routes::build_router(Arc::clone(st))
        .oneshot(req)
        .await
        .expect("oneshot failed");
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn dashboard_counts_follow_configured_threshold() {
    let cfg = load_layered_yaml_from_strings(&["dashboard:\n  low_stock_threshold: 3\n"])
        .unwrap()
        .settings()
        .unwrap();
    let st = Arc::new(state::AppState::from_config(Arc::new(MemoryStore::new()), &cfg).unwrap());

    for (name, qty) in [("Crate", 2), ("Leash", 3), ("Bowl", 0)] {
        send(
            &st,
            "POST",
            "/api/inventory",
            Some(serde_json::json!({ "name": name, "quantity": qty })),
        )
        .await;
    }
    send(
        &st,
        "POST",
        "/api/orders",
        Some(serde_json::json!({ "order_number": "ORD-1", "total_amount": 40.5 })),
    )
    .await;
    send(
        &st,
        "POST",
        "/api/orders",
        Some(serde_json::json!({ "order_number": "ORD-2", "status": "delivered" })),
    )
    .await;
    send(
        &st,
        "POST",
        "/api/quotes",
        Some(serde_json::json!({ "quote_number": "DPT-1", "status": "sent" })),
    )
    .await;
    send(
        &st,
        "POST",
        "/api/employees",
        Some(serde_json::json!({ "name": "Sam", "is_active": false })),
    )
    .await;

    let (status, dash) = send(&st, "GET", "/api/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dash["low_stock_items"], 2);
    assert_eq!(dash["pending_orders"], 1);
    assert_eq!(dash["active_quotes"], 1);
    assert_eq!(dash["active_employees"], 0);
    assert_eq!(dash["total_revenue"].as_f64(), Some(40.5));
    assert_eq!(dash["recent_orders"].as_array().unwrap().len(), 2);
    assert_eq!(dash["recent_orders"][0]["order_number"], "ORD-2");
}

#[tokio::test]
async fn todays_schedules_use_business_date() {
    let st = Arc::new(state::AppState::new(Arc::new(MemoryStore::new())));
    let today = chrono::Utc::now().date_naive();
    let far = today + chrono::Duration::days(30);

    for date in [today, far] {
        send(
            &st,
            "POST",
            "/api/schedules",
            Some(serde_json::json!({ "scheduled_date": date.to_string() })),
        )
        .await;
    }

    let (_, dash) = send(&st, "GET", "/api/dashboard", None).await;
    assert_eq!(dash["todays_schedules"], 1);
    assert_eq!(dash["pending_schedules"], 2);
}
