//! Axum router and all HTTP handlers for crm-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Every handler decodes leniently, validates into a
//! `New*` value, calls the store, then announces the change on the bus.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post, put},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crm_schemas::{
    summarize, Customer, CustomerInput, DashboardSnapshot, DashboardSummary, Employee,
    EmployeeInput, InventoryItem, InventoryItemInput, Order, OrderInput, Quote, QuoteEmail,
    QuoteInput, Schedule, ScheduleInput,
};

use crate::{
    api_types::{ApiError, DeleteResponse, HealthResponse, PromoteResponse},
    state::{uptime_secs, AppState, BusMsg, ChangeAction},
};

type ApiResult<T> = Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/stream", get(stream))
        .route("/api/dashboard", get(dashboard))
        .route("/api/customers", get(list_customers).post(create_customer))
        .route(
            "/api/customers/:id",
            put(update_customer).delete(delete_customer),
        )
        .route("/api/inventory", get(list_inventory).post(create_inventory_item))
        .route(
            "/api/inventory/:id",
            put(update_inventory_item).delete(delete_inventory_item),
        )
        .route("/api/orders", get(list_orders).post(create_order))
        .route("/api/orders/:id", put(update_order).delete(delete_order))
        .route("/api/employees", get(list_employees).post(create_employee))
        .route(
            "/api/employees/:id",
            put(update_employee).delete(delete_employee),
        )
        .route("/api/quotes", get(list_quotes).post(create_quote))
        .route("/api/quotes/:id", put(update_quote).delete(delete_quote))
        .route("/api/quotes/:id/promote", post(promote_quote))
        .route("/api/quotes/:id/email", get(quote_email))
        .route("/api/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/api/schedules/:id",
            put(update_schedule).delete(delete_schedule),
        )
        .with_state(state)
}

/// CORS: any origin; the browser client only sends JSON bodies.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

// ---------------------------------------------------------------------------
// Extraction helpers
// ---------------------------------------------------------------------------

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(v)| v)
        .map_err(|r| ApiError::BadRequest(r.body_text()))
}

fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|r| ApiError::BadRequest(r.body_text()))
}

fn deleted() -> ApiResult<DeleteResponse> {
    Ok(Json(DeleteResponse { success: true }))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let store_ok = st.store.ping().await.is_ok();
    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthResponse {
            ok: store_ok,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
            store_ok,
            uptime_secs: uptime_secs(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /api/dashboard
// ---------------------------------------------------------------------------

pub(crate) async fn dashboard(State(st): State<Arc<AppState>>) -> ApiResult<DashboardSummary> {
    let s = &st.store;
    let (customers, orders, quotes, inventory, employees, schedules) = tokio::try_join!(
        s.list_customers(),
        s.list_orders(),
        s.list_quotes(),
        s.list_inventory(),
        s.list_employees(),
        s.list_schedules(),
    )?;

    let today = st.today();
    let snap = DashboardSnapshot {
        customers: &customers,
        orders: &orders,
        quotes: &quotes,
        inventory: &inventory,
        employees: &employees,
        schedules: &schedules,
    };
    Ok(Json(summarize(snap, today, &st.dashboard)))
}

// ---------------------------------------------------------------------------
// /api/customers
// ---------------------------------------------------------------------------

pub(crate) async fn list_customers(State(st): State<Arc<AppState>>) -> ApiResult<Vec<Customer>> {
    Ok(Json(st.store.list_customers().await?))
}

pub(crate) async fn create_customer(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<CustomerInput>, JsonRejection>,
) -> ApiResult<Customer> {
    let new = body(payload)?.validate()?;
    let row = st.store.create_customer(&new).await?;
    info!(id = row.id, "customer created");
    st.publish("customer", row.id, ChangeAction::Created);
    Ok(Json(row))
}

pub(crate) async fn update_customer(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CustomerInput>, JsonRejection>,
) -> ApiResult<Customer> {
    let id = path_id(path)?;
    let new = body(payload)?.validate()?;
    let row = st
        .store
        .update_customer(id, &new)
        .await?
        .ok_or(ApiError::NotFound { entity: "customer", id })?;
    st.publish("customer", id, ChangeAction::Updated);
    Ok(Json(row))
}

pub(crate) async fn delete_customer(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeleteResponse> {
    let id = path_id(path)?;
    st.store.delete_customer(id).await?;
    st.publish("customer", id, ChangeAction::Deleted);
    deleted()
}

// ---------------------------------------------------------------------------
// /api/inventory
// ---------------------------------------------------------------------------

pub(crate) async fn list_inventory(
    State(st): State<Arc<AppState>>,
) -> ApiResult<Vec<InventoryItem>> {
    Ok(Json(st.store.list_inventory().await?))
}

pub(crate) async fn create_inventory_item(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<InventoryItemInput>, JsonRejection>,
) -> ApiResult<InventoryItem> {
    let new = body(payload)?.validate()?;
    let row = st.store.create_inventory_item(&new).await?;
    info!(id = row.id, "inventory item created");
    st.publish("inventory", row.id, ChangeAction::Created);
    Ok(Json(row))
}

pub(crate) async fn update_inventory_item(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<InventoryItemInput>, JsonRejection>,
) -> ApiResult<InventoryItem> {
    let id = path_id(path)?;
    let new = body(payload)?.validate()?;
    let row = st
        .store
        .update_inventory_item(id, &new)
        .await?
        .ok_or(ApiError::NotFound { entity: "inventory item", id })?;
    st.publish("inventory", id, ChangeAction::Updated);
    Ok(Json(row))
}

pub(crate) async fn delete_inventory_item(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeleteResponse> {
    let id = path_id(path)?;
    st.store.delete_inventory_item(id).await?;
    st.publish("inventory", id, ChangeAction::Deleted);
    deleted()
}

// ---------------------------------------------------------------------------
// /api/orders
// ---------------------------------------------------------------------------

pub(crate) async fn list_orders(State(st): State<Arc<AppState>>) -> ApiResult<Vec<Order>> {
    Ok(Json(st.store.list_orders().await?))
}

pub(crate) async fn create_order(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<OrderInput>, JsonRejection>,
) -> ApiResult<Order> {
    let new = body(payload)?.validate()?;
    let row = st.store.create_order(&new).await?;
    info!(id = row.id, order_number = %row.order_number, "order created");
    st.publish("order", row.id, ChangeAction::Created);
    Ok(Json(row))
}

pub(crate) async fn update_order(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<OrderInput>, JsonRejection>,
) -> ApiResult<Order> {
    let id = path_id(path)?;
    let new = body(payload)?.validate()?;
    let row = st
        .store
        .update_order(id, &new)
        .await?
        .ok_or(ApiError::NotFound { entity: "order", id })?;
    st.publish("order", id, ChangeAction::Updated);
    Ok(Json(row))
}

pub(crate) async fn delete_order(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeleteResponse> {
    let id = path_id(path)?;
    st.store.delete_order(id).await?;
    st.publish("order", id, ChangeAction::Deleted);
    deleted()
}

// ---------------------------------------------------------------------------
// /api/employees
// ---------------------------------------------------------------------------

pub(crate) async fn list_employees(State(st): State<Arc<AppState>>) -> ApiResult<Vec<Employee>> {
    Ok(Json(st.store.list_employees().await?))
}

pub(crate) async fn create_employee(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<EmployeeInput>, JsonRejection>,
) -> ApiResult<Employee> {
    let new = body(payload)?.validate()?;
    let row = st.store.create_employee(&new).await?;
    info!(id = row.id, "employee created");
    st.publish("employee", row.id, ChangeAction::Created);
    Ok(Json(row))
}

pub(crate) async fn update_employee(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<EmployeeInput>, JsonRejection>,
) -> ApiResult<Employee> {
    let id = path_id(path)?;
    let new = body(payload)?.validate()?;
    let row = st
        .store
        .update_employee(id, &new)
        .await?
        .ok_or(ApiError::NotFound { entity: "employee", id })?;
    st.publish("employee", id, ChangeAction::Updated);
    Ok(Json(row))
}

pub(crate) async fn delete_employee(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeleteResponse> {
    let id = path_id(path)?;
    st.store.delete_employee(id).await?;
    st.publish("employee", id, ChangeAction::Deleted);
    deleted()
}

// ---------------------------------------------------------------------------
// /api/quotes
// ---------------------------------------------------------------------------

pub(crate) async fn list_quotes(State(st): State<Arc<AppState>>) -> ApiResult<Vec<Quote>> {
    Ok(Json(st.store.list_quotes().await?))
}

pub(crate) async fn create_quote(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<QuoteInput>, JsonRejection>,
) -> ApiResult<Quote> {
    let new = body(payload)?.validate()?;
    let row = st.store.create_quote(&new).await?;
    info!(id = row.id, quote_number = %row.quote_number, total = %row.total_amount, "quote created");
    st.publish("quote", row.id, ChangeAction::Created);
    Ok(Json(row))
}

/// Full replace. Moving the quote into `accepted` for the first time also
/// creates and links an order in the same store transaction.
pub(crate) async fn update_quote(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<QuoteInput>, JsonRejection>,
) -> ApiResult<Quote> {
    let id = path_id(path)?;
    let new = body(payload)?.validate()?;
    let out = st
        .store
        .update_quote(id, &new)
        .await?
        .ok_or(ApiError::NotFound { entity: "quote", id })?;

    announce_quote_write(&st, id, out.order.as_ref());
    Ok(Json(out.quote))
}

/// Set status to `accepted` and apply the promotion rule. Repeating the call
/// is harmless: the decision reports why nothing fired.
pub(crate) async fn promote_quote(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<PromoteResponse> {
    let id = path_id(path)?;
    let out = st
        .store
        .promote_quote(id)
        .await?
        .ok_or(ApiError::NotFound { entity: "quote", id })?;

    announce_quote_write(&st, id, out.order.as_ref());
    Ok(Json(PromoteResponse {
        quote: out.quote,
        decision: out.decision,
        order: out.order,
    }))
}

/// Email text for the quote, dated today in the business time zone.
pub(crate) async fn quote_email(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<QuoteEmail> {
    let id = path_id(path)?;
    let quote = st
        .store
        .get_quote(id)
        .await?
        .ok_or(ApiError::NotFound { entity: "quote", id })?;
    Ok(Json(crm_schemas::quote_email(&quote, st.today())))
}

fn announce_quote_write(st: &AppState, quote_id: i64, order: Option<&Order>) {
    match order {
        Some(order) => {
            info!(
                quote_id,
                order_id = order.id,
                order_number = %order.order_number,
                "quote accepted; order created"
            );
            st.publish("order", order.id, ChangeAction::Created);
            st.publish("quote", quote_id, ChangeAction::Promoted);
        }
        None => st.publish("quote", quote_id, ChangeAction::Updated),
    }
}

pub(crate) async fn delete_quote(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeleteResponse> {
    let id = path_id(path)?;
    st.store.delete_quote(id).await?;
    st.publish("quote", id, ChangeAction::Deleted);
    deleted()
}

// ---------------------------------------------------------------------------
// /api/schedules
// ---------------------------------------------------------------------------

pub(crate) async fn list_schedules(State(st): State<Arc<AppState>>) -> ApiResult<Vec<Schedule>> {
    Ok(Json(st.store.list_schedules().await?))
}

pub(crate) async fn create_schedule(
    State(st): State<Arc<AppState>>,
    payload: Result<Json<ScheduleInput>, JsonRejection>,
) -> ApiResult<Schedule> {
    let new = body(payload)?.validate()?;
    let row = st.store.create_schedule(&new).await?;
    info!(id = row.id, date = %row.scheduled_date, "schedule created");
    st.publish("schedule", row.id, ChangeAction::Created);
    Ok(Json(row))
}

pub(crate) async fn update_schedule(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ScheduleInput>, JsonRejection>,
) -> ApiResult<Schedule> {
    let id = path_id(path)?;
    let new = body(payload)?.validate()?;
    let row = st
        .store
        .update_schedule(id, &new)
        .await?
        .ok_or(ApiError::NotFound { entity: "schedule", id })?;
    st.publish("schedule", id, ChangeAction::Updated);
    Ok(Json(row))
}

pub(crate) async fn delete_schedule(
    State(st): State<Arc<AppState>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<DeleteResponse> {
    let id = path_id(path)?;
    st.store.delete_schedule(id).await?;
    st.publish("schedule", id, ChangeAction::Deleted);
    deleted()
}

// ---------------------------------------------------------------------------
// GET /api/stream  (SSE)
// ---------------------------------------------------------------------------

pub(crate) async fn stream(State(st): State<Arc<AppState>>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("Cache-Control", HeaderValue::from_static("no-cache"));
    headers.insert("Connection", HeaderValue::from_static("keep-alive"));

    let rx = st.bus.subscribe();
    let events = broadcast_to_sse(rx);

    (headers, Sse::new(events).keep_alive(KeepAlive::new())).into_response()
}

fn broadcast_to_sse(
    rx: broadcast::Receiver<BusMsg>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(|msg| async move {
        match msg {
            Ok(m) => {
                let event_name = match &m {
                    BusMsg::Heartbeat { .. } => "heartbeat",
                    BusMsg::EntityChanged { .. } => "entity_changed",
                };
                let data = serde_json::to_string(&m).ok()?;
                Some(Ok(Event::default().event(event_name).data(data)))
            }
            Err(_) => None, // lagged / closed
        }
    })
}
