//! In-memory [`Store`] backend.
//!
//! All tables live behind one `RwLock`, so every write (including a quote
//! update plus its promotion) is atomic with respect to other requests.
//! Uniqueness is checked before anything is mutated; a rejected write leaves
//! no trace. Nothing survives a restart.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crm_promotion::{derive_order, evaluate_promotion, PriorQuoteState};
use crm_schemas::{
    Customer, Employee, InventoryItem, NewCustomer, NewEmployee, NewInventoryItem, NewOrder,
    NewQuote, NewSchedule, Order, Quote, QuoteStatus, Schedule,
};

use crate::error::{StoreError, StoreResult};
use crate::store::{QuoteUpdated, Store};
use crate::{UQ_ORDER_NUMBER, UQ_QUOTE_NUMBER};

struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: BTreeMap::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct Tables {
    customers: Table<Customer>,
    inventory: Table<InventoryItem>,
    orders: Table<Order>,
    employees: Table<Employee>,
    quotes: Table<Quote>,
    schedules: Table<Schedule>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Wall clock, never earlier than the previous stamp.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_stamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_stamp = Some(ts);
        ts
    }

    fn customer_name(&self, id: Option<i64>) -> Option<String> {
        id.and_then(|id| self.customers.rows.get(&id))
            .map(|c| c.name.clone())
    }

    fn order_with_names(&self, o: &Order) -> Order {
        Order {
            customer_name: self.customer_name(o.customer_id),
            ..o.clone()
        }
    }

    fn quote_with_names(&self, q: &Quote) -> Quote {
        Quote {
            customer_name: self.customer_name(q.customer_id),
            ..q.clone()
        }
    }

    fn schedule_with_names(&self, s: &Schedule) -> Schedule {
        Schedule {
            employee_name: s
                .employee_id
                .and_then(|id| self.employees.rows.get(&id))
                .map(|e| e.name.clone()),
            order_number: s
                .order_id
                .and_then(|id| self.orders.rows.get(&id))
                .map(|o| o.order_number.clone()),
            ..s.clone()
        }
    }

    fn order_number_taken(&self, number: &str, except: Option<i64>) -> bool {
        self.orders
            .rows
            .values()
            .any(|o| o.order_number == number && Some(o.id) != except)
    }

    fn quote_number_taken(&self, number: &str, except: Option<i64>) -> bool {
        self.quotes
            .rows
            .values()
            .any(|q| q.quote_number == number && Some(q.id) != except)
    }

    fn insert_order(&mut self, new: &NewOrder) -> StoreResult<i64> {
        if self.order_number_taken(&new.order_number, None) {
            return Err(StoreError::conflict(UQ_ORDER_NUMBER));
        }
        let now = self.stamp();
        let id = self.orders.allocate();
        self.orders.rows.insert(id, order_row(id, new, now, now));
        Ok(id)
    }
}

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

fn schedule_order(a: &Schedule, b: &Schedule) -> Ordering {
    let time = match (&a.scheduled_time, &b.scheduled_time) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    b.scheduled_date
        .cmp(&a.scheduled_date)
        .then(time)
        .then(b.id.cmp(&a.id))
}

fn order_row(id: i64, new: &NewOrder, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Order {
    Order {
        id,
        customer_id: new.customer_id,
        order_number: new.order_number.clone(),
        status: new.status,
        pickup_address: new.pickup_address.clone(),
        delivery_address: new.delivery_address.clone(),
        pickup_date: new.pickup_date,
        delivery_date: new.delivery_date,
        dog_name: new.dog_name.clone(),
        dog_breed: new.dog_breed.clone(),
        dog_weight: new.dog_weight,
        special_instructions: new.special_instructions.clone(),
        total_amount: new.total_amount,
        created_at,
        updated_at,
        customer_name: None,
    }
}

fn quote_row(
    id: i64,
    new: &NewQuote,
    order_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Quote {
    Quote {
        id,
        customer_id: new.customer_id,
        quote_number: new.quote_number.clone(),
        status: new.status,
        dog_name: new.dog_name.clone(),
        dog_breed: new.dog_breed.clone(),
        dog_weight: new.dog_weight,
        departure_city: new.departure_city.clone(),
        destination_city: new.destination_city.clone(),
        travel_date: new.travel_date,
        flight_cost: new.costs.flight(),
        boarding_cost: new.costs.boarding(),
        medical_cost: new.costs.medical(),
        additional_fees: new.costs.additional(),
        total_amount: new.total_amount(),
        notes: new.notes.clone(),
        valid_until: new.valid_until,
        order_id,
        created_at,
        updated_at,
        customer_name: None,
    }
}

fn schedule_row(
    id: i64,
    new: &NewSchedule,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Schedule {
    Schedule {
        id,
        employee_id: new.employee_id,
        order_id: new.order_id,
        schedule_type: new.schedule_type,
        scheduled_date: new.scheduled_date,
        scheduled_time: new.scheduled_time.clone(),
        address: new.address.clone(),
        status: new.status,
        notes: new.notes.clone(),
        completed_at,
        created_at,
        updated_at,
        employee_name: None,
        order_number: None,
    }
}

/// Apply `new` to quote `id`, promoting it when the rule fires. All checks
/// run before the first mutation.
fn write_quote(
    t: &mut Tables,
    id: i64,
    prior: &Quote,
    new: &NewQuote,
) -> StoreResult<QuoteUpdated> {
    let decision = evaluate_promotion(
        &PriorQuoteState {
            status: prior.status,
            order_id: prior.order_id,
        },
        new.status,
    );

    if t.quote_number_taken(&new.quote_number, Some(id)) {
        return Err(StoreError::conflict(UQ_QUOTE_NUMBER));
    }

    let derived = decision.fires().then(|| derive_order(new));
    if let Some(d) = &derived {
        if t.order_number_taken(&d.order_number, None) {
            return Err(StoreError::conflict(UQ_ORDER_NUMBER));
        }
    }

    let order_id = match &derived {
        Some(d) => {
            let oid = t.insert_order(d)?;
            tracing::info!(
                quote_id = id,
                order_id = oid,
                order_number = %d.order_number,
                "quote promoted to order"
            );
            Some(oid)
        }
        None => prior.order_id,
    };

    let now = t.stamp();
    let row = quote_row(id, new, order_id, prior.created_at, now);
    t.quotes.rows.insert(id, row);

    let quote = t
        .quotes
        .rows
        .get(&id)
        .map(|q| t.quote_with_names(q))
        .ok_or_else(|| StoreError::from(anyhow!("quote {id} missing after write")))?;
    let order = derived
        .and(order_id)
        .and_then(|oid| t.orders.rows.get(&oid))
        .map(|o| t.order_with_names(o));

    Ok(QuoteUpdated {
        quote,
        decision,
        order,
    })
}

/// Process-local [`Store`]; used by tests and by `storage.backend: memory`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        let _t = self.tables.read().await;
        Ok(())
    }

    // --- customers ---------------------------------------------------------

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let t = self.tables.read().await;
        let mut out: Vec<Customer> = t.customers.rows.values().cloned().collect();
        newest_first(&mut out, |c| (c.created_at, c.id));
        Ok(out)
    }

    async fn create_customer(&self, new: &NewCustomer) -> StoreResult<Customer> {
        let mut t = self.tables.write().await;
        let now = t.stamp();
        let id = t.customers.allocate();
        let row = Customer {
            id,
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            address: new.address.clone(),
            city: new.city.clone(),
            state: new.state.clone(),
            zip_code: new.zip_code.clone(),
            created_at: now,
            updated_at: now,
        };
        t.customers.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update_customer(&self, id: i64, new: &NewCustomer) -> StoreResult<Option<Customer>> {
        let mut t = self.tables.write().await;
        let now = t.stamp();
        let Some(row) = t.customers.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.name = new.name.clone();
        row.email = new.email.clone();
        row.phone = new.phone.clone();
        row.address = new.address.clone();
        row.city = new.city.clone();
        row.state = new.state.clone();
        row.zip_code = new.zip_code.clone();
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn delete_customer(&self, id: i64) -> StoreResult<()> {
        self.tables.write().await.customers.rows.remove(&id);
        Ok(())
    }

    // --- inventory ---------------------------------------------------------

    async fn list_inventory(&self) -> StoreResult<Vec<InventoryItem>> {
        let t = self.tables.read().await;
        let mut out: Vec<InventoryItem> = t.inventory.rows.values().cloned().collect();
        newest_first(&mut out, |i| (i.created_at, i.id));
        Ok(out)
    }

    async fn create_inventory_item(&self, new: &NewInventoryItem) -> StoreResult<InventoryItem> {
        let mut t = self.tables.write().await;
        let now = t.stamp();
        let id = t.inventory.allocate();
        let row = InventoryItem {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            category: new.category.clone(),
            quantity: new.quantity,
            unit_price: new.unit_price,
            sku: new.sku.clone(),
            created_at: now,
            updated_at: now,
        };
        t.inventory.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update_inventory_item(
        &self,
        id: i64,
        new: &NewInventoryItem,
    ) -> StoreResult<Option<InventoryItem>> {
        let mut t = self.tables.write().await;
        let now = t.stamp();
        let Some(row) = t.inventory.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.name = new.name.clone();
        row.description = new.description.clone();
        row.category = new.category.clone();
        row.quantity = new.quantity;
        row.unit_price = new.unit_price;
        row.sku = new.sku.clone();
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn delete_inventory_item(&self, id: i64) -> StoreResult<()> {
        self.tables.write().await.inventory.rows.remove(&id);
        Ok(())
    }

    // --- orders ------------------------------------------------------------

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let t = self.tables.read().await;
        let mut out: Vec<Order> = t.orders.rows.values().map(|o| t.order_with_names(o)).collect();
        newest_first(&mut out, |o| (o.created_at, o.id));
        Ok(out)
    }

    async fn create_order(&self, new: &NewOrder) -> StoreResult<Order> {
        let mut t = self.tables.write().await;
        let id = t.insert_order(new)?;
        t.orders
            .rows
            .get(&id)
            .map(|o| t.order_with_names(o))
            .ok_or_else(|| StoreError::from(anyhow!("order {id} missing after insert")))
    }

    async fn update_order(&self, id: i64, new: &NewOrder) -> StoreResult<Option<Order>> {
        let mut t = self.tables.write().await;
        let Some(created_at) = t.orders.rows.get(&id).map(|o| o.created_at) else {
            return Ok(None);
        };
        if t.order_number_taken(&new.order_number, Some(id)) {
            return Err(StoreError::conflict(UQ_ORDER_NUMBER));
        }
        let now = t.stamp();
        let row = order_row(id, new, created_at, now);
        let out = t.order_with_names(&row);
        t.orders.rows.insert(id, row);
        Ok(Some(out))
    }

    async fn delete_order(&self, id: i64) -> StoreResult<()> {
        self.tables.write().await.orders.rows.remove(&id);
        Ok(())
    }

    // --- employees ---------------------------------------------------------

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let t = self.tables.read().await;
        let mut out: Vec<Employee> = t.employees.rows.values().cloned().collect();
        newest_first(&mut out, |e| (e.created_at, e.id));
        Ok(out)
    }

    async fn create_employee(&self, new: &NewEmployee) -> StoreResult<Employee> {
        let mut t = self.tables.write().await;
        let now = t.stamp();
        let id = t.employees.allocate();
        let row = Employee {
            id,
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            role: new.role.clone(),
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        t.employees.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update_employee(&self, id: i64, new: &NewEmployee) -> StoreResult<Option<Employee>> {
        let mut t = self.tables.write().await;
        let now = t.stamp();
        let Some(row) = t.employees.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.name = new.name.clone();
        row.email = new.email.clone();
        row.phone = new.phone.clone();
        row.role = new.role.clone();
        row.is_active = new.is_active;
        row.updated_at = now;
        Ok(Some(row.clone()))
    }

    async fn delete_employee(&self, id: i64) -> StoreResult<()> {
        self.tables.write().await.employees.rows.remove(&id);
        Ok(())
    }

    // --- quotes ------------------------------------------------------------

    async fn list_quotes(&self) -> StoreResult<Vec<Quote>> {
        let t = self.tables.read().await;
        let mut out: Vec<Quote> = t.quotes.rows.values().map(|q| t.quote_with_names(q)).collect();
        newest_first(&mut out, |q| (q.created_at, q.id));
        Ok(out)
    }

    async fn get_quote(&self, id: i64) -> StoreResult<Option<Quote>> {
        let t = self.tables.read().await;
        Ok(t.quotes.rows.get(&id).map(|q| t.quote_with_names(q)))
    }

    async fn create_quote(&self, new: &NewQuote) -> StoreResult<Quote> {
        let mut t = self.tables.write().await;
        if t.quote_number_taken(&new.quote_number, None) {
            return Err(StoreError::conflict(UQ_QUOTE_NUMBER));
        }
        let now = t.stamp();
        let id = t.quotes.allocate();
        let row = quote_row(id, new, None, now, now);
        let out = t.quote_with_names(&row);
        t.quotes.rows.insert(id, row);
        Ok(out)
    }

    async fn update_quote(&self, id: i64, new: &NewQuote) -> StoreResult<Option<QuoteUpdated>> {
        let mut t = self.tables.write().await;
        let Some(prior) = t.quotes.rows.get(&id).cloned() else {
            return Ok(None);
        };
        write_quote(&mut t, id, &prior, new).map(Some)
    }

    async fn promote_quote(&self, id: i64) -> StoreResult<Option<QuoteUpdated>> {
        let mut t = self.tables.write().await;
        let Some(prior) = t.quotes.rows.get(&id).cloned() else {
            return Ok(None);
        };
        let mut next = NewQuote::from_stored(&prior).map_err(|e| {
            StoreError::from(anyhow::Error::new(e).context("stored quote failed validation"))
        })?;
        next.status = QuoteStatus::Accepted;
        write_quote(&mut t, id, &prior, &next).map(Some)
    }

    async fn delete_quote(&self, id: i64) -> StoreResult<()> {
        self.tables.write().await.quotes.rows.remove(&id);
        Ok(())
    }

    // --- schedules ---------------------------------------------------------

    async fn list_schedules(&self) -> StoreResult<Vec<Schedule>> {
        let t = self.tables.read().await;
        let mut out: Vec<Schedule> = t
            .schedules
            .rows
            .values()
            .map(|s| t.schedule_with_names(s))
            .collect();
        out.sort_by(schedule_order);
        Ok(out)
    }

    async fn create_schedule(&self, new: &NewSchedule) -> StoreResult<Schedule> {
        let mut t = self.tables.write().await;
        let now = t.stamp();
        let id = t.schedules.allocate();
        let row = schedule_row(id, new, new.completed_at(None, now), now, now);
        let out = t.schedule_with_names(&row);
        t.schedules.rows.insert(id, row);
        Ok(out)
    }

    async fn update_schedule(&self, id: i64, new: &NewSchedule) -> StoreResult<Option<Schedule>> {
        let mut t = self.tables.write().await;
        let Some((created_at, prior_completed)) = t
            .schedules
            .rows
            .get(&id)
            .map(|s| (s.created_at, s.completed_at))
        else {
            return Ok(None);
        };
        let now = t.stamp();
        let row = schedule_row(id, new, new.completed_at(prior_completed, now), created_at, now);
        let out = t.schedule_with_names(&row);
        t.schedules.rows.insert(id, row);
        Ok(Some(out))
    }

    async fn delete_schedule(&self, id: i64) -> StoreResult<()> {
        self.tables.write().await.schedules.rows.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_schemas::{QuoteInput, ScheduleInput, ScheduleStatus};

    fn quote(number: &str, flight: i64) -> NewQuote {
        let input: QuoteInput = serde_json::from_value(serde_json::json!({
            "quote_number": number,
            "flight_cost": flight,
        }))
        .unwrap();
        input.validate().unwrap()
    }

    #[tokio::test]
    async fn ids_are_per_table_and_start_at_one() {
        let s = MemoryStore::new();
        let q = s.create_quote(&quote("DPT-000001", 1)).await.unwrap();
        let sc: ScheduleInput =
            serde_json::from_str(r#"{"scheduled_date": "2026-05-01"}"#).unwrap();
        let sc = s.create_schedule(&sc.validate().unwrap()).await.unwrap();
        assert_eq!(q.id, 1);
        assert_eq!(sc.id, 1);
    }

    #[tokio::test]
    async fn duplicate_quote_number_on_create_is_conflict() {
        let s = MemoryStore::new();
        s.create_quote(&quote("DPT-000001", 1)).await.unwrap();
        let err = s.create_quote(&quote("DPT-000001", 2)).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(s.list_quotes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn schedule_created_completed_is_stamped() {
        let s = MemoryStore::new();
        let sc: ScheduleInput = serde_json::from_str(
            r#"{"scheduled_date": "2026-05-01", "status": "completed"}"#,
        )
        .unwrap();
        let row = s.create_schedule(&sc.validate().unwrap()).await.unwrap();
        assert_eq!(row.status, ScheduleStatus::Completed);
        assert!(row.completed_at.is_some());
    }

    #[test]
    fn schedule_order_puts_untimed_last_within_a_day() {
        let base = |id: i64, date: &str, time: Option<&str>| Schedule {
            id,
            employee_id: None,
            order_id: None,
            schedule_type: Default::default(),
            scheduled_date: date.parse().unwrap(),
            scheduled_time: time.map(str::to_string),
            address: None,
            status: Default::default(),
            notes: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            employee_name: None,
            order_number: None,
        };
        let mut v = vec![
            base(1, "2026-05-01", None),
            base(2, "2026-05-01", Some("14:00")),
            base(3, "2026-05-02", Some("09:00")),
            base(4, "2026-05-01", Some("08:30")),
        ];
        v.sort_by(schedule_order);
        let ids: Vec<i64> = v.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![3, 4, 2, 1]);
    }
}
