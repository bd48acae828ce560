use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgExecutor, PgPool, Postgres, Row, Transaction};

use crm_promotion::{derive_order, evaluate_promotion, PriorQuoteState};
use crm_schemas::{
    Customer, Employee, InventoryItem, NewCustomer, NewEmployee, NewInventoryItem, NewOrder,
    NewQuote, NewSchedule, Order, OrderStatus, Quote, QuoteStatus, Schedule, ScheduleStatus,
    ScheduleType,
};

use crate::error::{from_sqlx, StoreError, StoreResult};
use crate::store::{QuoteUpdated, Store};

/// [`Store`] over a Postgres pool. Run [`crate::migrate`] before first use.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Select lists (joined display names are resolved here, never stored)
// ---------------------------------------------------------------------------

const CUSTOMER_SELECT: &str = r#"
    select id, name, email, phone, address, city, state, zip_code, created_at, updated_at
    from customers
"#;

const INVENTORY_SELECT: &str = r#"
    select id, name, description, category, quantity, unit_price, sku, created_at, updated_at
    from inventory_items
"#;

const ORDER_SELECT: &str = r#"
    select
      o.id, o.customer_id, o.order_number, o.status,
      o.pickup_address, o.delivery_address, o.pickup_date, o.delivery_date,
      o.dog_name, o.dog_breed, o.dog_weight, o.special_instructions, o.total_amount,
      o.created_at, o.updated_at,
      c.name as customer_name
    from orders o
    left join customers c on c.id = o.customer_id
"#;

const EMPLOYEE_SELECT: &str = r#"
    select id, name, email, phone, role, is_active, created_at, updated_at
    from employees
"#;

const QUOTE_SELECT: &str = r#"
    select
      q.id, q.customer_id, q.quote_number, q.status,
      q.dog_name, q.dog_breed, q.dog_weight,
      q.departure_city, q.destination_city, q.travel_date,
      q.flight_cost, q.boarding_cost, q.medical_cost, q.additional_fees, q.total_amount,
      q.notes, q.valid_until, q.order_id,
      q.created_at, q.updated_at,
      c.name as customer_name
    from quotes q
    left join customers c on c.id = q.customer_id
"#;

const SCHEDULE_SELECT: &str = r#"
    select
      s.id, s.employee_id, s.order_id, s.schedule_type,
      s.scheduled_date, s.scheduled_time, s.address, s.status, s.notes,
      s.completed_at, s.created_at, s.updated_at,
      e.name as employee_name,
      o.order_number as order_number
    from schedules s
    left join employees e on e.id = s.employee_id
    left join orders o on o.id = s.order_id
"#;

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn customer_from_row(row: &PgRow) -> Result<Customer> {
    Ok(Customer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        city: row.try_get("city")?,
        state: row.try_get("state")?,
        zip_code: row.try_get("zip_code")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn inventory_from_row(row: &PgRow) -> Result<InventoryItem> {
    Ok(InventoryItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        quantity: row.try_get("quantity")?,
        unit_price: row.try_get("unit_price")?,
        sku: row.try_get("sku")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_from_row(row: &PgRow) -> Result<Order> {
    Ok(Order {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        order_number: row.try_get("order_number")?,
        status: OrderStatus::parse(&row.try_get::<String, _>("status")?)?,
        pickup_address: row.try_get("pickup_address")?,
        delivery_address: row.try_get("delivery_address")?,
        pickup_date: row.try_get("pickup_date")?,
        delivery_date: row.try_get("delivery_date")?,
        dog_name: row.try_get("dog_name")?,
        dog_breed: row.try_get("dog_breed")?,
        dog_weight: row.try_get("dog_weight")?,
        special_instructions: row.try_get("special_instructions")?,
        total_amount: row.try_get("total_amount")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        customer_name: row.try_get("customer_name")?,
    })
}

fn employee_from_row(row: &PgRow) -> Result<Employee> {
    Ok(Employee {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        role: row.try_get("role")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn quote_from_row(row: &PgRow) -> Result<Quote> {
    Ok(Quote {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        quote_number: row.try_get("quote_number")?,
        status: QuoteStatus::parse(&row.try_get::<String, _>("status")?)?,
        dog_name: row.try_get("dog_name")?,
        dog_breed: row.try_get("dog_breed")?,
        dog_weight: row.try_get("dog_weight")?,
        departure_city: row.try_get("departure_city")?,
        destination_city: row.try_get("destination_city")?,
        travel_date: row.try_get("travel_date")?,
        flight_cost: row.try_get("flight_cost")?,
        boarding_cost: row.try_get("boarding_cost")?,
        medical_cost: row.try_get("medical_cost")?,
        additional_fees: row.try_get("additional_fees")?,
        total_amount: row.try_get("total_amount")?,
        notes: row.try_get("notes")?,
        valid_until: row.try_get("valid_until")?,
        order_id: row.try_get("order_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        customer_name: row.try_get("customer_name")?,
    })
}

fn schedule_from_row(row: &PgRow) -> Result<Schedule> {
    Ok(Schedule {
        id: row.try_get("id")?,
        employee_id: row.try_get("employee_id")?,
        order_id: row.try_get("order_id")?,
        schedule_type: ScheduleType::parse(&row.try_get::<String, _>("schedule_type")?)?,
        scheduled_date: row.try_get("scheduled_date")?,
        scheduled_time: row.try_get("scheduled_time")?,
        address: row.try_get("address")?,
        status: ScheduleStatus::parse(&row.try_get::<String, _>("status")?)?,
        notes: row.try_get("notes")?,
        completed_at: row.try_get("completed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        employee_name: row.try_get("employee_name")?,
        order_number: row.try_get("order_number")?,
    })
}

fn decode_all<T>(rows: &[PgRow], f: fn(&PgRow) -> Result<T>) -> StoreResult<Vec<T>> {
    rows.iter()
        .map(|r| f(r).map_err(StoreError::from))
        .collect()
}

fn decode_opt<T>(row: Option<PgRow>, f: fn(&PgRow) -> Result<T>) -> StoreResult<Option<T>> {
    row.as_ref().map(f).transpose().map_err(StoreError::from)
}

async fn fetch_one_by_id<'e, E, T>(
    ex: E,
    select: &str,
    alias: &str,
    id: i64,
    f: fn(&PgRow) -> Result<T>,
    context: &'static str,
) -> StoreResult<Option<T>>
where
    E: PgExecutor<'e>,
{
    let sql = format!("{select} where {alias}.id = $1");
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await
        .map_err(|e| from_sqlx(e, context))?;
    decode_opt(row, f)
}

async fn delete_by_id(pool: &PgPool, table: &str, id: i64, context: &'static str) -> StoreResult<()> {
    let sql = format!("delete from {table} where id = $1");
    sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| from_sqlx(e, context))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Quote writes (shared by update_quote and promote_quote)
// ---------------------------------------------------------------------------

/// Apply `new` to quote `id` inside `tx`, creating and linking an order when
/// the promotion rule fires. The caller holds the row lock on `id`.
async fn write_quote_locked(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    prior: PriorQuoteState,
    new: &NewQuote,
) -> StoreResult<QuoteUpdated> {
    let decision = evaluate_promotion(&prior, new.status);

    sqlx::query(
        r#"
        update quotes
        set customer_id = $2,
            quote_number = $3,
            status = $4,
            dog_name = $5,
            dog_breed = $6,
            dog_weight = $7,
            departure_city = $8,
            destination_city = $9,
            travel_date = $10,
            flight_cost = $11,
            boarding_cost = $12,
            medical_cost = $13,
            additional_fees = $14,
            total_amount = $15,
            notes = $16,
            valid_until = $17,
            updated_at = now()
        where id = $1
        "#,
    )
    .bind(id)
    .bind(new.customer_id)
    .bind(&new.quote_number)
    .bind(new.status.as_str())
    .bind(&new.dog_name)
    .bind(&new.dog_breed)
    .bind(new.dog_weight)
    .bind(&new.departure_city)
    .bind(&new.destination_city)
    .bind(new.travel_date)
    .bind(new.costs.flight())
    .bind(new.costs.boarding())
    .bind(new.costs.medical())
    .bind(new.costs.additional())
    .bind(new.total_amount())
    .bind(&new.notes)
    .bind(new.valid_until)
    .execute(&mut **tx)
    .await
    .map_err(|e| from_sqlx(e, "update quote failed"))?;

    let order = if decision.fires() {
        let derived = derive_order(new);
        let order_id = insert_order(&mut **tx, &derived).await?;

        sqlx::query("update quotes set order_id = $2 where id = $1")
            .bind(id)
            .bind(order_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| from_sqlx(e, "link quote to order failed"))?;

        tracing::info!(
            quote_id = id,
            order_id,
            order_number = %derived.order_number,
            "quote promoted to order"
        );

        fetch_one_by_id(&mut **tx, ORDER_SELECT, "o", order_id, order_from_row, "fetch order failed")
            .await?
    } else {
        None
    };

    let quote = fetch_one_by_id(&mut **tx, QUOTE_SELECT, "q", id, quote_from_row, "fetch quote failed")
        .await?
        .ok_or_else(|| StoreError::from(anyhow!("quote {id} vanished inside its own transaction")))?;

    Ok(QuoteUpdated {
        quote,
        decision,
        order,
    })
}

async fn insert_order<'e, E>(ex: E, new: &NewOrder) -> StoreResult<i64>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        insert into orders (
          customer_id, order_number, status,
          pickup_address, delivery_address, pickup_date, delivery_date,
          dog_name, dog_breed, dog_weight, special_instructions, total_amount
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        returning id
        "#,
    )
    .bind(new.customer_id)
    .bind(&new.order_number)
    .bind(new.status.as_str())
    .bind(&new.pickup_address)
    .bind(&new.delivery_address)
    .bind(new.pickup_date)
    .bind(new.delivery_date)
    .bind(&new.dog_name)
    .bind(&new.dog_breed)
    .bind(new.dog_weight)
    .bind(&new.special_instructions)
    .bind(new.total_amount)
    .fetch_one(ex)
    .await
    .map_err(|e| from_sqlx(e, "insert order failed"))?;

    row.try_get("id")
        .map_err(|e| StoreError::from(anyhow::Error::new(e).context("decode order id")))
}

fn prior_from_row(row: &PgRow) -> Result<PriorQuoteState> {
    Ok(PriorQuoteState {
        status: QuoteStatus::parse(&row.try_get::<String, _>("status")?)?,
        order_id: row.try_get("order_id")?,
    })
}

// ---------------------------------------------------------------------------
// Store impl
// ---------------------------------------------------------------------------

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("select 1")
            .execute(&self.pool)
            .await
            .map_err(|e| from_sqlx(e, "ping failed"))?;
        Ok(())
    }

    // --- customers ---------------------------------------------------------

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let sql = format!("{CUSTOMER_SELECT} order by created_at desc, id desc");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| from_sqlx(e, "list customers failed"))?;
        decode_all(&rows, customer_from_row)
    }

    async fn create_customer(&self, new: &NewCustomer) -> StoreResult<Customer> {
        let row = sqlx::query(
            r#"
            insert into customers (name, email, phone, address, city, state, zip_code)
            values ($1, $2, $3, $4, $5, $6, $7)
            returning id, name, email, phone, address, city, state, zip_code, created_at, updated_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.zip_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| from_sqlx(e, "insert customer failed"))?;
        Ok(customer_from_row(&row)?)
    }

    async fn update_customer(&self, id: i64, new: &NewCustomer) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(
            r#"
            update customers
            set name = $2, email = $3, phone = $4, address = $5,
                city = $6, state = $7, zip_code = $8, updated_at = now()
            where id = $1
            returning id, name, email, phone, address, city, state, zip_code, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.address)
        .bind(&new.city)
        .bind(&new.state)
        .bind(&new.zip_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| from_sqlx(e, "update customer failed"))?;
        decode_opt(row, customer_from_row)
    }

    async fn delete_customer(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, "customers", id, "delete customer failed").await
    }

    // --- inventory ---------------------------------------------------------

    async fn list_inventory(&self) -> StoreResult<Vec<InventoryItem>> {
        let sql = format!("{INVENTORY_SELECT} order by created_at desc, id desc");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| from_sqlx(e, "list inventory failed"))?;
        decode_all(&rows, inventory_from_row)
    }

    async fn create_inventory_item(&self, new: &NewInventoryItem) -> StoreResult<InventoryItem> {
        let row = sqlx::query(
            r#"
            insert into inventory_items (name, description, category, quantity, unit_price, sku)
            values ($1, $2, $3, $4, $5, $6)
            returning id, name, description, category, quantity, unit_price, sku, created_at, updated_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.category)
        .bind(new.quantity)
        .bind(new.unit_price)
        .bind(&new.sku)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| from_sqlx(e, "insert inventory item failed"))?;
        Ok(inventory_from_row(&row)?)
    }

    async fn update_inventory_item(
        &self,
        id: i64,
        new: &NewInventoryItem,
    ) -> StoreResult<Option<InventoryItem>> {
        let row = sqlx::query(
            r#"
            update inventory_items
            set name = $2, description = $3, category = $4, quantity = $5,
                unit_price = $6, sku = $7, updated_at = now()
            where id = $1
            returning id, name, description, category, quantity, unit_price, sku, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.category)
        .bind(new.quantity)
        .bind(new.unit_price)
        .bind(&new.sku)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| from_sqlx(e, "update inventory item failed"))?;
        decode_opt(row, inventory_from_row)
    }

    async fn delete_inventory_item(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, "inventory_items", id, "delete inventory item failed").await
    }

    // --- orders ------------------------------------------------------------

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let sql = format!("{ORDER_SELECT} order by o.created_at desc, o.id desc");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| from_sqlx(e, "list orders failed"))?;
        decode_all(&rows, order_from_row)
    }

    async fn create_order(&self, new: &NewOrder) -> StoreResult<Order> {
        let id = insert_order(&self.pool, new).await?;
        fetch_one_by_id(&self.pool, ORDER_SELECT, "o", id, order_from_row, "fetch order failed")
            .await?
            .ok_or_else(|| StoreError::from(anyhow!("order {id} missing after insert")))
    }

    async fn update_order(&self, id: i64, new: &NewOrder) -> StoreResult<Option<Order>> {
        let res = sqlx::query(
            r#"
            update orders
            set customer_id = $2,
                order_number = $3,
                status = $4,
                pickup_address = $5,
                delivery_address = $6,
                pickup_date = $7,
                delivery_date = $8,
                dog_name = $9,
                dog_breed = $10,
                dog_weight = $11,
                special_instructions = $12,
                total_amount = $13,
                updated_at = now()
            where id = $1
            "#,
        )
        .bind(id)
        .bind(new.customer_id)
        .bind(&new.order_number)
        .bind(new.status.as_str())
        .bind(&new.pickup_address)
        .bind(&new.delivery_address)
        .bind(new.pickup_date)
        .bind(new.delivery_date)
        .bind(&new.dog_name)
        .bind(&new.dog_breed)
        .bind(new.dog_weight)
        .bind(&new.special_instructions)
        .bind(new.total_amount)
        .execute(&self.pool)
        .await
        .map_err(|e| from_sqlx(e, "update order failed"))?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }
        fetch_one_by_id(&self.pool, ORDER_SELECT, "o", id, order_from_row, "fetch order failed").await
    }

    async fn delete_order(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, "orders", id, "delete order failed").await
    }

    // --- employees ---------------------------------------------------------

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} order by created_at desc, id desc");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| from_sqlx(e, "list employees failed"))?;
        decode_all(&rows, employee_from_row)
    }

    async fn create_employee(&self, new: &NewEmployee) -> StoreResult<Employee> {
        let row = sqlx::query(
            r#"
            insert into employees (name, email, phone, role, is_active)
            values ($1, $2, $3, $4, $5)
            returning id, name, email, phone, role, is_active, created_at, updated_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.role)
        .bind(new.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| from_sqlx(e, "insert employee failed"))?;
        Ok(employee_from_row(&row)?)
    }

    async fn update_employee(&self, id: i64, new: &NewEmployee) -> StoreResult<Option<Employee>> {
        let row = sqlx::query(
            r#"
            update employees
            set name = $2, email = $3, phone = $4, role = $5, is_active = $6, updated_at = now()
            where id = $1
            returning id, name, email, phone, role, is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.role)
        .bind(new.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| from_sqlx(e, "update employee failed"))?;
        decode_opt(row, employee_from_row)
    }

    async fn delete_employee(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, "employees", id, "delete employee failed").await
    }

    // --- quotes ------------------------------------------------------------

    async fn list_quotes(&self) -> StoreResult<Vec<Quote>> {
        let sql = format!("{QUOTE_SELECT} order by q.created_at desc, q.id desc");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| from_sqlx(e, "list quotes failed"))?;
        decode_all(&rows, quote_from_row)
    }

    async fn get_quote(&self, id: i64) -> StoreResult<Option<Quote>> {
        fetch_one_by_id(&self.pool, QUOTE_SELECT, "q", id, quote_from_row, "fetch quote failed").await
    }

    async fn create_quote(&self, new: &NewQuote) -> StoreResult<Quote> {
        // A quote created directly as accepted has no prior state, so it is
        // not promoted; promotion only happens on the update path.
        let row = sqlx::query(
            r#"
            insert into quotes (
              customer_id, quote_number, status,
              dog_name, dog_breed, dog_weight,
              departure_city, destination_city, travel_date,
              flight_cost, boarding_cost, medical_cost, additional_fees, total_amount,
              notes, valid_until
            ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            returning id
            "#,
        )
        .bind(new.customer_id)
        .bind(&new.quote_number)
        .bind(new.status.as_str())
        .bind(&new.dog_name)
        .bind(&new.dog_breed)
        .bind(new.dog_weight)
        .bind(&new.departure_city)
        .bind(&new.destination_city)
        .bind(new.travel_date)
        .bind(new.costs.flight())
        .bind(new.costs.boarding())
        .bind(new.costs.medical())
        .bind(new.costs.additional())
        .bind(new.total_amount())
        .bind(&new.notes)
        .bind(new.valid_until)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| from_sqlx(e, "insert quote failed"))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::from(anyhow::Error::new(e).context("decode quote id")))?;
        fetch_one_by_id(&self.pool, QUOTE_SELECT, "q", id, quote_from_row, "fetch quote failed")
            .await?
            .ok_or_else(|| StoreError::from(anyhow!("quote {id} missing after insert")))
    }

    async fn update_quote(&self, id: i64, new: &NewQuote) -> StoreResult<Option<QuoteUpdated>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| from_sqlx(e, "begin quote update failed"))?;

        let row = sqlx::query("select status, order_id from quotes where id = $1 for update")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| from_sqlx(e, "lock quote failed"))?;

        // Dropping `tx` on any early return rolls back.
        let Some(row) = row else {
            return Ok(None);
        };
        let prior = prior_from_row(&row)?;

        let updated = write_quote_locked(&mut tx, id, prior, new).await?;

        tx.commit()
            .await
            .map_err(|e| from_sqlx(e, "commit quote update failed"))?;
        Ok(Some(updated))
    }

    async fn promote_quote(&self, id: i64) -> StoreResult<Option<QuoteUpdated>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| from_sqlx(e, "begin quote promote failed"))?;

        let sql = format!("{QUOTE_SELECT} where q.id = $1 for update of q");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| from_sqlx(e, "lock quote failed"))?;

        let Some(current) = decode_opt(row, quote_from_row)? else {
            return Ok(None);
        };

        let prior = PriorQuoteState {
            status: current.status,
            order_id: current.order_id,
        };
        let mut next = NewQuote::from_stored(&current).map_err(|e| {
            StoreError::from(anyhow::Error::new(e).context("stored quote failed validation"))
        })?;
        next.status = QuoteStatus::Accepted;

        let updated = write_quote_locked(&mut tx, id, prior, &next).await?;

        tx.commit()
            .await
            .map_err(|e| from_sqlx(e, "commit quote promote failed"))?;
        Ok(Some(updated))
    }

    async fn delete_quote(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, "quotes", id, "delete quote failed").await
    }

    // --- schedules ---------------------------------------------------------

    async fn list_schedules(&self) -> StoreResult<Vec<Schedule>> {
        let sql = format!(
            "{SCHEDULE_SELECT} order by s.scheduled_date desc, s.scheduled_time asc nulls last, s.id desc"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| from_sqlx(e, "list schedules failed"))?;
        decode_all(&rows, schedule_from_row)
    }

    async fn create_schedule(&self, new: &NewSchedule) -> StoreResult<Schedule> {
        let row = sqlx::query(
            r#"
            insert into schedules (
              employee_id, order_id, schedule_type, scheduled_date, scheduled_time,
              address, status, notes, completed_at
            ) values (
              $1, $2, $3, $4, $5, $6, $7, $8,
              case when $7 = 'completed' then now() else null end
            )
            returning id
            "#,
        )
        .bind(new.employee_id)
        .bind(new.order_id)
        .bind(new.schedule_type.as_str())
        .bind(new.scheduled_date)
        .bind(&new.scheduled_time)
        .bind(&new.address)
        .bind(new.status.as_str())
        .bind(&new.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| from_sqlx(e, "insert schedule failed"))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::from(anyhow::Error::new(e).context("decode schedule id")))?;
        fetch_one_by_id(&self.pool, SCHEDULE_SELECT, "s", id, schedule_from_row, "fetch schedule failed")
            .await?
            .ok_or_else(|| StoreError::from(anyhow!("schedule {id} missing after insert")))
    }

    async fn update_schedule(&self, id: i64, new: &NewSchedule) -> StoreResult<Option<Schedule>> {
        let res = sqlx::query(
            r#"
            update schedules
            set employee_id = $2,
                order_id = $3,
                schedule_type = $4,
                scheduled_date = $5,
                scheduled_time = $6,
                address = $7,
                status = $8,
                notes = $9,
                completed_at = case
                  when $8 = 'completed' then coalesce(completed_at, now())
                  else null
                end,
                updated_at = now()
            where id = $1
            "#,
        )
        .bind(id)
        .bind(new.employee_id)
        .bind(new.order_id)
        .bind(new.schedule_type.as_str())
        .bind(new.scheduled_date)
        .bind(&new.scheduled_time)
        .bind(&new.address)
        .bind(new.status.as_str())
        .bind(&new.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| from_sqlx(e, "update schedule failed"))?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }
        fetch_one_by_id(&self.pool, SCHEDULE_SELECT, "s", id, schedule_from_row, "fetch schedule failed")
            .await
    }

    async fn delete_schedule(&self, id: i64) -> StoreResult<()> {
        delete_by_id(&self.pool, "schedules", id, "delete schedule failed").await
    }
}
