use async_trait::async_trait;
use crm_promotion::PromotionDecision;
use crm_schemas::{
    Customer, Employee, InventoryItem, NewCustomer, NewEmployee, NewInventoryItem, NewOrder,
    NewQuote, NewSchedule, Order, Quote, Schedule,
};

use crate::error::StoreResult;

/// Outcome of a quote write that may have promoted the quote to an order.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteUpdated {
    /// The quote as stored after the write (with `order_id` set if promoted).
    pub quote: Quote,
    pub decision: PromotionDecision,
    /// The order created by this write, if the promotion fired.
    pub order: Option<Order>,
}

/// Persistence interface used by the HTTP layer.
///
/// Lists are newest first (`created_at desc`), except schedules which are
/// ordered by date descending then time ascending. `update_*` returns `None`
/// when the id does not exist; `delete_*` is unconditional and idempotent.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness check for the backing store.
    async fn ping(&self) -> StoreResult<()>;

    async fn list_customers(&self) -> StoreResult<Vec<Customer>>;
    async fn create_customer(&self, new: &NewCustomer) -> StoreResult<Customer>;
    async fn update_customer(&self, id: i64, new: &NewCustomer) -> StoreResult<Option<Customer>>;
    async fn delete_customer(&self, id: i64) -> StoreResult<()>;

    async fn list_inventory(&self) -> StoreResult<Vec<InventoryItem>>;
    async fn create_inventory_item(&self, new: &NewInventoryItem) -> StoreResult<InventoryItem>;
    async fn update_inventory_item(
        &self,
        id: i64,
        new: &NewInventoryItem,
    ) -> StoreResult<Option<InventoryItem>>;
    async fn delete_inventory_item(&self, id: i64) -> StoreResult<()>;

    async fn list_orders(&self) -> StoreResult<Vec<Order>>;
    async fn create_order(&self, new: &NewOrder) -> StoreResult<Order>;
    async fn update_order(&self, id: i64, new: &NewOrder) -> StoreResult<Option<Order>>;
    async fn delete_order(&self, id: i64) -> StoreResult<()>;

    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;
    async fn create_employee(&self, new: &NewEmployee) -> StoreResult<Employee>;
    async fn update_employee(&self, id: i64, new: &NewEmployee) -> StoreResult<Option<Employee>>;
    async fn delete_employee(&self, id: i64) -> StoreResult<()>;

    async fn list_quotes(&self) -> StoreResult<Vec<Quote>>;
    async fn get_quote(&self, id: i64) -> StoreResult<Option<Quote>>;
    async fn create_quote(&self, new: &NewQuote) -> StoreResult<Quote>;
    /// Replace a quote and, in the same atomic unit, create and link an order
    /// when the write moves the quote into `accepted` for the first time.
    async fn update_quote(&self, id: i64, new: &NewQuote) -> StoreResult<Option<QuoteUpdated>>;
    /// Set a quote's status to `accepted`, promoting it if the rule fires.
    async fn promote_quote(&self, id: i64) -> StoreResult<Option<QuoteUpdated>>;
    async fn delete_quote(&self, id: i64) -> StoreResult<()>;

    async fn list_schedules(&self) -> StoreResult<Vec<Schedule>>;
    async fn create_schedule(&self, new: &NewSchedule) -> StoreResult<Schedule>;
    async fn update_schedule(&self, id: i64, new: &NewSchedule) -> StoreResult<Option<Schedule>>;
    async fn delete_schedule(&self, id: i64) -> StoreResult<()>;
}
