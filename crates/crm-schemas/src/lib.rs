//! Shared record types for the pet-travel CRM.
//!
//! Three layers live here:
//! - stored rows (`Customer`, `Order`, `Quote`, …) as returned by the store,
//! - wire inputs (`*Input`) as decoded from request bodies,
//! - validated writes (`New*`) produced by `*Input::validate`.
//!
//! No storage or HTTP logic belongs in this crate.

mod dashboard;
mod entities;
mod inputs;
mod quote_email;
mod status;
mod validation;
mod wire;

pub use dashboard::{summarize, DashboardPolicy, DashboardSnapshot, DashboardSummary};
pub use entities::{Customer, Employee, InventoryItem, Order, Quote, Schedule};
pub use inputs::{
    default_quote_number, CustomerInput, EmployeeInput, InventoryItemInput, NewCustomer,
    NewEmployee, NewInventoryItem, NewOrder, NewQuote, NewSchedule, OrderInput, QuoteCosts,
    QuoteInput, ScheduleInput,
};
pub use quote_email::{quote_email, QuoteEmail};
pub use status::{OrderStatus, QuoteStatus, ScheduleStatus, ScheduleType, UnknownVariant};
pub use validation::ValidationError;
