//! Dashboard counters derived from the entity lists.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::{Customer, Employee, InventoryItem, Order, Quote, Schedule};
use crate::status::{OrderStatus, QuoteStatus, ScheduleStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardPolicy {
    /// Items with quantity strictly below this count as low stock.
    pub low_stock_threshold: i32,
    /// How many recent orders / quotes to include.
    pub recent_limit: usize,
}

impl Default for DashboardPolicy {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
            recent_limit: 5,
        }
    }
}

/// Borrowed view over every list the dashboard reads. Lists are expected in
/// store order (newest first).
#[derive(Debug, Clone, Copy)]
pub struct DashboardSnapshot<'a> {
    pub customers: &'a [Customer],
    pub orders: &'a [Order],
    pub quotes: &'a [Quote],
    pub inventory: &'a [InventoryItem],
    pub employees: &'a [Employee],
    pub schedules: &'a [Schedule],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_customers: usize,
    pub total_revenue: Decimal,
    pub pending_orders: usize,
    pub active_quotes: usize,
    pub low_stock_items: usize,
    pub active_employees: usize,
    pub todays_schedules: usize,
    pub pending_schedules: usize,
    pub recent_orders: Vec<Order>,
    pub recent_quotes: Vec<Quote>,
}

/// Compute the dashboard for `today` (a calendar date in the business time zone).
pub fn summarize(
    snap: DashboardSnapshot<'_>,
    today: NaiveDate,
    policy: &DashboardPolicy,
) -> DashboardSummary {
    // Orders without a total contribute nothing; saturate rather than panic.
    let total_revenue = snap
        .orders
        .iter()
        .filter_map(|o| o.total_amount)
        .fold(Decimal::ZERO, |acc, t| acc.saturating_add(t));

    DashboardSummary {
        total_customers: snap.customers.len(),
        total_revenue,
        pending_orders: snap
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count(),
        active_quotes: snap
            .quotes
            .iter()
            .filter(|q| q.status == QuoteStatus::Sent)
            .count(),
        low_stock_items: snap
            .inventory
            .iter()
            .filter(|i| i.quantity < policy.low_stock_threshold)
            .count(),
        active_employees: snap.employees.iter().filter(|e| e.is_active).count(),
        todays_schedules: snap
            .schedules
            .iter()
            .filter(|s| s.scheduled_date == today)
            .count(),
        pending_schedules: snap
            .schedules
            .iter()
            .filter(|s| s.status == ScheduleStatus::Scheduled)
            .count(),
        recent_orders: snap.orders.iter().take(policy.recent_limit).cloned().collect(),
        recent_quotes: snap.quotes.iter().take(policy.recent_limit).cloned().collect(),
    }
}
