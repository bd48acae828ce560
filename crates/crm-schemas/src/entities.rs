//! Stored rows, as listed and returned by the API.
//!
//! `customer_name`, `employee_name` and `order_number` on the joined rows are
//! display-only; they are resolved at read time and never written.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::status::{OrderStatus, QuoteStatus, ScheduleStatus, ScheduleType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub sku: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub order_number: String,
    pub status: OrderStatus,
    pub pickup_address: Option<String>,
    pub delivery_address: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub dog_name: Option<String>,
    pub dog_breed: Option<String>,
    pub dog_weight: Option<Decimal>,
    pub special_instructions: Option<String>,
    pub total_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub quote_number: String,
    pub status: QuoteStatus,
    pub dog_name: Option<String>,
    pub dog_breed: Option<String>,
    pub dog_weight: Option<Decimal>,
    pub departure_city: Option<String>,
    pub destination_city: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub flight_cost: Decimal,
    pub boarding_cost: Decimal,
    pub medical_cost: Decimal,
    pub additional_fees: Decimal,
    /// Always the exact sum of the four cost components.
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub valid_until: Option<NaiveDate>,
    /// Order created when this quote was accepted. Set at most once.
    pub order_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub employee_id: Option<i64>,
    pub order_id: Option<i64>,
    pub schedule_type: ScheduleType,
    pub scheduled_date: NaiveDate,
    /// Free-form "HH:MM" as entered; not interpreted server-side.
    pub scheduled_time: Option<String>,
    pub address: Option<String>,
    pub status: ScheduleStatus,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub employee_name: Option<String>,
    pub order_number: Option<String>,
}
