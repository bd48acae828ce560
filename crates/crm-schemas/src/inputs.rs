//! Request bodies and their validated forms.
//!
//! Every `*Input` decodes leniently (all keys optional) so that a missing
//! required key is reported by `validate` with its field name, rather than as
//! an opaque decode failure. `validate` applies defaults and normalizes empty
//! optional strings to `None`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::Quote;
use crate::status::{OrderStatus, QuoteStatus, ScheduleStatus, ScheduleType};
use crate::validation::{
    non_negative, optional_email, optional_non_negative, optional_text, required_text,
    ValidationError,
};

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

impl CustomerInput {
    pub fn validate(self) -> Result<NewCustomer, ValidationError> {
        Ok(NewCustomer {
            name: required_text("name", self.name, "Name is required")?,
            email: optional_email("email", self.email)?,
            phone: optional_text(self.phone),
            address: optional_text(self.address),
            city: optional_text(self.city),
            state: optional_text(self.state),
            zip_code: optional_text(self.zip_code),
        })
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryItemInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<Decimal>,
    pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryItem {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
    pub sku: Option<String>,
}

impl InventoryItemInput {
    pub fn validate(self) -> Result<NewInventoryItem, ValidationError> {
        let quantity = match self.quantity {
            None => 0,
            Some(q) if q < 0 => {
                return Err(ValidationError::new(
                    "quantity",
                    "Quantity must be non-negative",
                ))
            }
            Some(q) => i32::try_from(q)
                .map_err(|_| ValidationError::new("quantity", "Quantity is too large"))?,
        };

        Ok(NewInventoryItem {
            name: required_text("name", self.name, "Name is required")?,
            description: optional_text(self.description),
            category: optional_text(self.category),
            quantity,
            unit_price: optional_non_negative(
                "unit_price",
                self.unit_price,
                "Price must be non-negative",
            )?,
            sku: optional_text(self.sku),
        })
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderInput {
    pub customer_id: Option<i64>,
    pub order_number: Option<String>,
    pub status: Option<OrderStatus>,
    pub pickup_address: Option<String>,
    pub delivery_address: Option<String>,
    #[serde(deserialize_with = "crate::wire::blank_date")]
    pub pickup_date: Option<NaiveDate>,
    #[serde(deserialize_with = "crate::wire::blank_date")]
    pub delivery_date: Option<NaiveDate>,
    pub dog_name: Option<String>,
    pub dog_breed: Option<String>,
    pub dog_weight: Option<Decimal>,
    pub special_instructions: Option<String>,
    pub total_amount: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
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
}

impl OrderInput {
    pub fn validate(self) -> Result<NewOrder, ValidationError> {
        Ok(NewOrder {
            customer_id: self.customer_id,
            order_number: required_text(
                "order_number",
                self.order_number,
                "Order number is required",
            )?,
            status: self.status.unwrap_or_default(),
            pickup_address: optional_text(self.pickup_address),
            delivery_address: optional_text(self.delivery_address),
            pickup_date: self.pickup_date,
            delivery_date: self.delivery_date,
            dog_name: optional_text(self.dog_name),
            dog_breed: optional_text(self.dog_breed),
            dog_weight: optional_non_negative(
                "dog_weight",
                self.dog_weight,
                "Weight must be positive",
            )?,
            special_instructions: optional_text(self.special_instructions),
            total_amount: optional_non_negative(
                "total_amount",
                self.total_amount,
                "Amount must be non-negative",
            )?,
        })
    }
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,
    pub is_active: bool,
}

impl EmployeeInput {
    pub fn validate(self) -> Result<NewEmployee, ValidationError> {
        Ok(NewEmployee {
            name: required_text("name", self.name, "Name is required")?,
            email: optional_email("email", self.email)?,
            phone: optional_text(self.phone),
            role: optional_text(self.role),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// The four non-negative cost components of a quote and their exact sum.
///
/// Only constructible through [`QuoteCosts::new`], so `total` can never
/// disagree with the components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuoteCosts {
    flight: Decimal,
    boarding: Decimal,
    medical: Decimal,
    additional: Decimal,
    total: Decimal,
}

impl QuoteCosts {
    pub fn new(
        flight: Decimal,
        boarding: Decimal,
        medical: Decimal,
        additional: Decimal,
    ) -> Result<Self, ValidationError> {
        let flight = non_negative("flight_cost", flight, "Cost must be non-negative")?;
        let boarding = non_negative("boarding_cost", boarding, "Cost must be non-negative")?;
        let medical = non_negative("medical_cost", medical, "Cost must be non-negative")?;
        let additional =
            non_negative("additional_fees", additional, "Fees must be non-negative")?;

        let total = flight
            .checked_add(boarding)
            .and_then(|t| t.checked_add(medical))
            .and_then(|t| t.checked_add(additional))
            .ok_or_else(|| ValidationError::new("total_amount", "Total is out of range"))?;

        Ok(Self {
            flight,
            boarding,
            medical,
            additional,
            total,
        })
    }

    pub fn flight(&self) -> Decimal {
        self.flight
    }

    pub fn boarding(&self) -> Decimal {
        self.boarding
    }

    pub fn medical(&self) -> Decimal {
        self.medical
    }

    pub fn additional(&self) -> Decimal {
        self.additional
    }

    pub fn total(&self) -> Decimal {
        self.total
    }
}

/// Quote request body. A client-supplied `total_amount` is ignored: it is not
/// a field here and unknown keys are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteInput {
    pub customer_id: Option<i64>,
    pub quote_number: Option<String>,
    pub status: Option<QuoteStatus>,
    pub dog_name: Option<String>,
    pub dog_breed: Option<String>,
    pub dog_weight: Option<Decimal>,
    pub departure_city: Option<String>,
    pub destination_city: Option<String>,
    #[serde(deserialize_with = "crate::wire::blank_date")]
    pub travel_date: Option<NaiveDate>,
    pub flight_cost: Option<Decimal>,
    pub boarding_cost: Option<Decimal>,
    pub medical_cost: Option<Decimal>,
    pub additional_fees: Option<Decimal>,
    pub notes: Option<String>,
    #[serde(deserialize_with = "crate::wire::blank_date")]
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub customer_id: Option<i64>,
    pub quote_number: String,
    pub status: QuoteStatus,
    pub dog_name: Option<String>,
    pub dog_breed: Option<String>,
    pub dog_weight: Option<Decimal>,
    pub departure_city: Option<String>,
    pub destination_city: Option<String>,
    pub travel_date: Option<NaiveDate>,
    pub costs: QuoteCosts,
    pub notes: Option<String>,
    pub valid_until: Option<NaiveDate>,
}

impl NewQuote {
    pub fn total_amount(&self) -> Decimal {
        self.costs.total()
    }

    /// Rebuild a write from a stored quote, e.g. to re-apply it with a new status.
    pub fn from_stored(q: &Quote) -> Result<Self, ValidationError> {
        Ok(Self {
            customer_id: q.customer_id,
            quote_number: q.quote_number.clone(),
            status: q.status,
            dog_name: q.dog_name.clone(),
            dog_breed: q.dog_breed.clone(),
            dog_weight: q.dog_weight,
            departure_city: q.departure_city.clone(),
            destination_city: q.destination_city.clone(),
            travel_date: q.travel_date,
            costs: QuoteCosts::new(
                q.flight_cost,
                q.boarding_cost,
                q.medical_cost,
                q.additional_fees,
            )?,
            notes: q.notes.clone(),
            valid_until: q.valid_until,
        })
    }
}

/// `DPT-` followed by the last six digits of `now` in epoch milliseconds.
pub fn default_quote_number(now: DateTime<Utc>) -> String {
    format!("DPT-{:06}", now.timestamp_millis().rem_euclid(1_000_000))
}

impl QuoteInput {
    pub fn validate(self) -> Result<NewQuote, ValidationError> {
        self.validate_at(Utc::now())
    }

    /// A missing or blank `quote_number` gets [`default_quote_number`] for `now`.
    pub fn validate_at(self, now: DateTime<Utc>) -> Result<NewQuote, ValidationError> {
        let quote_number = match self.quote_number {
            Some(n) if !n.trim().is_empty() => n,
            _ => default_quote_number(now),
        };
        let dog_weight =
            optional_non_negative("dog_weight", self.dog_weight, "Weight must be positive")?;
        let costs = QuoteCosts::new(
            self.flight_cost.unwrap_or_default(),
            self.boarding_cost.unwrap_or_default(),
            self.medical_cost.unwrap_or_default(),
            self.additional_fees.unwrap_or_default(),
        )?;

        Ok(NewQuote {
            customer_id: self.customer_id,
            quote_number,
            status: self.status.unwrap_or_default(),
            dog_name: optional_text(self.dog_name),
            dog_breed: optional_text(self.dog_breed),
            dog_weight,
            departure_city: optional_text(self.departure_city),
            destination_city: optional_text(self.destination_city),
            travel_date: self.travel_date,
            costs,
            notes: optional_text(self.notes),
            valid_until: self.valid_until,
        })
    }
}

// ---------------------------------------------------------------------------
// Schedules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleInput {
    pub employee_id: Option<i64>,
    pub order_id: Option<i64>,
    pub schedule_type: Option<ScheduleType>,
    #[serde(deserialize_with = "crate::wire::blank_date")]
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<String>,
    pub address: Option<String>,
    pub status: Option<ScheduleStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSchedule {
    pub employee_id: Option<i64>,
    pub order_id: Option<i64>,
    pub schedule_type: ScheduleType,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: Option<String>,
    pub address: Option<String>,
    pub status: ScheduleStatus,
    pub notes: Option<String>,
}

impl NewSchedule {
    pub fn is_completed(&self) -> bool {
        self.status == ScheduleStatus::Completed
    }

    /// `completed_at` after this write: stamped when the schedule becomes
    /// completed, kept while it stays completed, cleared when it leaves.
    pub fn completed_at(
        &self,
        prior: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if self.is_completed() {
            Some(prior.unwrap_or(now))
        } else {
            None
        }
    }
}

impl ScheduleInput {
    pub fn validate(self) -> Result<NewSchedule, ValidationError> {
        let scheduled_date = self
            .scheduled_date
            .ok_or_else(|| ValidationError::new("scheduled_date", "Date is required"))?;

        Ok(NewSchedule {
            employee_id: self.employee_id,
            order_id: self.order_id,
            schedule_type: self.schedule_type.unwrap_or_default(),
            scheduled_date,
            scheduled_time: optional_text(self.scheduled_time),
            address: optional_text(self.address),
            status: self.status.unwrap_or_default(),
            notes: optional_text(self.notes),
        })
    }
}
