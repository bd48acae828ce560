use crm_schemas::QuoteStatus;
use serde::{Deserialize, Serialize};

/// Prefix carried by quote numbers issued by the front office.
pub const QUOTE_NUMBER_PREFIX: &str = "DPT-";
/// Prefix carried by every order number derived from a quote.
pub const ORDER_NUMBER_PREFIX: &str = "ORD-";

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// The stored state of a quote immediately before an update is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorQuoteState {
    pub status: QuoteStatus,
    pub order_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PromotionDecision {
    /// Create an order from the updated quote and link it back.
    Promote,
    /// Apply the field update only.
    Skip { reason: SkipReason },
}

impl PromotionDecision {
    pub fn fires(&self) -> bool {
        matches!(self, PromotionDecision::Promote)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The update does not set status to `accepted`.
    NotAccepting,
    /// The quote was already `accepted` before this update.
    AlreadyAccepted,
    /// The quote already links to an order.
    AlreadyLinked { order_id: i64 },
}
