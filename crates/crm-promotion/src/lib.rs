//! Quote → order promotion.
//!
//! The rule is split into a pure decision ([`evaluate_promotion`]) and a pure
//! derivation ([`derive_order`]). Storage backends call both inside a single
//! transaction; nothing here performs I/O.

mod evaluator;
mod types;

pub use evaluator::{derive_order, derive_order_number, evaluate_promotion};
pub use types::{
    PriorQuoteState, PromotionDecision, SkipReason, ORDER_NUMBER_PREFIX, QUOTE_NUMBER_PREFIX,
};
