use crm_schemas::{NewOrder, NewQuote, OrderStatus, QuoteStatus};

use crate::types::{
    PriorQuoteState, PromotionDecision, SkipReason, ORDER_NUMBER_PREFIX, QUOTE_NUMBER_PREFIX,
};

// ============================================================================
// Public API
// ============================================================================

/// Decide whether an update to `next_status` promotes the quote.
///
/// Fires only when all three hold:
/// 1. the update sets status to `accepted`,
/// 2. the prior status was not `accepted`,
/// 3. the quote has no linked order.
///
/// Condition 3 makes the rule one-shot: once an order is linked, no later
/// status sequence (including accepted → declined → accepted) fires again.
pub fn evaluate_promotion(prior: &PriorQuoteState, next_status: QuoteStatus) -> PromotionDecision {
    if next_status != QuoteStatus::Accepted {
        return PromotionDecision::Skip {
            reason: SkipReason::NotAccepting,
        };
    }
    if prior.status == QuoteStatus::Accepted {
        return PromotionDecision::Skip {
            reason: SkipReason::AlreadyAccepted,
        };
    }
    if let Some(order_id) = prior.order_id {
        return PromotionDecision::Skip {
            reason: SkipReason::AlreadyLinked { order_id },
        };
    }
    PromotionDecision::Promote
}

/// Order number for a promoted quote: `DPT-123456` → `ORD-123456`.
///
/// Only a leading `DPT-` is rewritten. A quote number without that prefix
/// keeps its full text as the suffix, so an inner `DPT-` survives:
/// `X-DPT-1` → `ORD-X-DPT-1`, where a plain substring replace would give
/// `X-ORD-1`. Browser clients that derived order numbers with a replace
/// disagree with this for such numbers.
pub fn derive_order_number(quote_number: &str) -> String {
    let suffix = quote_number
        .strip_prefix(QUOTE_NUMBER_PREFIX)
        .unwrap_or(quote_number);
    format!("{ORDER_NUMBER_PREFIX}{suffix}")
}

/// Build the order created by promoting `quote` (the quote as written by the
/// triggering update, with its recomputed total).
pub fn derive_order(quote: &NewQuote) -> NewOrder {
    NewOrder {
        customer_id: quote.customer_id,
        order_number: derive_order_number(&quote.quote_number),
        status: OrderStatus::Confirmed,
        pickup_address: quote.departure_city.clone(),
        delivery_address: quote.destination_city.clone(),
        pickup_date: quote.travel_date,
        delivery_date: quote.travel_date,
        dog_name: quote.dog_name.clone(),
        dog_breed: quote.dog_breed.clone(),
        dog_weight: quote.dog_weight,
        special_instructions: quote.notes.clone(),
        total_amount: Some(quote.total_amount()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_replaces_quote_prefix() {
        assert_eq!(derive_order_number("DPT-123456"), "ORD-123456");
    }

    #[test]
    fn order_number_without_quote_prefix_keeps_text() {
        assert_eq!(derive_order_number("Q-77"), "ORD-Q-77");
        assert_eq!(derive_order_number("X-DPT-1"), "ORD-X-DPT-1");
    }

    #[test]
    fn only_first_prefix_is_replaced() {
        assert_eq!(derive_order_number("DPT-DPT-9"), "ORD-DPT-9");
    }
}
