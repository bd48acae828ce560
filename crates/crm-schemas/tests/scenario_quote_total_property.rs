//! Scenario: a quote's total is the exact sum of its four cost components for
//! any non-negative amounts, and a negative component is always refused.

use crm_schemas::QuoteCosts;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Non-negative amounts with up to six decimal places, well inside the range
/// where a four-way sum cannot overflow.
fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..=1_000_000_000_000_000i64, 0u32..=6).prop_map(|(m, scale)| Decimal::new(m, scale))
}

proptest! {
    #[test]
    fn prop_total_is_exact_sum(f in amount(), b in amount(), m in amount(), a in amount()) {
        let costs = QuoteCosts::new(f, b, m, a).expect("valid costs");
        prop_assert_eq!(costs.total(), f + b + m + a);
        prop_assert_eq!(costs.flight(), f);
        prop_assert_eq!(costs.boarding(), b);
        prop_assert_eq!(costs.medical(), m);
        prop_assert_eq!(costs.additional(), a);
    }

    #[test]
    fn prop_negative_component_is_refused(
        f in amount(),
        b in amount(),
        neg in 1i64..=1_000_000_000i64,
        scale in 0u32..=4,
        slot in 0usize..4,
    ) {
        let mut parts = [f, b, Decimal::ZERO, Decimal::ZERO];
        parts[slot] = -Decimal::new(neg, scale);
        let err = QuoteCosts::new(parts[0], parts[1], parts[2], parts[3])
            .expect_err("negative cost accepted");
        let expected = ["flight_cost", "boarding_cost", "medical_cost", "additional_fees"][slot];
        prop_assert_eq!(err.field, expected);
    }
}
