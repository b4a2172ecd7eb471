// Property-based tests for line item amount derivation.
//
// The amount column is derived, never caller-set: amount = quantity × rate,
// rounded to the ledger scale.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use careledger::invoices::LineItem;

proptest! {
    /// Property: amount always equals quantity × rate at ledger scale
    #[test]
    fn prop_amount_is_quantity_times_rate(
        quantity in 1i32..1000i32,
        rate_cents in 0u64..10_000_000u64,
    ) {
        let rate = Decimal::from(rate_cents) / Decimal::from(100);
        let item = LineItem::new("Lab panel".to_string(), quantity, rate).unwrap();

        prop_assert_eq!(item.amount, (Decimal::from(quantity) * rate).round_dp(2));
        prop_assert!(item.amount >= Decimal::ZERO);
    }

    /// Property: invalid quantities are always rejected
    #[test]
    fn prop_non_positive_quantity_rejected(quantity in -1000i32..1i32) {
        let result = LineItem::new("Lab panel".to_string(), quantity, dec!(100));
        prop_assert!(result.is_err());
    }
}

#[test]
fn test_amount_simple() {
    let item = LineItem::new("General consultation".to_string(), 2, dec!(300)).unwrap();
    assert_eq!(item.amount, dec!(600));
}

#[test]
fn test_amount_rounded_to_two_places() {
    let item = LineItem::new("Compounded dose".to_string(), 3, dec!(0.335)).unwrap();
    // 3 × 0.335 = 1.005, banker's rounding lands on 1.00
    assert_eq!(item.amount, dec!(1.00));
}

#[test]
fn test_negative_rate_rejected() {
    assert!(LineItem::new("Adjustment".to_string(), 1, dec!(-5)).is_err());
}

#[test]
fn test_blank_description_rejected() {
    assert!(LineItem::new("  ".to_string(), 1, dec!(5)).is_err());
}
