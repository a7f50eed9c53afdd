//! Property-based tests for order total arithmetic.
//!
//! These verify pricing invariants across a wide range of inputs using exact
//! decimal arithmetic, catching edge cases that the example-based tests miss.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use storefront_api::services::orders::order_totals;

fn price_strategy() -> impl Strategy<Value = Decimal> {
    // Prices in minor units up to 10,000,000.00 with two decimal places
    (0i64..1_000_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn line_strategy() -> impl Strategy<Value = (Decimal, i32)> {
    (price_strategy(), 1i32..100)
}

fn lines_strategy() -> impl Strategy<Value = Vec<(Decimal, i32)>> {
    prop::collection::vec(line_strategy(), 1..10)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn grand_total_is_subtotal_plus_tax(lines in lines_strategy()) {
        let totals = order_totals(&lines, dec!(0.1));
        prop_assert_eq!(totals.grand_total, totals.subtotal + totals.tax);
    }

    #[test]
    fn ten_percent_tax_is_exact(lines in lines_strategy()) {
        let totals = order_totals(&lines, dec!(0.1));
        prop_assert_eq!(totals.tax, totals.subtotal * dec!(0.1));
        prop_assert_eq!(totals.grand_total, totals.subtotal * dec!(1.1));
    }

    #[test]
    fn subtotal_is_sum_of_line_totals(lines in lines_strategy()) {
        let expected: Decimal = lines
            .iter()
            .map(|(price, qty)| *price * Decimal::from(*qty))
            .sum();
        let totals = order_totals(&lines, dec!(0.1));
        prop_assert_eq!(totals.subtotal, expected);
    }

    #[test]
    fn adding_a_line_never_decreases_the_total(
        lines in lines_strategy(),
        extra in line_strategy(),
    ) {
        let before = order_totals(&lines, dec!(0.1));
        let mut extended = lines;
        extended.push(extra);
        let after = order_totals(&extended, dec!(0.1));
        prop_assert!(after.grand_total >= before.grand_total);
    }

    #[test]
    fn zero_tax_rate_means_no_tax(lines in lines_strategy()) {
        let totals = order_totals(&lines, Decimal::ZERO);
        prop_assert_eq!(totals.tax, Decimal::ZERO);
        prop_assert_eq!(totals.grand_total, totals.subtotal);
    }
}
