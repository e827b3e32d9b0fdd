use rust_decimal::{Decimal, RoundingStrategy};

use crate::money::Money;

/// Share of the purchase cost already written off, in percent (two decimals).
///
/// Zero when the purchase cost is zero or negative.
pub fn depreciated_percentage(purchase_cost: Money, current_book_value: Money) -> Decimal {
    if !purchase_cost.is_positive() {
        return Decimal::ZERO;
    }
    let written_off = (purchase_cost - current_book_value).as_decimal();
    (written_off / purchase_cost.as_decimal() * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_cost_is_zero_percent() {
        assert_eq!(depreciated_percentage(Money::ZERO, Money::new(500, 0)), Decimal::ZERO);
    }

    #[test]
    fn quarter_book_value_is_seventy_five_percent() {
        let pct = depreciated_percentage(Money::new(1000, 0), Money::new(250, 0));
        assert_eq!(pct, Decimal::new(75, 0));
    }

    #[test]
    fn rounds_to_two_decimals() {
        let pct = depreciated_percentage(Money::new(300, 0), Money::new(200, 0));
        assert_eq!(pct, Decimal::new(3333, 2));
    }
}
