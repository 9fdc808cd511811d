//! Position target translation.
//!
//! Turns a raw signal into share counts. The imbalance engine trades a fixed
//! unit per signal, guarded by a notional cap; the pairs engine sizes both
//! legs so their dollar exposures stay proportioned by the leverage ratio.

use crate::types::PositionSide;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Shares to trade for a classified side: `unit * sign(side)`.
pub fn imbalance_trade_size(side: PositionSide, position_unit: i64) -> i64 {
    position_unit * side.sign()
}

/// Refuses trades that would leave `|position| * price` at or above the cap.
/// Never forces an unwind; it only stops adding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotionalCap {
    limit: Decimal,
}

impl NotionalCap {
    pub fn new(limit: Decimal) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Decimal {
        self.limit
    }

    pub fn breached(&self, desired: i64, current: i64, price: Decimal) -> bool {
        let resulting = Decimal::from(desired.saturating_add(current)).abs();
        resulting * price >= self.limit
    }

    /// `desired`, or zero when the resulting exposure would breach the cap.
    pub fn apply(&self, desired: i64, current: i64, price: Decimal) -> i64 {
        if self.breached(desired, current, price) {
            0
        } else {
            desired
        }
    }
}

/// Signed share deltas for the two pairs legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LegDeltas {
    pub x: i64,
    pub y: i64,
}

/// Hedge sizing for the pairs engine:
/// `x = units * price_y - pos_x`, `y = units * ratio * price_x - pos_y`,
/// truncated toward zero.
pub fn pairs_leg_deltas(
    units: i64,
    leverage_ratio: Decimal,
    price_x: Decimal,
    price_y: Decimal,
    position_x: i64,
    position_y: i64,
) -> LegDeltas {
    let units = Decimal::from(units);
    let x = units * price_y - Decimal::from(position_x);
    let y = units * leverage_ratio * price_x - Decimal::from(position_y);
    LegDeltas {
        x: to_shares(x),
        y: to_shares(y),
    }
}

fn to_shares(value: Decimal) -> i64 {
    value.trunc().to_i64().unwrap_or_else(|| {
        if value.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn trade_size_follows_side() {
        assert_eq!(imbalance_trade_size(PositionSide::Long, 100), 100);
        assert_eq!(imbalance_trade_size(PositionSide::Short, 100), -100);
        assert_eq!(imbalance_trade_size(PositionSide::Flat, 100), 0);
    }

    #[test]
    fn cap_blocks_at_boundary() {
        let cap = NotionalCap::new(dec!(500000));
        // (100 + 4900) * 100 = 500,000 -> exactly at the cap
        assert_eq!(cap.apply(100, 4900, dec!(100)), 0);
        assert_eq!(cap.apply(100, 4800, dec!(100)), 100);
    }

    #[test]
    fn cap_allows_reducing_trades() {
        let cap = NotionalCap::new(dec!(500000));
        // short 100 against a long 6000 leaves 5900 * 100 = 590,000 -> still blocked
        assert_eq!(cap.apply(-100, 6000, dec!(100)), 0);
        // short 100 against long 4000 leaves 390,000
        assert_eq!(cap.apply(-100, 4000, dec!(100)), -100);
    }

    #[test]
    fn leg_deltas_match_hedge_formula() {
        // units 1, ratio 3, x @ 50, y @ 150, flat
        let deltas = pairs_leg_deltas(1, dec!(3), dec!(50), dec!(150), 0, 0);
        assert_eq!(deltas, LegDeltas { x: 150, y: 150 });

        // short one unit while already holding the long
        let deltas = pairs_leg_deltas(-1, dec!(3), dec!(50), dec!(150), 150, 150);
        assert_eq!(deltas, LegDeltas { x: -300, y: -300 });
    }

    #[test]
    fn leg_deltas_truncate_toward_zero() {
        let deltas = pairs_leg_deltas(1, dec!(3), dec!(10.5), dec!(20.7), 0, 0);
        assert_eq!(deltas.x, 20);
        assert_eq!(deltas.y, 31);

        let deltas = pairs_leg_deltas(-1, dec!(3), dec!(10.5), dec!(20.7), 0, 0);
        assert_eq!(deltas.x, -20);
        assert_eq!(deltas.y, -31);
    }

    #[test]
    fn flat_units_unwind_positions() {
        let deltas = pairs_leg_deltas(0, dec!(3), dec!(10), dec!(30), 30, -30);
        assert_eq!(deltas, LegDeltas { x: -30, y: 30 });
    }
}
