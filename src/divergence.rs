// 10.1 divergence.rs: pairs divergence signal between leg X and leg Y related by a leverage ratio r.
// on the second bar of a shared interval compare fractional moves and bet on reversion.
//   changeX >  1.001 * r * changeY  -> short X (units = -trade_size)
//   changeX < -1.001 * r * changeY  -> long X  (units = +trade_size)
//   otherwise flat

use crate::types::InstrumentId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

/// Band factor keeping boundary noise from flipping the signal.
pub const HYSTERESIS_BAND: Decimal = dec!(1.001);

/// Target units on leg X for a pair of fractional changes.
pub fn divergence_units(change_x: Decimal, change_y: Decimal, leverage_ratio: Decimal, trade_size: i64) -> i64 {
    let threshold = HYSTERESIS_BAND * leverage_ratio * change_y;
    if change_x > threshold {
        -trade_size
    } else if change_x < -threshold {
        trade_size
    } else {
        0
    }
}

/// Closes reported in the current bar interval, keyed by instrument.
#[derive(Debug, Clone, Default)]
pub struct BarRecord {
    closes: HashMap<InstrumentId, Decimal>,
}

impl BarRecord {
    pub fn record(&mut self, instrument: InstrumentId, close: Decimal) {
        self.closes.insert(instrument, close);
    }

    pub fn close(&self, instrument: InstrumentId) -> Option<Decimal> {
        self.closes.get(&instrument).copied()
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn clear(&mut self) {
        self.closes.clear();
    }
}

/// Result of one completed bar-pair evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairEvaluation {
    pub units: i64,
    pub change_x: Decimal,
    pub change_y: Decimal,
    pub close_x: Decimal,
    pub close_y: Decimal,
}

#[derive(Debug, Clone)]
pub struct PairsEstimator {
    leg_x: InstrumentId,
    leg_y: InstrumentId,
    bars: BarRecord,
    last_x: Option<Decimal>,
    last_y: Option<Decimal>,
    change_x: Decimal,
    change_y: Decimal,
}

impl PairsEstimator {
    pub fn new(leg_x: InstrumentId, leg_y: InstrumentId) -> Self {
        Self {
            leg_x,
            leg_y,
            bars: BarRecord::default(),
            last_x: None,
            last_y: None,
            change_x: Decimal::ZERO,
            change_y: Decimal::ZERO,
        }
    }

    pub fn legs(&self) -> (InstrumentId, InstrumentId) {
        (self.leg_x, self.leg_y)
    }

    pub fn tracks(&self, instrument: InstrumentId) -> bool {
        instrument == self.leg_x || instrument == self.leg_y
    }

    /// Record a bar close. evaluates once both legs have reported in this interval,
    /// then clears the interval. bars for other instruments are ignored.
    pub fn on_bar(
        &mut self,
        instrument: InstrumentId,
        close: Decimal,
        leverage_ratio: Decimal,
        trade_size: i64,
    ) -> Option<PairEvaluation> {
        if !self.tracks(instrument) {
            return None;
        }
        self.bars.record(instrument, close);
        if self.bars.len() < 2 {
            return None;
        }

        let close_x = self.bars.close(self.leg_x)?;
        let close_y = self.bars.close(self.leg_y)?;

        // changes keep their previous values until both last closes are known
        if let (Some(last_x), Some(last_y)) = (self.last_x, self.last_y) {
            if !last_x.is_zero() && !last_y.is_zero() {
                self.change_x = close_x / last_x - Decimal::ONE;
                self.change_y = close_y / last_y - Decimal::ONE;
            }
        }
        self.last_x = Some(close_x);
        self.last_y = Some(close_y);

        let units = divergence_units(self.change_x, self.change_y, leverage_ratio, trade_size);
        self.bars.clear();

        Some(PairEvaluation {
            units,
            change_x: self.change_x,
            change_y: self.change_y,
            close_x,
            close_y,
        })
    }

    pub fn pending_bars(&self) -> usize {
        self.bars.len()
    }

    pub fn changes(&self) -> (Decimal, Decimal) {
        (self.change_x, self.change_y)
    }

    pub fn reset(&mut self) {
        self.bars.clear();
        self.last_x = None;
        self.last_y = None;
        self.change_x = Decimal::ZERO;
        self.change_y = Decimal::ZERO;
    }
}
