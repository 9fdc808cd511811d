//! Order-book imbalance ("signed volume") signal.
//!
//! Scores directional pressure from the top three levels of each side against
//! the reference (last trade) price:
//!
//! ```text
//! pressure = |wavg_ask - ref| * bid_size - |ref - wavg_bid| * ask_size
//! ```
//!
//! Positive pressure reads LONG, negative SHORT, zero FLAT. Every score is
//! recorded in the instrument's rolling window, and the classification is only
//! acted on once that window is full.

use crate::book::OrderBookSnapshot;
use crate::types::{InstrumentId, PositionSide};
use crate::window::RollingWindow;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Pressure score for a book against a reference price.
/// None when either side has no populated level, or the score overflows.
pub fn pressure(book: &OrderBookSnapshot, reference: Decimal) -> Option<Decimal> {
    let weighted_ask = book.weighted_ask()?;
    let weighted_bid = book.weighted_bid()?;
    let bid_push = weighted_ask.checked_sub(reference)?.abs().checked_mul(book.total_bid_size())?;
    let ask_push = reference.checked_sub(weighted_bid)?.abs().checked_mul(book.total_ask_size())?;
    bid_push.checked_sub(ask_push)
}

/// Per-instrument window of pressure scores.
#[derive(Debug, Clone)]
pub struct SignedVolume {
    window: RollingWindow<Decimal>,
}

impl SignedVolume {
    pub fn new(window_size: usize) -> Self {
        Self {
            window: RollingWindow::new(window_size),
        }
    }

    /// Record a score and classify it. zero is recorded but gives no push.
    pub fn update(&mut self, score: Decimal) -> PositionSide {
        self.window.push(score);
        PositionSide::from_score(score)
    }

    pub fn fully_initialized(&self) -> bool {
        self.window.full()
    }

    pub fn window(&self) -> &RollingWindow<Decimal> {
        &self.window
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }
}

/// One scored quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImbalanceReading {
    pub pressure: Decimal,
    pub side: PositionSide,
    /// Window is full; the side may drive a position update.
    pub ready: bool,
}

/** estimator state for every instrument it has seen */
#[derive(Debug, Clone)]
pub struct ImbalanceEstimator {
    window_size: usize,
    volumes: HashMap<InstrumentId, SignedVolume>,
}

impl ImbalanceEstimator {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            volumes: HashMap::new(),
        }
    }

    /// Score a quote. windows are created lazily on first use.
    pub fn on_quote(
        &mut self,
        instrument: InstrumentId,
        book: &OrderBookSnapshot,
        reference: Decimal,
    ) -> Option<ImbalanceReading> {
        let score = pressure(book, reference)?;
        let window_size = self.window_size;
        let volume = self
            .volumes
            .entry(instrument)
            .or_insert_with(|| SignedVolume::new(window_size));
        let side = volume.update(score);
        Some(ImbalanceReading {
            pressure: score,
            side,
            ready: volume.fully_initialized(),
        })
    }

    pub fn volume(&self, instrument: InstrumentId) -> Option<&SignedVolume> {
        self.volumes.get(&instrument)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn reset(&mut self) {
        self.volumes.clear();
    }
}
