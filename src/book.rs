// 3.0 book.rs: instruments and what we know about their market right now.
// the order book itself is owned by the feed; we only keep the last snapshot per instrument.

use crate::types::{AssetClass, InstrumentId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Levels per side read from a quote.
pub const BOOK_DEPTH: usize = 3;

/** 3.1: one aggregated price level. zero price or zero size means "not populated" */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub size: u64,
}

impl BookLevel {
    pub fn new(price: Decimal, size: u64) -> Self {
        Self { price, size }
    }

    pub fn is_populated(&self) -> bool {
        self.size > 0 && self.price > Decimal::ZERO
    }
}

/** 3.2: top BOOK_DEPTH levels per side. missing levels are zero price / zero size */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderBookSnapshot {
    pub bids: [BookLevel; BOOK_DEPTH],
    pub asks: [BookLevel; BOOK_DEPTH],
}

impl OrderBookSnapshot {
    /// Build from best-first level lists. anything past BOOK_DEPTH is ignored.
    pub fn from_levels(bids: &[BookLevel], asks: &[BookLevel]) -> Self {
        Self {
            bids: top_levels(bids),
            asks: top_levels(asks),
        }
    }

    pub fn weighted_ask(&self) -> Option<Decimal> {
        weighted_average(&self.asks)
    }

    pub fn weighted_bid(&self) -> Option<Decimal> {
        weighted_average(&self.bids)
    }

    pub fn total_ask_size(&self) -> Decimal {
        total_size(&self.asks)
    }

    pub fn total_bid_size(&self) -> Decimal {
        total_size(&self.bids)
    }
}

fn top_levels(levels: &[BookLevel]) -> [BookLevel; BOOK_DEPTH] {
    let mut out = [BookLevel::default(); BOOK_DEPTH];
    for (slot, level) in out.iter_mut().zip(levels.iter()) {
        if level.is_populated() {
            *slot = *level;
        }
    }
    out
}

// summed as Decimal: three u64 levels can exceed u64::MAX
fn total_size(levels: &[BookLevel]) -> Decimal {
    levels
        .iter()
        .filter(|l| l.is_populated())
        .map(|l| Decimal::from(l.size))
        .sum()
}

/// Size-weighted average price over populated levels.
/// None when the side is empty or the notional does not fit in a Decimal.
pub fn weighted_average(levels: &[BookLevel]) -> Option<Decimal> {
    let mut notional = Decimal::ZERO;
    let mut size = Decimal::ZERO;
    for level in levels.iter().filter(|l| l.is_populated()) {
        let level_size = Decimal::from(level.size);
        notional = notional.checked_add(level.price.checked_mul(level_size)?)?;
        size += level_size;
    }
    if size.is_zero() {
        None
    } else {
        notional.checked_div(size)
    }
}

/** 3.3: best bid / best ask as seen on the last quote */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TopQuote {
    pub bid: Option<Decimal>,
    pub bid_size: u64,
    pub ask: Option<Decimal>,
    pub ask_size: u64,
}

impl TopQuote {
    /// Touch is the first populated level per side; an empty slot 0 does not hide deeper levels.
    pub fn from_snapshot(book: &OrderBookSnapshot) -> Self {
        let best_bid = first_populated(&book.bids);
        let best_ask = first_populated(&book.asks);
        Self {
            bid: best_bid.map(|l| l.price),
            bid_size: best_bid.map_or(0, |l| l.size),
            ask: best_ask.map(|l| l.price),
            ask_size: best_ask.map_or(0, |l| l.size),
        }
    }
}

fn first_populated(levels: &[BookLevel]) -> Option<BookLevel> {
    levels.iter().find(|l| l.is_populated()).copied()
}

/// Static identity of a tradeable instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: InstrumentId,
    pub symbol: String,
    pub asset_class: AssetClass,
}

impl Instrument {
    pub fn new(id: InstrumentId, symbol: impl Into<String>, asset_class: AssetClass) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            asset_class,
        }
    }

    pub fn equity(id: u32, symbol: impl Into<String>) -> Self {
        Self::new(InstrumentId(id), symbol, AssetClass::Equity)
    }
}

/// Live market state for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentState {
    pub instrument: Instrument,
    pub book: OrderBookSnapshot,
    pub top: TopQuote,
    pub last_trade: Option<Decimal>,
    pub last_update: Option<Timestamp>,
}

impl InstrumentState {
    pub fn new(instrument: Instrument) -> Self {
        Self {
            instrument,
            book: OrderBookSnapshot::default(),
            top: TopQuote::default(),
            last_trade: None,
            last_update: None,
        }
    }
}

/** 3.4: instruments an engine was configured with, keyed by handle */
#[derive(Debug, Clone, Default)]
pub struct InstrumentRegistry {
    states: HashMap<InstrumentId, InstrumentState>,
}

impl InstrumentRegistry {
    pub fn new(instruments: impl IntoIterator<Item = Instrument>) -> Self {
        let states = instruments
            .into_iter()
            .map(|inst| (inst.id, InstrumentState::new(inst)))
            .collect();
        Self { states }
    }

    pub fn contains(&self, id: InstrumentId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn get(&self, id: InstrumentId) -> Option<&InstrumentState> {
        self.states.get(&id)
    }

    /// Record a quote. returns the new snapshot, or None for an unknown instrument.
    pub fn apply_quote(
        &mut self,
        id: InstrumentId,
        bids: &[BookLevel],
        asks: &[BookLevel],
        timestamp: Timestamp,
    ) -> Option<OrderBookSnapshot> {
        let state = self.states.get_mut(&id)?;
        state.book = OrderBookSnapshot::from_levels(bids, asks);
        state.top = TopQuote::from_snapshot(&state.book);
        state.last_update = Some(timestamp);
        Some(state.book)
    }

    /// Record a trade print. returns false for an unknown instrument.
    pub fn apply_trade(&mut self, id: InstrumentId, price: Decimal, timestamp: Timestamp) -> bool {
        match self.states.get_mut(&id) {
            Some(state) => {
                state.last_trade = Some(price);
                state.last_update = Some(timestamp);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstrumentState> {
        self.states.values()
    }

    /// Instrument ids in handle order, for stable reporting.
    pub fn ids(&self) -> Vec<InstrumentId> {
        let mut ids: Vec<InstrumentId> = self.states.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Forget all market data but keep the instruments.
    pub fn clear_market_data(&mut self) {
        for state in self.states.values_mut() {
            let instrument = state.instrument.clone();
            *state = InstrumentState::new(instrument);
        }
    }
}
