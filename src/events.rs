// 4.0: everything the host pushes into an engine. one tagged variant per event kind,
// delivered through a single handle(event) entry point per engine.

use crate::book::BookLevel;
use crate::types::{InstrumentId, OrderId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketEvent {
    /// A bar interval completed for an instrument.
    Bar(BarEvent),
    /// Order book changed. best-first levels per side.
    Quote(QuoteEvent),
    /// Trade print.
    Trade(TradeEvent),
    /// Asynchronous notification about one of our orders.
    OrderUpdate(OrderUpdate),
    /// Out-of-band operator command.
    Command(ControlCommand),
}

impl MarketEvent {
    /// Instrument this event relates to, if any.
    pub fn instrument(&self) -> Option<InstrumentId> {
        match self {
            MarketEvent::Bar(e) => Some(e.instrument),
            MarketEvent::Quote(e) => Some(e.instrument),
            MarketEvent::Trade(e) => Some(e.instrument),
            MarketEvent::OrderUpdate(e) => Some(e.instrument),
            MarketEvent::Command(_) => None,
        }
    }

    pub fn bar(instrument: InstrumentId, close: Decimal, bar_time: Timestamp) -> Self {
        MarketEvent::Bar(BarEvent {
            instrument,
            close,
            bar_time,
        })
    }

    pub fn quote(
        instrument: InstrumentId,
        bids: Vec<BookLevel>,
        asks: Vec<BookLevel>,
        timestamp: Timestamp,
    ) -> Self {
        MarketEvent::Quote(QuoteEvent {
            instrument,
            bids,
            asks,
            timestamp,
        })
    }

    pub fn trade(instrument: InstrumentId, price: Decimal, size: u64, timestamp: Timestamp) -> Self {
        MarketEvent::Trade(TradeEvent {
            instrument,
            price,
            size,
            timestamp,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarEvent {
    pub instrument: InstrumentId,
    pub close: Decimal,
    pub bar_time: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteEvent {
    pub instrument: InstrumentId,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvent {
    pub instrument: InstrumentId,
    pub price: Decimal,
    pub size: u64,
    pub timestamp: Timestamp,
}

/// Lifecycle state reported by the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Working,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// Filled, cancelled and rejected orders are done.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillInfo {
    pub quantity: u64,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub order_id: OrderId,
    pub instrument: InstrumentId,
    pub status: OrderStatus,
    pub fill: Option<FillInfo>,
    pub timestamp: Timestamp,
}

impl OrderUpdate {
    pub fn new(order_id: OrderId, instrument: InstrumentId, status: OrderStatus, timestamp: Timestamp) -> Self {
        Self {
            order_id,
            instrument,
            status,
            fill: None,
            timestamp,
        }
    }

    pub fn with_fill(mut self, quantity: u64, price: Decimal) -> Self {
        self.fill = Some(FillInfo { quantity, price });
        self
    }

    pub fn completes_order(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Operator commands. invoked out of band, never triggered by market data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlCommand {
    RepriceAll,
    CancelAll,
}

impl ControlCommand {
    /// Numeric command ids as registered with the host's command menu.
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(ControlCommand::RepriceAll),
            2 => Some(ControlCommand::CancelAll),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ControlCommand::RepriceAll => "Reprice Existing Orders",
            ControlCommand::CancelAll => "Cancel All Orders",
        }
    }
}
