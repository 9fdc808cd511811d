//! Boundary contracts with the outside world.
//!
//! The engines never own an execution venue or a portfolio. They call into
//! these traits from inside the callback that delivered the triggering event
//! and react to whatever comes back.

use crate::snapshot::SnapshotSink;
use crate::types::{InstrumentId, OrderId, OrderType, Side, TimeInForce, Venue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the venue needs to accept a new order or a replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderParams {
    pub instrument: InstrumentId,
    pub side: Side,
    pub quantity: u64,
    pub price: Decimal,
    pub order_type: OrderType,
    pub venue: Venue,
    pub time_in_force: TimeInForce,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Order {0} not found")]
    UnknownOrder(OrderId),

    #[error("Venue unavailable")]
    Unavailable,
}

/// Result of a cancel request. cancelling an unknown order is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelAck {
    Sent,
    NotFound,
}

/// Order execution gateway. completion arrives later as an `OrderUpdate` event.
pub trait ExecutionGateway {
    fn submit_order(&mut self, params: &OrderParams) -> Result<OrderId, GatewayError>;

    fn cancel_order(&mut self, order_id: OrderId) -> CancelAck;

    fn cancel_replace_order(&mut self, order_id: OrderId, params: &OrderParams) -> Result<(), GatewayError>;

    /// Cancel every working order for this strategy. returns how many were hit.
    fn cancel_all(&mut self) -> usize;
}

/// Read-only view of positions and pnl. mutated only by fills, never by the engines.
pub trait Portfolio {
    /// Signed share position. positive = long.
    fn position(&self, instrument: InstrumentId) -> i64;

    fn total_pnl(&self) -> Decimal;
}

/// Collaborators for one callback. borrowed, never stored by an engine.
pub struct Context<'a> {
    pub gateway: &'a mut dyn ExecutionGateway,
    pub portfolio: &'a dyn Portfolio,
    pub sink: &'a mut dyn SnapshotSink,
}

impl<'a> Context<'a> {
    pub fn new(
        gateway: &'a mut dyn ExecutionGateway,
        portfolio: &'a dyn Portfolio,
        sink: &'a mut dyn SnapshotSink,
    ) -> Self {
        Self {
            gateway,
            portfolio,
            sink,
        }
    }
}
