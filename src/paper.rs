// 13.0 paper.rs: in-memory venue for the simulator and tests.
// orders rest until the caller fills or cancels them. nothing is ever matched automatically.
// every cancel queues a Cancelled update that the caller feeds back into the engine.

use crate::events::{OrderStatus, OrderUpdate};
use crate::gateway::{CancelAck, Context, ExecutionGateway, GatewayError, OrderParams, Portfolio};
use crate::snapshot::MemorySink;
use crate::types::{InstrumentId, OrderId, Timestamp};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/** 13.1: gateway that records everything and rests every order */
#[derive(Debug, Default)]
pub struct PaperGateway {
    last_order_id: u64,
    open: BTreeMap<OrderId, OrderParams>,
    pending_updates: Vec<OrderUpdate>,
    reject_reason: Option<String>,
    clock: Timestamp,
    pub submitted: Vec<(OrderId, OrderParams)>,
    pub cancels: Vec<OrderId>,
    pub replaces: Vec<(OrderId, OrderParams)>,
}

impl PaperGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every submission with `reason` until cleared with None.
    pub fn set_reject(&mut self, reason: Option<&str>) {
        self.reject_reason = reason.map(str::to_string);
    }

    /// Timestamp stamped on queued updates.
    pub fn set_clock(&mut self, now: Timestamp) {
        self.clock = now;
    }

    pub fn open_order(&self, order_id: OrderId) -> Option<&OrderParams> {
        self.open.get(&order_id)
    }

    pub fn open_orders(&self) -> impl Iterator<Item = (OrderId, &OrderParams)> {
        self.open.iter().map(|(id, params)| (*id, params))
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Updates produced since the last drain, oldest first.
    pub fn drain_updates(&mut self) -> Vec<OrderUpdate> {
        std::mem::take(&mut self.pending_updates)
    }

    fn remove_open(&mut self, order_id: OrderId) -> Option<OrderParams> {
        self.open.remove(&order_id)
    }
}

impl ExecutionGateway for PaperGateway {
    fn submit_order(&mut self, params: &OrderParams) -> Result<OrderId, GatewayError> {
        if let Some(reason) = &self.reject_reason {
            return Err(GatewayError::Rejected(reason.clone()));
        }
        if params.quantity == 0 {
            return Err(GatewayError::Rejected("zero quantity".to_string()));
        }
        self.last_order_id += 1;
        let order_id = OrderId(self.last_order_id);
        self.open.insert(order_id, params.clone());
        self.submitted.push((order_id, params.clone()));
        Ok(order_id)
    }

    fn cancel_order(&mut self, order_id: OrderId) -> CancelAck {
        match self.open.remove(&order_id) {
            Some(params) => {
                self.cancels.push(order_id);
                self.pending_updates.push(OrderUpdate::new(
                    order_id,
                    params.instrument,
                    OrderStatus::Cancelled,
                    self.clock,
                ));
                CancelAck::Sent
            }
            None => CancelAck::NotFound,
        }
    }

    fn cancel_replace_order(&mut self, order_id: OrderId, params: &OrderParams) -> Result<(), GatewayError> {
        let resting = self
            .open
            .get_mut(&order_id)
            .ok_or(GatewayError::UnknownOrder(order_id))?;
        *resting = params.clone();
        self.replaces.push((order_id, params.clone()));
        Ok(())
    }

    fn cancel_all(&mut self) -> usize {
        let ids: Vec<OrderId> = self.open.keys().copied().collect();
        for order_id in &ids {
            self.cancel_order(*order_id);
        }
        ids.len()
    }
}

/** 13.2: positions, cash and marks. pnl is cash plus marked positions */
#[derive(Debug, Clone, Default)]
pub struct PaperPortfolio {
    positions: HashMap<InstrumentId, i64>,
    marks: HashMap<InstrumentId, Decimal>,
    cash: Decimal,
}

impl PaperPortfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_fill(&mut self, instrument: InstrumentId, signed_qty: i64, price: Decimal) {
        *self.positions.entry(instrument).or_insert(0) += signed_qty;
        self.cash -= Decimal::from(signed_qty) * price;
        self.marks.insert(instrument, price);
    }

    pub fn set_position(&mut self, instrument: InstrumentId, position: i64) {
        self.positions.insert(instrument, position);
    }

    pub fn mark(&mut self, instrument: InstrumentId, price: Decimal) {
        self.marks.insert(instrument, price);
    }

    pub fn cash(&self) -> Decimal {
        self.cash
    }
}

impl Portfolio for PaperPortfolio {
    fn position(&self, instrument: InstrumentId) -> i64 {
        self.positions.get(&instrument).copied().unwrap_or(0)
    }

    fn total_pnl(&self) -> Decimal {
        let marked: Decimal = self
            .positions
            .iter()
            .map(|(id, qty)| Decimal::from(*qty) * self.marks.get(id).copied().unwrap_or(Decimal::ZERO))
            .sum();
        self.cash + marked
    }
}

/** 13.3: gateway + portfolio + snapshot sink wired together */
#[derive(Debug, Default)]
pub struct PaperVenue {
    pub gateway: PaperGateway,
    pub portfolio: PaperPortfolio,
    pub sink: MemorySink,
}

impl PaperVenue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the venue as the collaborators for one engine callback.
    pub fn ctx(&mut self) -> Context<'_> {
        Context::new(&mut self.gateway, &self.portfolio, &mut self.sink)
    }

    /// Fill a resting order completely at its own price. returns the Filled update to
    /// deliver to the engine, or None if the order is not open.
    pub fn fill(&mut self, order_id: OrderId) -> Option<OrderUpdate> {
        let params = self.gateway.remove_open(order_id)?;
        let signed = params.side.sign() * params.quantity as i64;
        self.portfolio.apply_fill(params.instrument, signed, params.price);
        let update = OrderUpdate::new(order_id, params.instrument, OrderStatus::Filled, self.gateway.clock)
            .with_fill(params.quantity, params.price);
        Some(update)
    }

    /// Fill part of a resting order. the remainder keeps working; filling the
    /// last share completes it.
    pub fn fill_partial(&mut self, order_id: OrderId, quantity: u64) -> Option<OrderUpdate> {
        let params = self.gateway.open.get_mut(&order_id)?;
        let quantity = quantity.min(params.quantity);
        params.quantity -= quantity;
        let (instrument, side, price, remaining) = (params.instrument, params.side, params.price, params.quantity);

        let status = if remaining == 0 {
            self.gateway.remove_open(order_id);
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.portfolio
            .apply_fill(instrument, side.sign() * quantity as i64, price);
        Some(OrderUpdate::new(order_id, instrument, status, self.gateway.clock).with_fill(quantity, price))
    }

    /// Order ids currently resting, lowest first.
    pub fn open_ids(&self) -> Vec<OrderId> {
        self.gateway.open.keys().copied().collect()
    }
}
