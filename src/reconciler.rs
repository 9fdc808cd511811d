// 9.0 reconciler.rs: keeps at most one working order per instrument consistent with the target.
// 9.1 OrderSlot is the per-instrument state machine: NoOrder <-> Working.
// 9.2 OrderReconciler owns the slots and turns a desired trade size into an intent.
// nothing here talks to a venue. the engines execute intents and report back.

use crate::events::OrderUpdate;
use crate::gateway::OrderParams;
use crate::types::{InstrumentId, OrderId, OrderType, Side};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A live order we are tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingOrder {
    pub order_id: OrderId,
    pub side: Side,
    pub quantity: u64,
    pub price: Decimal,
    pub order_type: OrderType,
    // cancel already sent. waiting for the completion callback
    pub cancel_requested: bool,
}

impl WorkingOrder {
    pub fn from_params(order_id: OrderId, params: &OrderParams) -> Self {
        Self {
            order_id,
            side: params.side,
            quantity: params.quantity,
            price: params.price,
            order_type: params.order_type,
            cancel_requested: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrderSlot {
    #[default]
    NoOrder,
    Working(WorkingOrder),
}

/// What the reconciler wants done for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Nothing to do.
    Hold,
    /// Send a new order.
    Submit { side: Side, quantity: u64 },
    /// Cancel the working order. no replacement until it completes.
    Cancel { order_id: OrderId },
}

impl OrderSlot {
    /** 9.1.1: transition table for a desired signed trade size */
    pub fn decide(&self, trade_size: i64) -> Intent {
        let Some(desired) = Side::from_signed(trade_size) else {
            return Intent::Hold;
        };
        match self {
            OrderSlot::NoOrder => Intent::Submit {
                side: desired,
                quantity: trade_size.unsigned_abs(),
            },
            OrderSlot::Working(order) if order.side != desired && !order.cancel_requested => {
                Intent::Cancel {
                    order_id: order.order_id,
                }
            }
            // same side: leave it working. flipped with a cancel in flight: wait
            OrderSlot::Working(_) => Intent::Hold,
        }
    }

    /// NoOrder -> Working. refused if an order is already tracked.
    pub fn submitted(&mut self, order: WorkingOrder) -> bool {
        match self {
            OrderSlot::NoOrder => {
                *self = OrderSlot::Working(order);
                true
            }
            OrderSlot::Working(_) => false,
        }
    }

    pub fn cancel_sent(&mut self, order_id: OrderId) -> bool {
        match self {
            OrderSlot::Working(order) if order.order_id == order_id => {
                order.cancel_requested = true;
                true
            }
            _ => false,
        }
    }

    /// Terminal update for `order_id`: Working -> NoOrder. other ids are ignored.
    pub fn complete(&mut self, order_id: OrderId) -> bool {
        match self {
            OrderSlot::Working(order) if order.order_id == order_id => {
                *self = OrderSlot::NoOrder;
                true
            }
            _ => false,
        }
    }

    pub fn working(&self) -> Option<&WorkingOrder> {
        match self {
            OrderSlot::Working(order) => Some(order),
            OrderSlot::NoOrder => None,
        }
    }

    pub fn is_working(&self) -> bool {
        matches!(self, OrderSlot::Working(_))
    }
}

/// Outcome of an order action actually sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAction {
    Submitted {
        order_id: OrderId,
        params: OrderParams,
    },
    SubmitRejected {
        params: OrderParams,
        reason: String,
    },
    CancelSent {
        instrument: InstrumentId,
        order_id: OrderId,
    },
    Replaced {
        order_id: OrderId,
        params: OrderParams,
    },
    CancelAll {
        cancelled: usize,
    },
}

impl OrderAction {
    pub fn is_submission(&self) -> bool {
        matches!(self, OrderAction::Submitted { .. } | OrderAction::SubmitRejected { .. })
    }
}

/** 9.2: pending-order map. one slot per instrument that has ever traded */
#[derive(Debug, Clone, Default)]
pub struct OrderReconciler {
    slots: HashMap<InstrumentId, OrderSlot>,
}

impl OrderReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile(&self, instrument: InstrumentId, trade_size: i64) -> Intent {
        self.slots
            .get(&instrument)
            .map(|slot| slot.decide(trade_size))
            .unwrap_or_else(|| OrderSlot::NoOrder.decide(trade_size))
    }

    pub fn record_submission(&mut self, instrument: InstrumentId, order: WorkingOrder) -> bool {
        self.slots.entry(instrument).or_default().submitted(order)
    }

    pub fn record_cancel(&mut self, instrument: InstrumentId, order_id: OrderId) -> bool {
        self.slots
            .get_mut(&instrument)
            .is_some_and(|slot| slot.cancel_sent(order_id))
    }

    /// Cancel-replace accepted: keep tracking the order at its new price.
    pub fn record_replace(&mut self, order_id: OrderId, price: Decimal) -> bool {
        for slot in self.slots.values_mut() {
            if let OrderSlot::Working(order) = slot {
                if order.order_id == order_id {
                    order.price = price;
                    return true;
                }
            }
        }
        false
    }

    /// Apply a venue update. returns true when it cleared a tracked order.
    /// updates for orders we do not track are ignored.
    pub fn on_order_update(&mut self, update: &OrderUpdate) -> bool {
        if !update.completes_order() {
            return false;
        }
        if let Some(slot) = self.slots.get_mut(&update.instrument) {
            if slot.complete(update.order_id) {
                return true;
            }
        }
        self.slots
            .values_mut()
            .any(|slot| slot.complete(update.order_id))
    }

    pub fn slot(&self, instrument: InstrumentId) -> &OrderSlot {
        const EMPTY: &OrderSlot = &OrderSlot::NoOrder;
        self.slots.get(&instrument).unwrap_or(EMPTY)
    }

    pub fn pending_order(&self, instrument: InstrumentId) -> Option<OrderId> {
        self.slot(instrument).working().map(|o| o.order_id)
    }

    /// Instrument owning a tracked order.
    pub fn instrument_of(&self, order_id: OrderId) -> Option<InstrumentId> {
        self.working_orders()
            .find(|(_, order)| order.order_id == order_id)
            .map(|(id, _)| id)
    }

    pub fn working_orders(&self) -> impl Iterator<Item = (InstrumentId, &WorkingOrder)> {
        self.slots
            .iter()
            .filter_map(|(id, slot)| slot.working().map(|order| (*id, order)))
    }

    pub fn working_count(&self) -> usize {
        self.slots.values().filter(|s| s.is_working()).count()
    }

    pub fn reset(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::OrderStatus;
    use crate::types::Timestamp;
    use rust_decimal_macros::dec;

    fn working(id: u64, side: Side) -> WorkingOrder {
        WorkingOrder {
            order_id: OrderId(id),
            side,
            quantity: 100,
            price: dec!(10),
            order_type: OrderType::Limit,
            cancel_requested: false,
        }
    }

    fn update(id: u64, instrument: u32, status: OrderStatus) -> OrderUpdate {
        OrderUpdate::new(OrderId(id), InstrumentId(instrument), status, Timestamp::from_millis(0))
    }

    #[test]
    fn no_order_submits() {
        let slot = OrderSlot::NoOrder;
        assert_eq!(slot.decide(100), Intent::Submit { side: Side::Buy, quantity: 100 });
        assert_eq!(slot.decide(-40), Intent::Submit { side: Side::Sell, quantity: 40 });
        assert_eq!(slot.decide(0), Intent::Hold);
    }

    #[test]
    fn same_side_holds() {
        let slot = OrderSlot::Working(working(1, Side::Buy));
        assert_eq!(slot.decide(100), Intent::Hold);
        assert_eq!(slot.decide(0), Intent::Hold);
    }

    #[test]
    fn flip_cancels_once() {
        let mut slot = OrderSlot::Working(working(7, Side::Buy));
        assert_eq!(slot.decide(-100), Intent::Cancel { order_id: OrderId(7) });
        assert!(slot.cancel_sent(OrderId(7)));
        assert_eq!(slot.decide(-100), Intent::Hold);
        assert!(slot.is_working());
    }

    #[test]
    fn terminal_update_clears_only_matching_order() {
        let mut reconciler = OrderReconciler::new();
        let inst = InstrumentId(1);
        assert!(reconciler.record_submission(inst, working(5, Side::Sell)));

        assert!(!reconciler.on_order_update(&update(99, 1, OrderStatus::Filled)));
        assert!(!reconciler.on_order_update(&update(5, 1, OrderStatus::PartiallyFilled)));
        assert_eq!(reconciler.pending_order(inst), Some(OrderId(5)));

        assert!(reconciler.on_order_update(&update(5, 1, OrderStatus::Cancelled)));
        assert_eq!(reconciler.pending_order(inst), None);
        assert_eq!(reconciler.working_count(), 0);
    }

    #[test]
    fn second_submission_is_refused() {
        let mut reconciler = OrderReconciler::new();
        let inst = InstrumentId(1);
        assert!(reconciler.record_submission(inst, working(1, Side::Buy)));
        assert!(!reconciler.record_submission(inst, working(2, Side::Buy)));
        assert_eq!(reconciler.pending_order(inst), Some(OrderId(1)));
    }

    #[test]
    fn update_with_wrong_instrument_still_matches_by_id() {
        let mut reconciler = OrderReconciler::new();
        reconciler.record_submission(InstrumentId(2), working(3, Side::Buy));
        assert!(reconciler.on_order_update(&update(3, 9, OrderStatus::Rejected)));
        assert_eq!(reconciler.working_count(), 0);
    }

    #[test]
    fn replace_updates_tracked_price() {
        let mut reconciler = OrderReconciler::new();
        reconciler.record_submission(InstrumentId(1), working(4, Side::Buy));
        assert!(reconciler.record_replace(OrderId(4), dec!(10.5)));
        assert!(!reconciler.record_replace(OrderId(8), dec!(1)));
        let (_, order) = reconciler.working_orders().next().unwrap();
        assert_eq!(order.price, dec!(10.5));
        assert_eq!(reconciler.instrument_of(OrderId(4)), Some(InstrumentId(1)));
    }
}
