// 11.1 engine/imbalance.rs: order-book imbalance engine.
// quotes feed the pressure estimator; once an instrument's window is full its side sets the
// desired trade size (position_size * side). quotes and trades then reconcile that size
// against the notional cap and the instrument's order slot. orders are passive limits.

use super::execution::{execute_intent, submit, write_bar_snapshot};
use super::results::EngineError;
use crate::book::{Instrument, InstrumentRegistry};
use crate::config::{ImbalanceParams, Phase};
use crate::events::{BarEvent, MarketEvent, OrderUpdate, QuoteEvent, TradeEvent};
use crate::gateway::Context;
use crate::imbalance::ImbalanceEstimator;
use crate::pricing::PricingPolicy;
use crate::reconciler::{Intent, OrderAction, OrderReconciler, OrderSlot};
use crate::target::{imbalance_trade_size, NotionalCap};
use crate::types::{InstrumentId, Side};
use std::collections::HashMap;
use tracing::{debug, info, trace};

/** 11.1.0: all state lives here */
#[derive(Debug)]
pub struct ImbalanceEngine {
    pub(super) params: ImbalanceParams,
    pub(super) registry: InstrumentRegistry,
    pub(super) estimator: ImbalanceEstimator,
    pub(super) reconciler: OrderReconciler,
    // desired signed trade size per instrument. absent until its window is full
    pub(super) desired: HashMap<InstrumentId, i64>,
}

impl ImbalanceEngine {
    pub fn new(params: ImbalanceParams, instruments: impl IntoIterator<Item = Instrument>) -> Result<Self, EngineError> {
        params.validate()?;
        Ok(Self {
            estimator: ImbalanceEstimator::new(params.window_size),
            registry: InstrumentRegistry::new(instruments),
            reconciler: OrderReconciler::new(),
            desired: HashMap::new(),
            params,
        })
    }

    pub fn params(&self) -> &ImbalanceParams {
        &self.params
    }

    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    pub fn estimator(&self) -> &ImbalanceEstimator {
        &self.estimator
    }

    pub fn reconciler(&self) -> &OrderReconciler {
        &self.reconciler
    }

    pub fn desired_trade(&self, instrument: InstrumentId) -> Option<i64> {
        self.desired.get(&instrument).copied()
    }

    pub(super) fn limit_policy(&self) -> PricingPolicy {
        PricingPolicy::Passive {
            offset: self.params.aggressiveness,
        }
    }

    /** 11.1.1: single entry point for everything the host delivers */
    pub fn handle(&mut self, event: &MarketEvent, ctx: &mut Context<'_>) -> Vec<OrderAction> {
        match event {
            MarketEvent::Bar(bar) => {
                self.on_bar(bar, ctx);
                Vec::new()
            }
            MarketEvent::Quote(quote) => self.on_quote(quote, ctx).into_iter().collect(),
            MarketEvent::Trade(trade) => self.on_trade(trade, ctx).into_iter().collect(),
            MarketEvent::OrderUpdate(update) => {
                self.on_order_update(update);
                Vec::new()
            }
            MarketEvent::Command(command) => self.run_command(*command, ctx),
        }
    }

    fn on_bar(&mut self, bar: &BarEvent, ctx: &mut Context<'_>) {
        if self.params.debug {
            debug!(instrument = %bar.instrument, close = %bar.close, "bar");
        }
        write_bar_snapshot(&self.registry, ctx, bar.bar_time);
    }

    fn on_quote(&mut self, quote: &QuoteEvent, ctx: &mut Context<'_>) -> Option<OrderAction> {
        let instrument = quote.instrument;
        let Some(book) = self
            .registry
            .apply_quote(instrument, &quote.bids, &quote.asks, quote.timestamp)
        else {
            trace!(%instrument, "quote for unregistered instrument ignored");
            return None;
        };

        // no trade yet means no reference price to score against
        let reference = self.registry.get(instrument)?.last_trade?;
        let reading = self.estimator.on_quote(instrument, &book, reference)?;

        if self.params.debug {
            debug!(
                %instrument,
                pressure = %reading.pressure,
                side = ?reading.side,
                ready = reading.ready,
                "imbalance"
            );
        }

        if !reading.ready {
            return None;
        }
        self.desired
            .insert(instrument, imbalance_trade_size(reading.side, self.params.position_size));
        self.adjust(instrument, ctx)
    }

    fn on_trade(&mut self, trade: &TradeEvent, ctx: &mut Context<'_>) -> Option<OrderAction> {
        if !self.registry.apply_trade(trade.instrument, trade.price, trade.timestamp) {
            trace!(instrument = %trade.instrument, "trade for unregistered instrument ignored");
            return None;
        }
        self.adjust(trade.instrument, ctx)
    }

    fn on_order_update(&mut self, update: &OrderUpdate) {
        if self.reconciler.on_order_update(update) {
            info!(
                instrument = %update.instrument,
                order_id = %update.order_id,
                status = ?update.status,
                "order complete"
            );
        } else if update.completes_order() {
            trace!(order_id = %update.order_id, "completion for untracked order ignored");
        }
    }

    /** 11.1.2: desired size -> cap -> order slot */
    fn adjust(&mut self, instrument: InstrumentId, ctx: &mut Context<'_>) -> Option<OrderAction> {
        let desired = self.desired_trade(instrument)?;
        let state = self.registry.get(instrument)?;
        let price = state.last_trade?;

        let current = ctx.portfolio.position(instrument);
        let cap = NotionalCap::new(self.params.notional_cap);
        let trade_size = cap.apply(desired, current, price);
        if trade_size != desired && self.params.debug {
            debug!(%instrument, desired, current, %price, cap = %cap.limit(), "notional cap reached");
        }

        let intent = self.reconciler.reconcile(instrument, trade_size);
        let policy = self.limit_policy();
        execute_intent(&mut self.reconciler, ctx, state, intent, policy, self.params.debug)
    }

    /// Flatten the current position with a zero-offset market order. a working order
    /// is cancelled first; call again once it has completed.
    pub fn flash_unwind(&mut self, instrument: InstrumentId, ctx: &mut Context<'_>) -> Result<Option<OrderAction>, EngineError> {
        let state = self
            .registry
            .get(instrument)
            .ok_or(EngineError::UnknownInstrument(instrument))?;
        let trade_size = -ctx.portfolio.position(instrument);
        let Some(side) = Side::from_signed(trade_size) else {
            return Ok(None);
        };

        match self.reconciler.slot(instrument).clone() {
            OrderSlot::NoOrder => {
                let action = submit(
                    &mut self.reconciler,
                    ctx,
                    state,
                    side,
                    trade_size.unsigned_abs(),
                    PricingPolicy::Flash,
                    self.params.debug,
                );
                match action {
                    Some(action) => Ok(Some(action)),
                    None => Err(EngineError::NoPrice(instrument)),
                }
            }
            OrderSlot::Working(order) if !order.cancel_requested => {
                let intent = Intent::Cancel {
                    order_id: order.order_id,
                };
                Ok(execute_intent(&mut self.reconciler, ctx, state, intent, PricingPolicy::Flash, self.params.debug))
            }
            OrderSlot::Working(_) => Ok(None),
        }
    }

    /// Change a runtime parameter. startup-only ones are refused.
    pub fn set_param(&mut self, name: &str, raw: &str) -> Result<(), EngineError> {
        self.params.apply(name, raw, Phase::Running)?;
        info!(param = name, value = raw, "parameter changed");
        Ok(())
    }

    pub fn reset(&mut self) {
        self.estimator.reset();
        self.reconciler.reset();
        self.registry.clear_market_data();
        self.desired.clear();
        info!("imbalance engine state reset");
    }
}
