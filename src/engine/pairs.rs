// 11.2 engine/pairs.rs: pairs divergence engine over two legs.
// bars from both legs in one interval produce a target in units of leg X. the target is
// sized into share deltas for both legs and sent as market orders priced at the far touch.
// no new orders go out while any order of the strategy is still working.

use super::execution::{execute_intent, write_bar_snapshot};
use super::results::EngineError;
use crate::book::{Instrument, InstrumentRegistry};
use crate::config::{PairsParams, Phase};
use crate::divergence::{PairEvaluation, PairsEstimator};
use crate::events::{BarEvent, MarketEvent, OrderUpdate};
use crate::gateway::Context;
use crate::pricing::PricingPolicy;
use crate::reconciler::{OrderAction, OrderReconciler};
use crate::target::pairs_leg_deltas;
use crate::types::InstrumentId;
use rust_decimal::Decimal;
use tracing::{debug, info, trace, warn};

/// Consecutive throttled evaluations before the stall is logged as a warning.
pub const THROTTLE_WARN_AFTER: u32 = 5;

#[derive(Debug)]
pub struct PairsEngine {
    pub(super) params: PairsParams,
    pub(super) registry: InstrumentRegistry,
    pub(super) estimator: PairsEstimator,
    pub(super) reconciler: OrderReconciler,
    units_desired: i64,
    // closes of the last evaluated interval. used as the live leg prices for sizing
    last_evaluation: Option<PairEvaluation>,
    market_active: bool,
    throttled: u32,
}

impl PairsEngine {
    pub fn new(params: PairsParams, leg_x: Instrument, leg_y: Instrument) -> Result<Self, EngineError> {
        params.validate()?;
        if leg_x.id == leg_y.id {
            return Err(EngineError::DuplicateLeg(leg_x.id));
        }
        let estimator = PairsEstimator::new(leg_x.id, leg_y.id);
        Ok(Self {
            params,
            registry: InstrumentRegistry::new([leg_x, leg_y]),
            estimator,
            reconciler: OrderReconciler::new(),
            units_desired: 0,
            last_evaluation: None,
            market_active: true,
            throttled: 0,
        })
    }

    pub fn params(&self) -> &PairsParams {
        &self.params
    }

    pub fn legs(&self) -> (InstrumentId, InstrumentId) {
        self.estimator.legs()
    }

    pub fn registry(&self) -> &InstrumentRegistry {
        &self.registry
    }

    pub fn estimator(&self) -> &PairsEstimator {
        &self.estimator
    }

    pub fn reconciler(&self) -> &OrderReconciler {
        &self.reconciler
    }

    /// Target position in units of leg X from the last evaluation.
    pub fn units_desired(&self) -> i64 {
        self.units_desired
    }

    pub fn market_active(&self) -> bool {
        self.market_active
    }

    /// Evaluations in a row that were held back by a working order.
    pub fn throttled_evaluations(&self) -> u32 {
        self.throttled
    }

    pub fn set_market_active(&mut self, active: bool) {
        if self.market_active != active {
            info!(active, "market active changed");
        }
        self.market_active = active;
    }

    /** 11.2.1: single entry point for everything the host delivers */
    pub fn handle(&mut self, event: &MarketEvent, ctx: &mut Context<'_>) -> Vec<OrderAction> {
        match event {
            MarketEvent::Bar(bar) => self.on_bar(bar, ctx),
            MarketEvent::Quote(quote) => {
                self.registry
                    .apply_quote(quote.instrument, &quote.bids, &quote.asks, quote.timestamp);
                Vec::new()
            }
            MarketEvent::Trade(trade) => {
                self.registry
                    .apply_trade(trade.instrument, trade.price, trade.timestamp);
                Vec::new()
            }
            MarketEvent::OrderUpdate(update) => {
                self.on_order_update(update);
                Vec::new()
            }
            MarketEvent::Command(command) => self.run_command(*command, ctx),
        }
    }

    fn on_bar(&mut self, bar: &BarEvent, ctx: &mut Context<'_>) -> Vec<OrderAction> {
        let instrument = bar.instrument;
        if !self.estimator.tracks(instrument) {
            trace!(%instrument, "bar for unknown leg ignored");
            return Vec::new();
        }
        if self.params.debug {
            debug!(%instrument, close = %bar.close, time = %bar.bar_time, "bar");
        }

        // the close doubles as the last trade so pricing always has a fallback
        self.registry.apply_trade(instrument, bar.close, bar.bar_time);
        write_bar_snapshot(&self.registry, ctx, bar.bar_time);

        let Some(evaluation) =
            self.estimator
                .on_bar(instrument, bar.close, self.params.leverage_ratio, self.params.trade_size)
        else {
            return Vec::new();
        };

        if self.params.debug {
            debug!(
                change_x = %evaluation.change_x,
                change_y = %evaluation.change_y,
                units = evaluation.units,
                "pair evaluated"
            );
        }
        self.units_desired = evaluation.units;
        self.last_evaluation = Some(evaluation);

        if !self.market_active {
            trace!("market inactive, evaluation not acted on");
            return Vec::new();
        }
        self.adjust(ctx)
    }

    fn on_order_update(&mut self, update: &OrderUpdate) {
        if !self.reconciler.on_order_update(update) {
            return;
        }
        info!(
            instrument = %update.instrument,
            order_id = %update.order_id,
            status = ?update.status,
            "order complete"
        );
        if self.reconciler.working_count() == 0 {
            self.throttled = 0;
        }
    }

    /** 11.2.2: both legs toward the target, gated on no working order */
    fn adjust(&mut self, ctx: &mut Context<'_>) -> Vec<OrderAction> {
        let working = self.reconciler.working_count();
        if working > 0 {
            self.throttled += 1;
            if self.throttled >= THROTTLE_WARN_AFTER {
                warn!(
                    working,
                    evaluations = self.throttled,
                    units = self.units_desired,
                    "pairs hedge stalled behind working orders"
                );
            } else if self.params.debug {
                debug!(working, "order working, adjustment throttled");
            }
            return Vec::new();
        }
        self.throttled = 0;

        let Some(evaluation) = self.last_evaluation else {
            return Vec::new();
        };
        let (leg_x, leg_y) = self.estimator.legs();
        let deltas = pairs_leg_deltas(
            self.units_desired,
            self.params.leverage_ratio,
            evaluation.close_x,
            evaluation.close_y,
            ctx.portfolio.position(leg_x),
            ctx.portfolio.position(leg_y),
        );
        if self.params.debug {
            debug!(x = deltas.x, y = deltas.y, "leg deltas");
        }

        let mut actions = Vec::new();
        for (leg, trade_size) in [(leg_x, deltas.x), (leg_y, deltas.y)] {
            let Some(state) = self.registry.get(leg) else {
                continue;
            };
            let intent = self.reconciler.reconcile(leg, trade_size);
            if let Some(action) = execute_intent(
                &mut self.reconciler,
                ctx,
                state,
                intent,
                PricingPolicy::Aggressive,
                self.params.debug,
            ) {
                actions.push(action);
            }
        }
        actions
    }

    /// Last close evaluated for `instrument`, if any.
    pub fn last_close(&self, instrument: InstrumentId) -> Option<Decimal> {
        let evaluation = self.last_evaluation?;
        let (leg_x, leg_y) = self.estimator.legs();
        if instrument == leg_x {
            Some(evaluation.close_x)
        } else if instrument == leg_y {
            Some(evaluation.close_y)
        } else {
            None
        }
    }

    /// Change a runtime parameter.
    pub fn set_param(&mut self, name: &str, raw: &str) -> Result<(), EngineError> {
        self.params.apply(name, raw, Phase::Running)?;
        info!(param = name, value = raw, "parameter changed");
        Ok(())
    }

    pub fn reset(&mut self) {
        self.estimator.reset();
        self.reconciler.reset();
        self.units_desired = 0;
        self.last_evaluation = None;
        self.market_active = true;
        self.throttled = 0;
        info!("pairs engine state reset");
    }
}
