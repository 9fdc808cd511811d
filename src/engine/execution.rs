//! Executing reconciler intents against the gateway.
//!
//! Shared by both engines. Submissions that fail are logged and leave the
//! slot empty, so the next qualifying signal simply tries again.

use super::results::EngineError;
use crate::book::{InstrumentRegistry, InstrumentState};
use crate::gateway::{CancelAck, Context};
use crate::pricing::{build_order, order_params, PricingPolicy};
use crate::reconciler::{Intent, OrderAction, OrderReconciler, WorkingOrder};
use crate::snapshot::{PnlSnapshot, PositionLine};
use crate::types::{InstrumentId, OrderId, Side, Timestamp};
use tracing::{debug, info, trace, warn};

/// Carry out one intent for `state`'s instrument.
pub(super) fn execute_intent(
    reconciler: &mut OrderReconciler,
    ctx: &mut Context<'_>,
    state: &InstrumentState,
    intent: Intent,
    policy: PricingPolicy,
    verbose: bool,
) -> Option<OrderAction> {
    match intent {
        Intent::Hold => None,
        Intent::Submit { side, quantity } => submit(reconciler, ctx, state, side, quantity, policy, verbose),
        Intent::Cancel { order_id } => cancel(reconciler, ctx, state.instrument.id, order_id),
    }
}

pub(super) fn submit(
    reconciler: &mut OrderReconciler,
    ctx: &mut Context<'_>,
    state: &InstrumentState,
    side: Side,
    quantity: u64,
    policy: PricingPolicy,
    verbose: bool,
) -> Option<OrderAction> {
    let instrument = state.instrument.id;
    let Some(params) = build_order(state, side, quantity, policy) else {
        warn!(%instrument, %side, quantity, "no quote or trade to price order, skipping");
        return None;
    };

    if verbose {
        debug!(
            %instrument,
            symbol = %state.instrument.symbol,
            %side,
            quantity,
            price = %params.price,
            venue = %params.venue,
            "sending order"
        );
    }

    match ctx.gateway.submit_order(&params) {
        Ok(order_id) => {
            reconciler.record_submission(instrument, WorkingOrder::from_params(order_id, &params));
            info!(%instrument, %order_id, %side, quantity, price = %params.price, "order submitted");
            Some(OrderAction::Submitted { order_id, params })
        }
        Err(err) => {
            warn!(%instrument, %side, quantity, error = %err, "order submission failed");
            Some(OrderAction::SubmitRejected {
                params,
                reason: err.to_string(),
            })
        }
    }
}

pub(super) fn cancel(
    reconciler: &mut OrderReconciler,
    ctx: &mut Context<'_>,
    instrument: InstrumentId,
    order_id: OrderId,
) -> Option<OrderAction> {
    match ctx.gateway.cancel_order(order_id) {
        CancelAck::Sent => {
            reconciler.record_cancel(instrument, order_id);
            info!(%instrument, %order_id, "cancel sent");
            Some(OrderAction::CancelSent { instrument, order_id })
        }
        CancelAck::NotFound => {
            trace!(%instrument, %order_id, "cancel target not found at venue");
            None
        }
    }
}

/// Cancel-replace one tracked order at a price recomputed from the live top of book.
pub(super) fn reprice(
    reconciler: &mut OrderReconciler,
    registry: &InstrumentRegistry,
    ctx: &mut Context<'_>,
    order_id: OrderId,
    policy: PricingPolicy,
) -> Result<OrderAction, EngineError> {
    let instrument = reconciler
        .instrument_of(order_id)
        .ok_or(EngineError::OrderNotTracked(order_id))?;
    let order = reconciler
        .slot(instrument)
        .working()
        .cloned()
        .ok_or(EngineError::OrderNotTracked(order_id))?;
    let state = registry
        .get(instrument)
        .ok_or(EngineError::UnknownInstrument(instrument))?;
    let price = policy
        .price(order.side, state)
        .ok_or(EngineError::NoPrice(instrument))?;

    let params = order_params(&state.instrument, order.side, order.quantity, price, order.order_type);
    ctx.gateway.cancel_replace_order(order_id, &params)?;
    reconciler.record_replace(order_id, price);
    info!(%instrument, %order_id, %price, "order repriced");
    Ok(OrderAction::Replaced { order_id, params })
}

pub(super) fn reprice_all(
    reconciler: &mut OrderReconciler,
    registry: &InstrumentRegistry,
    ctx: &mut Context<'_>,
    policy: PricingPolicy,
) -> Vec<OrderAction> {
    let mut order_ids: Vec<OrderId> = reconciler.working_orders().map(|(_, o)| o.order_id).collect();
    order_ids.sort();

    let mut actions = Vec::with_capacity(order_ids.len());
    for order_id in order_ids {
        match reprice(reconciler, registry, ctx, order_id, policy) {
            Ok(action) => actions.push(action),
            Err(err) => warn!(%order_id, error = %err, "reprice failed"),
        }
    }
    actions
}

/// Ask the venue to cancel everything. slots clear as completions arrive.
pub(super) fn cancel_all(ctx: &mut Context<'_>) -> OrderAction {
    let cancelled = ctx.gateway.cancel_all();
    info!(cancelled, "cancel all sent");
    OrderAction::CancelAll { cancelled }
}

/// Log positions and write the diagnostic pnl snapshot for a bar.
pub(super) fn write_bar_snapshot(registry: &InstrumentRegistry, ctx: &mut Context<'_>, bar_time: Timestamp) {
    let positions: Vec<PositionLine> = registry
        .ids()
        .into_iter()
        .filter_map(|id| registry.get(id))
        .map(|state| PositionLine {
            instrument: state.instrument.id,
            symbol: state.instrument.symbol.clone(),
            position: ctx.portfolio.position(state.instrument.id),
        })
        .collect();
    let snapshot = PnlSnapshot {
        bar_time,
        total_pnl: ctx.portfolio.total_pnl(),
        positions,
    };

    info!(time = %snapshot.bar_time, pnl = %snapshot.total_pnl, "portfolio snapshot");
    for line in &snapshot.positions {
        info!(symbol = %line.symbol, position = line.position, "position");
    }

    if let Err(err) = ctx.sink.write_snapshot(&snapshot) {
        warn!(error = %err, "snapshot write failed");
    }
}
