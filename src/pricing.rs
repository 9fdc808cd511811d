// 6.0 pricing.rs: where an order goes and what price it carries.
// routing is a static lookup by asset class. prices come from the live top of book.

use crate::book::{Instrument, InstrumentState};
use crate::gateway::OrderParams;
use crate::types::{AssetClass, OrderType, Side, TimeInForce, Venue};
use rust_decimal::Decimal;

/** 6.1: equity -> NASDAQ, option -> CBOE options, everything else -> CME Globex */
pub fn venue_for(asset_class: AssetClass) -> Venue {
    match asset_class {
        AssetClass::Equity => Venue::Nasdaq,
        AssetClass::Option => Venue::CboeOptions,
        AssetClass::Future | AssetClass::Other => Venue::CmeGlobex,
    }
}

/** 6.2: how an engine prices its orders */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingPolicy {
    /// Market order priced at the far touch: buys at the ask, sells at the bid.
    Aggressive,
    /// Limit order joining the near touch, improved by `offset`.
    Passive { offset: Decimal },
    /// Urgent unwind. near touch with no improvement, sent as a market order.
    Flash,
}

impl PricingPolicy {
    pub fn order_type(&self) -> OrderType {
        match self {
            PricingPolicy::Passive { .. } => OrderType::Limit,
            PricingPolicy::Aggressive | PricingPolicy::Flash => OrderType::Market,
        }
    }

    /// Price for `side` given the instrument's live market. falls back to the
    /// last trade when the relevant touch is empty. None if neither is known.
    pub fn price(&self, side: Side, state: &InstrumentState) -> Option<Decimal> {
        let top = &state.top;
        match self {
            PricingPolicy::Aggressive => {
                let touch = match side {
                    Side::Buy => top.ask,
                    Side::Sell => top.bid,
                };
                touch.or(state.last_trade)
            }
            PricingPolicy::Passive { offset } => passive_price(side, state, *offset),
            PricingPolicy::Flash => passive_price(side, state, Decimal::ZERO),
        }
    }
}

/// Buy at bid + offset, sell at ask - offset.
pub fn passive_price(side: Side, state: &InstrumentState, offset: Decimal) -> Option<Decimal> {
    let top = &state.top;
    match side {
        Side::Buy => top.bid.or(state.last_trade).map(|bid| bid + offset),
        Side::Sell => top.ask.or(state.last_trade).map(|ask| ask - offset),
    }
}

/** 6.3: assemble full order params. None when there is nothing to price against */
pub fn build_order(
    state: &InstrumentState,
    side: Side,
    quantity: u64,
    policy: PricingPolicy,
) -> Option<OrderParams> {
    let price = policy.price(side, state)?;
    Some(order_params(&state.instrument, side, quantity, price, policy.order_type()))
}

pub fn order_params(
    instrument: &Instrument,
    side: Side,
    quantity: u64,
    price: Decimal,
    order_type: OrderType,
) -> OrderParams {
    OrderParams {
        instrument: instrument.id,
        side,
        quantity,
        price,
        order_type,
        venue: venue_for(instrument.asset_class),
        time_in_force: TimeInForce::Day,
    }
}
