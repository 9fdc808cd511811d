//! Property-based tests for the signal pipeline.
//!
//! These tests verify invariants hold under random inputs and event sequences.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signal_core::divergence::divergence_units;
use signal_core::target::NotionalCap;
use signal_core::*;
use std::collections::HashMap;

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|x| Decimal::new(x, 2)) // $0.01 to $10,000
}

fn change_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=500i64).prop_map(|x| Decimal::new(x, 4)) // 0.01% to 5%
}

fn ratio_strategy() -> impl Strategy<Value = Decimal> {
    (1u32..=5u32).prop_map(Decimal::from)
}

/// One step of host activity against an imbalance engine.
#[derive(Debug, Clone)]
enum Step {
    BidHeavy(u32),
    AskHeavy(u32),
    Balanced(u32),
    Trade(u32, i64),
    FillOldest,
    PartialFillOldest(u64),
    DeliverUpdates,
    RepriceAll,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    let inst = 1u32..=2u32;
    prop_oneof![
        3 => inst.clone().prop_map(Step::BidHeavy),
        3 => inst.clone().prop_map(Step::AskHeavy),
        1 => inst.clone().prop_map(Step::Balanced),
        2 => (inst, 990i64..1010i64).prop_map(|(i, p)| Step::Trade(i, p)),
        2 => Just(Step::FillOldest),
        1 => (1u64..150u64).prop_map(Step::PartialFillOldest),
        2 => Just(Step::DeliverUpdates),
        1 => Just(Step::RepriceAll),
    ]
}

fn book_quote(instrument: u32, bid_size: u64, ask_size: u64) -> MarketEvent {
    MarketEvent::quote(
        InstrumentId(instrument),
        vec![BookLevel::new(dec!(9.99), bid_size)],
        vec![BookLevel::new(dec!(10.01), ask_size)],
        Timestamp::from_millis(0),
    )
}

proptest! {
    /// Window holds exactly the most recent `capacity` values, oldest first
    #[test]
    fn rolling_window_keeps_latest(
        capacity in 1usize..32,
        values in prop::collection::vec(any::<i32>(), 0..100),
    ) {
        let mut window = RollingWindow::new(capacity);
        for (pushed, value) in values.iter().enumerate() {
            window.push(*value);
            prop_assert_eq!(window.full(), pushed + 1 >= capacity);
        }

        let keep = values.len().min(capacity);
        let expected: Vec<i32> = values[values.len() - keep..].to_vec();
        let held: Vec<i32> = window.iter().copied().collect();
        prop_assert_eq!(held, expected);
    }

    /// Trade size is forced to zero exactly when the resulting exposure reaches the cap
    #[test]
    fn notional_cap_enforced(
        desired in -1_000i64..=1_000i64,
        current in -10_000i64..=10_000i64,
        price in price_strategy(),
        cap in (1i64..10_000_000i64).prop_map(Decimal::from),
    ) {
        let size = NotionalCap::new(cap).apply(desired, current, price);
        let exposure = Decimal::from(desired + current).abs() * price;
        if exposure >= cap {
            prop_assert_eq!(size, 0);
        } else {
            prop_assert_eq!(size, desired);
        }
    }

    /// X moving no more than r times Y (in either direction) stays flat
    #[test]
    fn divergence_inside_band_is_flat(
        change_y in change_strategy(),
        ratio in ratio_strategy(),
        fraction in -100i64..=100i64,
        trade_size in 1i64..100,
    ) {
        let change_x = ratio * change_y * Decimal::new(fraction, 2);
        prop_assert_eq!(divergence_units(change_x, change_y, ratio, trade_size), 0);
    }

    /// Outrunning the band in either direction bets on reversion
    #[test]
    fn divergence_outside_band_reverts(
        change_y in change_strategy(),
        ratio in ratio_strategy(),
        excess in 2i64..1_000i64,
        trade_size in 1i64..100,
    ) {
        let beyond = ratio * change_y * (Decimal::ONE + Decimal::new(excess, 3));
        prop_assert_eq!(divergence_units(beyond, change_y, ratio, trade_size), -trade_size);
        prop_assert_eq!(divergence_units(-beyond, change_y, ratio, trade_size), trade_size);
    }

    /// The venue never sees two live orders for one instrument, whatever the host does
    #[test]
    fn single_working_order_per_instrument(steps in prop::collection::vec(step_strategy(), 1..120)) {
        let params = ImbalanceParams { window_size: 3, ..ImbalanceParams::default() };
        let instruments = [Instrument::equity(1, "AAA"), Instrument::equity(2, "BBB")];
        let mut engine = ImbalanceEngine::new(params, instruments).unwrap();
        let mut venue = PaperVenue::new();

        for inst in [1u32, 2] {
            let trade = MarketEvent::trade(InstrumentId(inst), dec!(10), 100, Timestamp::from_millis(0));
            engine.handle(&trade, &mut venue.ctx());
        }

        for step in steps {
            let event = match step {
                Step::BidHeavy(i) => Some(book_quote(i, 900, 100)),
                Step::AskHeavy(i) => Some(book_quote(i, 100, 900)),
                Step::Balanced(i) => Some(book_quote(i, 300, 300)),
                Step::Trade(i, p) => Some(MarketEvent::trade(InstrumentId(i), Decimal::new(p, 2), 10, Timestamp::from_millis(0))),
                Step::FillOldest => venue
                    .open_ids()
                    .first()
                    .and_then(|id| venue.fill(*id))
                    .map(MarketEvent::OrderUpdate),
                Step::PartialFillOldest(qty) => venue
                    .open_ids()
                    .first()
                    .and_then(|id| venue.fill_partial(*id, qty))
                    .map(MarketEvent::OrderUpdate),
                Step::DeliverUpdates => {
                    for update in venue.gateway.drain_updates() {
                        engine.handle(&MarketEvent::OrderUpdate(update), &mut venue.ctx());
                    }
                    None
                }
                Step::RepriceAll => Some(MarketEvent::Command(ControlCommand::RepriceAll)),
            };
            if let Some(event) = event {
                engine.handle(&event, &mut venue.ctx());
            }

            let mut live: HashMap<InstrumentId, usize> = HashMap::new();
            for (_, params) in venue.gateway.open_orders() {
                *live.entry(params.instrument).or_insert(0) += 1;
            }
            for (instrument, count) in live {
                prop_assert!(count <= 1, "{} has {} live orders", instrument, count);
                prop_assert!(engine.reconciler().pending_order(instrument).is_some());
            }
            prop_assert!(engine.reconciler().working_count() <= 2);
        }
    }
}

#[test]
fn hysteresis_reference_values() {
    assert_eq!(divergence_units(dec!(0.01), dec!(0.003), dec!(3), 7), -7);
    assert_eq!(divergence_units(dec!(0.005), dec!(0.003), dec!(3), 7), 0);
    assert_eq!(HYSTERESIS_BAND * dec!(3) * dec!(0.003), dec!(0.009009));
}
