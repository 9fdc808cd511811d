//! Signal engine simulation.
//!
//! Drives both engines through scripted market data against the paper venue:
//! imbalance signals, order flips, pairs divergence, operator commands and resets.
//! Pass a JSON config path as the first argument to override the default parameters.

use anyhow::Context as _;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use signal_core::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,signal_core=debug"));
    fmt().with_env_filter(filter).with_target(false).init();

    let config = match std::env::args().nth(1) {
        Some(path) => StrategyConfig::load(&path).with_context(|| format!("loading config from {path}"))?,
        None => StrategyConfig::default(),
    };

    println!("Signal Engine Simulation");
    println!("Imbalance and pairs divergence against a paper venue\n");

    scenario_1_imbalance_entry(&config)?;
    scenario_2_signal_flip(&config)?;
    scenario_3_pairs_divergence(&config)?;
    scenario_4_operator_commands(&config)?;
    scenario_5_unwind_and_reset(&config)?;
    scenario_6_snapshot_file(&config)?;

    println!("\nAll simulations completed successfully.");
    Ok(())
}

const AAPL: InstrumentId = InstrumentId(1);
const SPY: InstrumentId = InstrumentId(2);
const UPRO: InstrumentId = InstrumentId(3);

fn quote(instrument: InstrumentId, bid: Decimal, bid_size: u64, ask: Decimal, ask_size: u64, ms: i64) -> MarketEvent {
    MarketEvent::quote(
        instrument,
        vec![BookLevel::new(bid, bid_size)],
        vec![BookLevel::new(ask, ask_size)],
        Timestamp::from_millis(ms),
    )
}

/// Deliver an event, then feed back any order updates the venue produced.
fn feed_imbalance(engine: &mut ImbalanceEngine, venue: &mut PaperVenue, event: &MarketEvent) -> Vec<OrderAction> {
    let actions = engine.handle(event, &mut venue.ctx());
    for update in venue.gateway.drain_updates() {
        engine.handle(&MarketEvent::OrderUpdate(update), &mut venue.ctx());
    }
    actions
}

fn feed_pairs(engine: &mut PairsEngine, venue: &mut PaperVenue, event: &MarketEvent) -> Vec<OrderAction> {
    let actions = engine.handle(event, &mut venue.ctx());
    for update in venue.gateway.drain_updates() {
        engine.handle(&MarketEvent::OrderUpdate(update), &mut venue.ctx());
    }
    actions
}

fn print_actions(actions: &[OrderAction]) {
    for action in actions {
        match action {
            OrderAction::Submitted { order_id, params } => println!(
                "    order {} {} {} @ {} ({:?}, {})",
                order_id, params.side, params.quantity, params.price, params.order_type, params.venue
            ),
            OrderAction::SubmitRejected { params, reason } => {
                println!("    rejected {} {}: {}", params.side, params.quantity, reason)
            }
            OrderAction::CancelSent { order_id, .. } => println!("    cancel {}", order_id),
            OrderAction::Replaced { order_id, params } => println!("    replace {} @ {}", order_id, params.price),
            OrderAction::CancelAll { cancelled } => println!("    cancel all: {} orders", cancelled),
        }
    }
}

fn imbalance_engine(config: &StrategyConfig) -> anyhow::Result<ImbalanceEngine> {
    let instruments = [Instrument::equity(AAPL.0, "AAPL"), Instrument::equity(SPY.0, "SPY")];
    Ok(ImbalanceEngine::new(config.imbalance.clone(), instruments)?)
}

/// Window fills with bid-heavy books, then a passive buy goes out.
fn scenario_1_imbalance_entry(config: &StrategyConfig) -> anyhow::Result<()> {
    println!("Scenario 1: Imbalance Entry\n");

    let mut venue = PaperVenue::new();
    let mut engine = imbalance_engine(config)?;
    let window = engine.estimator().window_size();

    feed_imbalance(&mut engine, &mut venue, &MarketEvent::trade(AAPL, dec!(150.00), 100, Timestamp::from_millis(0)));
    println!("  Last trade 150.00, scoring {} quotes with heavy bids...", window);

    let mut sent = Vec::new();
    for i in 0..window {
        let event = quote(AAPL, dec!(149.95), 900, dec!(150.05), 200, 1 + i as i64);
        sent.extend(feed_imbalance(&mut engine, &mut venue, &event));
    }
    print_actions(&sent);
    println!("  Desired trade: {:?}", engine.desired_trade(AAPL));

    if let Some(order_id) = engine.reconciler().pending_order(AAPL) {
        if let Some(update) = venue.fill(order_id) {
            feed_imbalance(&mut engine, &mut venue, &MarketEvent::OrderUpdate(update));
        }
    }
    println!(
        "  Filled. position {}, working orders {}\n",
        venue.portfolio.position(AAPL),
        engine.reconciler().working_count()
    );
    Ok(())
}

/// A resting buy is cancelled once the book turns ask-heavy, and a sell follows.
fn scenario_2_signal_flip(config: &StrategyConfig) -> anyhow::Result<()> {
    println!("Scenario 2: Signal Flip\n");

    let mut venue = PaperVenue::new();
    let mut engine = imbalance_engine(config)?;
    let window = engine.estimator().window_size();

    feed_imbalance(&mut engine, &mut venue, &MarketEvent::trade(SPY, dec!(500), 100, Timestamp::from_millis(0)));
    for i in 0..window {
        feed_imbalance(&mut engine, &mut venue, &quote(SPY, dec!(499.9), 800, dec!(500.1), 100, 1 + i as i64));
    }
    println!("  Buy working: {:?}", engine.reconciler().pending_order(SPY));

    println!("  Book turns ask-heavy...");
    let flipped = quote(SPY, dec!(499.9), 100, dec!(500.1), 800, 100);
    let actions = feed_imbalance(&mut engine, &mut venue, &flipped);
    print_actions(&actions);

    println!("  Cancel completed, next quote re-enters short...");
    let actions = feed_imbalance(&mut engine, &mut venue, &quote(SPY, dec!(499.9), 100, dec!(500.1), 800, 101));
    print_actions(&actions);
    println!();
    Ok(())
}

/// Leveraged ETF outruns its underlying: short X, hedge long Y.
fn scenario_3_pairs_divergence(config: &StrategyConfig) -> anyhow::Result<()> {
    println!("Scenario 3: Pairs Divergence\n");

    let mut venue = PaperVenue::new();
    let mut engine = PairsEngine::new(
        config.pairs.clone(),
        Instrument::equity(UPRO.0, "UPRO"),
        Instrument::equity(SPY.0, "SPY"),
    )?;

    let bars = [
        (dec!(100.00), dec!(500.00)),
        (dec!(101.00), dec!(501.50)),
        (dec!(101.10), dec!(501.60)),
    ];
    for (i, (x, y)) in bars.into_iter().enumerate() {
        let ts = Timestamp::from_millis(60_000 * (i as i64 + 1));
        feed_pairs(&mut engine, &mut venue, &MarketEvent::bar(UPRO, x, ts));
        let actions = feed_pairs(&mut engine, &mut venue, &MarketEvent::bar(SPY, y, ts));
        let (cx, cy) = engine.estimator().changes();
        println!("  Bar {}: X {} Y {} -> changes {:.4} / {:.4}, units {}", i + 1, x, y, cx, cy, engine.units_desired());
        print_actions(&actions);

        for order_id in venue.open_ids() {
            if let Some(update) = venue.fill(order_id) {
                feed_pairs(&mut engine, &mut venue, &MarketEvent::OrderUpdate(update));
            }
        }
    }
    println!(
        "  Positions: UPRO {}, SPY {}, pnl {}\n",
        venue.portfolio.position(UPRO),
        venue.portfolio.position(SPY),
        venue.portfolio.total_pnl()
    );
    Ok(())
}

/// Reprice-all follows the touch; cancel-all clears the venue.
fn scenario_4_operator_commands(config: &StrategyConfig) -> anyhow::Result<()> {
    println!("Scenario 4: Operator Commands\n");

    let mut venue = PaperVenue::new();
    let mut engine = imbalance_engine(config)?;
    let window = engine.estimator().window_size();

    feed_imbalance(&mut engine, &mut venue, &MarketEvent::trade(AAPL, dec!(150), 100, Timestamp::from_millis(0)));
    for i in 0..window {
        feed_imbalance(&mut engine, &mut venue, &quote(AAPL, dec!(149.95), 900, dec!(150.05), 200, 1 + i as i64));
    }

    println!("  Touch moves up, repricing...");
    feed_imbalance(&mut engine, &mut venue, &quote(AAPL, dec!(150.10), 900, dec!(150.20), 200, 50));
    let command = ControlCommand::from_id(1).context("reprice command id")?;
    print_actions(&feed_imbalance(&mut engine, &mut venue, &MarketEvent::Command(command)));

    let command = ControlCommand::from_id(2).context("cancel command id")?;
    print_actions(&feed_imbalance(&mut engine, &mut venue, &MarketEvent::Command(command)));
    println!("  Working orders after cancel all: {}\n", engine.reconciler().working_count());
    Ok(())
}

/// Flash unwind of an inherited position, then a full reset.
fn scenario_5_unwind_and_reset(config: &StrategyConfig) -> anyhow::Result<()> {
    println!("Scenario 5: Flash Unwind and Reset\n");

    let mut venue = PaperVenue::new();
    venue.portfolio.set_position(AAPL, 300);
    let mut engine = imbalance_engine(config)?;

    feed_imbalance(&mut engine, &mut venue, &MarketEvent::trade(AAPL, dec!(150), 100, Timestamp::from_millis(0)));
    feed_imbalance(&mut engine, &mut venue, &quote(AAPL, dec!(149.95), 500, dec!(150.05), 500, 1));

    let action = engine.flash_unwind(AAPL, &mut venue.ctx())?;
    print_actions(&action.into_iter().collect::<Vec<_>>());
    if let Some(order_id) = engine.reconciler().pending_order(AAPL) {
        if let Some(update) = venue.fill(order_id) {
            feed_imbalance(&mut engine, &mut venue, &MarketEvent::OrderUpdate(update));
        }
    }
    println!("  Position after unwind: {}", venue.portfolio.position(AAPL));

    engine.set_param("aggressiveness", "0.02")?;
    if let Err(err) = engine.set_param("window_size", "5") {
        println!("  window_size change refused: {}", err);
    }
    engine.reset();
    println!("  Reset. working orders {}, desired {:?}\n", engine.reconciler().working_count(), engine.desired_trade(AAPL));
    Ok(())
}

/// Bar snapshots overwrite the configured file.
fn scenario_6_snapshot_file(config: &StrategyConfig) -> anyhow::Result<()> {
    println!("Scenario 6: Bar Snapshots\n");

    let Some(path) = &config.snapshot_path else {
        println!("  No snapshot_path configured, snapshots kept in memory only\n");
        return Ok(());
    };

    let mut gateway = PaperGateway::new();
    let portfolio = PaperPortfolio::new();
    let mut sink = FileSnapshotSink::new(path);
    let mut engine = imbalance_engine(config)?;

    for minute in 1..=3 {
        let bar = MarketEvent::bar(AAPL, dec!(150), Timestamp::from_millis(minute * 60_000));
        engine.handle(&bar, &mut Context::new(&mut gateway, &portfolio, &mut sink));
    }
    let written = std::fs::read_to_string(sink.path()).with_context(|| format!("reading {}", path.display()))?;
    println!("  {} contains: {}", path.display(), written.trim());
    Ok(())
}
