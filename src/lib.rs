// signal-core: signal-driven order engines for an event-driven trading host.
// two strategies share one pipeline: signal estimator -> position target -> order reconciler.
// the host pushes events one at a time; engines answer through the execution gateway.
// single-threaded and deterministic. no I/O beyond the optional snapshot file.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: InstrumentId, OrderId, Side, PositionSide, Venue, Timestamp
//   2.x  window.rs: fixed-capacity rolling window
//   3.x  book.rs: three-level book snapshot, weighted prices, instrument registry
//   4.x  events.rs: bar, quote, trade, order update and control command events
//   5.x  gateway.rs: execution gateway and portfolio traits, per-callback context
//   6.x  pricing.rs: venue routing, aggressive / passive / flash pricing
//   7.x  config.rs: parameter sets, validation, runtime parameter changes
//   8.x  target.rs: desired trade size, notional cap, pairs hedge sizing
//   9.x  reconciler.rs: one working order per instrument
//   10.x imbalance.rs: order-book pressure signal
//   10.1 divergence.rs: pairs divergence signal
//   11.x engine/: ImbalanceEngine and PairsEngine
//   12.x snapshot.rs: bar pnl snapshots and sinks
//   13.x paper.rs: in-memory venue for simulation and tests

// signal pipeline
pub mod divergence;
pub mod engine;
pub mod imbalance;
pub mod reconciler;
pub mod target;

// market data and primitives
pub mod book;
pub mod events;
pub mod types;
pub mod window;

// boundaries
pub mod config;
pub mod gateway;
pub mod paper;
pub mod pricing;
pub mod snapshot;

// re exports for convenience
pub use book::*;
pub use engine::*;
pub use events::*;
pub use gateway::*;
pub use reconciler::*;
pub use types::*;
pub use config::{ConfigError, ImbalanceParams, PairsParams, Phase, StrategyConfig};
pub use divergence::{PairsEstimator, HYSTERESIS_BAND};
pub use imbalance::{ImbalanceEstimator, ImbalanceReading};
pub use paper::{PaperGateway, PaperPortfolio, PaperVenue};
pub use pricing::PricingPolicy;
pub use snapshot::{FileSnapshotSink, MemorySink, NullSink, PnlSnapshot, SinkError, SnapshotSink};
pub use window::RollingWindow;
