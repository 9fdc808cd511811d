// 11.0: decision engines. each takes one event at a time through handle(event, ctx),
// runs signal -> target -> reconciler to completion and returns the order actions it sent.
// single-threaded and synchronous. all per-instrument state is owned by the engine.

mod commands;
mod execution;
mod imbalance;
mod pairs;
mod results;

pub use imbalance::ImbalanceEngine;
pub use pairs::{PairsEngine, THROTTLE_WARN_AFTER};
pub use results::EngineError;
