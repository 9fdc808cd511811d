// 11.0.2: errors for explicit engine operations. event handling itself never fails.

use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::types::{InstrumentId, OrderId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Instrument {0} not registered")]
    UnknownInstrument(InstrumentId),

    #[error("Pairs legs must be distinct, got {0} twice")]
    DuplicateLeg(InstrumentId),

    #[error("No quote or trade to price instrument {0}")]
    NoPrice(InstrumentId),

    #[error("Order {0} is not tracked")]
    OrderNotTracked(OrderId),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
