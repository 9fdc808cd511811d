// 11.3 engine/commands.rs: operator controls shared by both engines.
// 1 = reprice every working order from the live top of book, 2 = cancel everything.

use super::execution::{cancel_all, reprice, reprice_all};
use super::imbalance::ImbalanceEngine;
use super::pairs::PairsEngine;
use super::results::EngineError;
use crate::events::ControlCommand;
use crate::gateway::Context;
use crate::pricing::PricingPolicy;
use crate::reconciler::OrderAction;
use crate::types::OrderId;
use tracing::info;

impl ImbalanceEngine {
    pub(super) fn run_command(&mut self, command: ControlCommand, ctx: &mut Context<'_>) -> Vec<OrderAction> {
        info!(command = command.label(), "control command");
        let policy = self.limit_policy();
        match command {
            ControlCommand::RepriceAll => reprice_all(&mut self.reconciler, &self.registry, ctx, policy),
            ControlCommand::CancelAll => vec![cancel_all(ctx)],
        }
    }

    /// Cancel-replace one working order at the current passive price.
    pub fn reprice(&mut self, order_id: OrderId, ctx: &mut Context<'_>) -> Result<OrderAction, EngineError> {
        let policy = self.limit_policy();
        reprice(&mut self.reconciler, &self.registry, ctx, order_id, policy)
    }
}

impl PairsEngine {
    pub(super) fn run_command(&mut self, command: ControlCommand, ctx: &mut Context<'_>) -> Vec<OrderAction> {
        info!(command = command.label(), "control command");
        match command {
            ControlCommand::RepriceAll => {
                reprice_all(&mut self.reconciler, &self.registry, ctx, PricingPolicy::Aggressive)
            }
            ControlCommand::CancelAll => vec![cancel_all(ctx)],
        }
    }

    /// Cancel-replace one working order at the far touch.
    pub fn reprice(&mut self, order_id: OrderId, ctx: &mut Context<'_>) -> Result<OrderAction, EngineError> {
        reprice(&mut self.reconciler, &self.registry, ctx, order_id, PricingPolicy::Aggressive)
    }
}
