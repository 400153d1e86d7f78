//! Execution harness port.
//!
//! The decision engines hand intents to this collaborator and query it for
//! account equity and order status. Fills, share deltas and cash accounting
//! live behind it.

use crate::domain::intent::{OrderIntent, TargetWeight};

pub trait ExecutionPort {
    fn account_equity(&self) -> f64;

    /// An order for `code` was submitted and is not yet settled.
    fn has_pending_order(&self, code: &str) -> bool;

    fn submit_target(&mut self, target: TargetWeight);

    fn submit_order(&mut self, order: OrderIntent);
}
