//! In-memory execution port for replays and tests.
//!
//! Records every intent it receives and reports a fixed account equity. By
//! default an order settles as soon as it is submitted; with
//! [`PaperExecution::holding_orders`] it stays pending until settled by hand.

use std::collections::HashSet;

use crate::domain::intent::{OrderIntent, TargetWeight};
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone, Default)]
pub struct PaperExecution {
    equity: f64,
    hold_orders: bool,
    pending: HashSet<String>,
    targets: Vec<TargetWeight>,
    orders: Vec<OrderIntent>,
}

impl PaperExecution {
    pub fn new(equity: f64) -> Self {
        Self {
            equity,
            ..Self::default()
        }
    }

    pub fn holding_orders(mut self) -> Self {
        self.hold_orders = true;
        self
    }

    pub fn targets(&self) -> &[TargetWeight] {
        &self.targets
    }

    pub fn orders(&self) -> &[OrderIntent] {
        &self.orders
    }

    pub fn settle(&mut self, code: &str) -> bool {
        self.pending.remove(code)
    }

    pub fn settle_all(&mut self) {
        self.pending.clear();
    }
}

impl ExecutionPort for PaperExecution {
    fn account_equity(&self) -> f64 {
        self.equity
    }

    fn has_pending_order(&self, code: &str) -> bool {
        self.pending.contains(code)
    }

    fn submit_target(&mut self, target: TargetWeight) {
        self.targets.push(target);
    }

    fn submit_order(&mut self, order: OrderIntent) {
        if self.hold_orders {
            self.pending.insert(order.code.clone());
        }
        self.orders.push(order);
    }
}
