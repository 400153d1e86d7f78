//! Per-bar drivers connecting the decision engines to an execution port.
//!
//! The harness calls `on_bars` once per date with every bar of that date.
//! Indicators advance first; then the selection driver checks the schedule
//! and the signal driver evaluates each instrument's state machine.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::info;

use crate::domain::intent::OrderIntent;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::scheduler::RebalanceScheduler;
use crate::domain::selection::{select, SelectionConfig, SelectionOutcome};
use crate::domain::signal::{SignalConfig, SignalEngine};
use crate::domain::snapshot::{FactorParams, FactorRegistry};
use crate::domain::target::{translate, TargetPortfolio};
use crate::ports::execution_port::ExecutionPort;

#[derive(Debug, Clone)]
pub struct SelectionStrategy {
    registry: FactorRegistry,
    scheduler: RebalanceScheduler,
    config: SelectionConfig,
    parallel: bool,
    last_target: Option<TargetPortfolio>,
}

impl SelectionStrategy {
    pub fn new(
        codes: &[String],
        params: FactorParams,
        scheduler: RebalanceScheduler,
        config: SelectionConfig,
    ) -> Self {
        Self {
            registry: FactorRegistry::new(codes, params),
            scheduler,
            config,
            parallel: false,
            last_target: None,
        }
    }

    /// Advance indicators on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &FactorRegistry {
        &self.registry
    }

    pub fn last_target(&self) -> Option<&TargetPortfolio> {
        self.last_target.as_ref()
    }

    pub fn update(&mut self, bars: &[OhlcvBar]) {
        if self.parallel {
            self.registry.update_parallel(bars);
        } else {
            self.registry.update(bars);
        }
    }

    /// Selects and submits target weights if `date` is a rebalance date that
    /// has not fired yet.
    pub fn rebalance(&mut self, date: NaiveDate, port: &mut dyn ExecutionPort) -> Option<SelectionOutcome> {
        if !self.scheduler.check(date) {
            return None;
        }
        info!(%date, "rebalance triggered");

        let snapshot = self.registry.snapshot(date);
        let outcome = select(&snapshot, &self.config);
        for target in translate(&outcome.target, self.registry.codes()) {
            port.submit_target(target);
        }
        self.last_target = Some(outcome.target.clone());
        Some(outcome)
    }

    pub fn on_bars(
        &mut self,
        date: NaiveDate,
        bars: &[OhlcvBar],
        port: &mut dyn ExecutionPort,
    ) -> Option<SelectionOutcome> {
        self.update(bars);
        self.rebalance(date, port)
    }
}

/// One signal engine per instrument, looked up by code.
#[derive(Debug, Clone)]
pub struct SignalStrategy {
    engines: Vec<SignalEngine>,
    index: HashMap<String, usize>,
}

impl SignalStrategy {
    pub fn new(codes: &[String], config: &SignalConfig) -> Self {
        let engines: Vec<SignalEngine> = codes
            .iter()
            .map(|code| SignalEngine::new(code, config.clone()))
            .collect();
        let index = codes
            .iter()
            .enumerate()
            .map(|(i, code)| (code.clone(), i))
            .collect();
        Self { engines, index }
    }

    pub fn engine(&self, code: &str) -> Option<&SignalEngine> {
        self.index.get(code).map(|&i| &self.engines[i])
    }

    /// Feeds each bar to its instrument's engine and submits the resulting
    /// orders. Bars for unknown codes are ignored.
    pub fn on_bars(&mut self, bars: &[OhlcvBar], port: &mut dyn ExecutionPort) -> Vec<OrderIntent> {
        let mut intents = Vec::new();
        for bar in bars {
            let Some(&i) = self.index.get(&bar.code) else {
                continue;
            };
            let pending = port.has_pending_order(&bar.code);
            let equity = port.account_equity();
            if let Some(intent) = self.engines[i].on_bar(bar, equity, pending) {
                port.submit_order(intent.clone());
                intents.push(intent);
            }
        }
        intents
    }
}
