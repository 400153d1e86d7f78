//! Per-instrument trading signal state machine.
//!
//! Each [`SignalEngine`] owns its indicators and [`TradeState`]. Indicators
//! advance on every bar; transitions are evaluated only when no order is
//! pending and every indicator is warm.
//!
//! | From  | Condition                                                        | To    |
//! |-------|------------------------------------------------------------------|-------|
//! | Flat  | histogram < 0, J crosses above K and D, RSI < long max           | Long  |
//! | Flat  | MACD > 0, signal > 0, J crosses below K and D, close < SMA, RSI > short min | Short |
//! | Long  | close > entry + 0.4 ATR, tranches < max, volume > volume SMA     | Long  |
//! | Long  | close < entry - 3 ATR                                            | Flat  |
//! | Long  | close > entry + 2 ATR                                            | Flat  |
//! | Short | close < entry - 0.5 ATR, tranches < max                          | Short |
//! | Short | close > entry + 3 ATR                                            | Flat  |
//! | Short | histogram > 0, J crosses above K and D                           | Flat  |
//!
//! Rows of one state are tried top to bottom; the first match wins. Entries
//! and pyramids need a positive ATR to size the tranche; exits do not.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::indicator::{atr, kdj, macd, rsi, Atr, Kdj, KdjValue, Macd, MacdValue, Rsi, Sma};
use crate::domain::intent::{OrderAction, OrderIntent, OrderReason};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::trade_state::{Side, TradeState};

#[derive(Debug, Clone, PartialEq)]
pub struct SignalConfig {
    pub atr_period: usize,
    pub rsi_period: usize,
    pub rsi_long_max: f64,
    pub rsi_short_min: f64,
    pub sma_period: usize,
    pub volume_sma_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub kdj_period: usize,
    pub kdj_fast: usize,
    pub kdj_slow: usize,
    pub risk_fraction: f64,
    pub contract_multiplier: f64,
    pub margin_rate: f64,
    /// Tranche cap, counting the entry.
    pub max_pyramid: u32,
    pub long_pyramid_atr: f64,
    pub short_pyramid_atr: f64,
    pub stop_loss_atr: f64,
    pub take_profit_atr: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        SignalConfig {
            atr_period: atr::DEFAULT_PERIOD,
            rsi_period: rsi::DEFAULT_PERIOD,
            rsi_long_max: 70.0,
            rsi_short_min: 30.0,
            sma_period: 10,
            volume_sma_period: 20,
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            kdj_period: kdj::DEFAULT_PERIOD,
            kdj_fast: kdj::DEFAULT_FAST,
            kdj_slow: kdj::DEFAULT_SLOW,
            risk_fraction: 0.005,
            contract_multiplier: 300.0,
            margin_rate: 0.1,
            max_pyramid: 3,
            long_pyramid_atr: 0.4,
            short_pyramid_atr: 0.5,
            stop_loss_atr: 3.0,
            take_profit_atr: 2.0,
        }
    }
}

/// Indicator readings for one bar, all defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalInputs {
    pub close: f64,
    pub volume: f64,
    pub atr: f64,
    pub rsi: f64,
    pub sma_close: f64,
    pub sma_volume: f64,
    pub macd: MacdValue,
    pub kdj: KdjValue,
    pub prev_kdj: KdjValue,
}

/// The transition to take from `state`, if any.
pub fn decide(state: &TradeState, inputs: &SignalInputs, config: &SignalConfig) -> Option<OrderReason> {
    let SignalInputs {
        close,
        volume,
        atr,
        rsi,
        sma_close,
        sma_volume,
        macd,
        kdj,
        prev_kdj,
    } = *inputs;
    let sizable = atr > 0.0;
    let can_pyramid = sizable && state.pyramid_count < config.max_pyramid;

    match state.side {
        Side::Flat if !sizable => None,
        Side::Flat => {
            if macd.histogram < 0.0 && kdj.j_crossed_above(&prev_kdj) && rsi < config.rsi_long_max {
                Some(OrderReason::EnterLong)
            } else if macd.line > 0.0
                && macd.signal > 0.0
                && kdj.j_crossed_below(&prev_kdj)
                && close < sma_close
                && rsi > config.rsi_short_min
            {
                Some(OrderReason::EnterShort)
            } else {
                None
            }
        }
        Side::Long => {
            let entry = state.entry_reference_price?;
            if close > entry + config.long_pyramid_atr * atr && can_pyramid && volume > sma_volume {
                Some(OrderReason::PyramidLong)
            } else if close < entry - config.stop_loss_atr * atr {
                Some(OrderReason::StopLoss)
            } else if close > entry + config.take_profit_atr * atr {
                Some(OrderReason::TakeProfit)
            } else {
                None
            }
        }
        Side::Short => {
            let entry = state.entry_reference_price?;
            if close < entry - config.short_pyramid_atr * atr && can_pyramid {
                Some(OrderReason::PyramidShort)
            } else if close > entry + config.stop_loss_atr * atr {
                Some(OrderReason::StopLoss)
            } else if macd.histogram > 0.0 && kdj.j_crossed_above(&prev_kdj) {
                Some(OrderReason::SignalExit)
            } else {
                None
            }
        }
    }
}

/// Contracts per entry or pyramid tranche, never less than one.
pub fn position_size(equity: f64, atr: f64, config: &SignalConfig) -> i64 {
    let raw = equity * config.risk_fraction / (atr * config.contract_multiplier * config.margin_rate);
    if raw.is_finite() {
        raw.floor().max(1.0) as i64
    } else {
        1
    }
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    code: String,
    config: SignalConfig,
    atr: Atr,
    rsi: Rsi,
    sma_close: Sma,
    sma_volume: Sma,
    macd: Macd,
    kdj: Kdj,
    state: TradeState,
}

impl SignalEngine {
    pub fn new(code: &str, config: SignalConfig) -> Self {
        Self {
            code: code.to_string(),
            atr: Atr::new(config.atr_period),
            rsi: Rsi::new(config.rsi_period),
            sma_close: Sma::new(config.sma_period),
            sma_volume: Sma::new(config.volume_sma_period),
            macd: Macd::new(config.macd_fast, config.macd_slow, config.macd_signal),
            kdj: Kdj::new(config.kdj_period, config.kdj_fast, config.kdj_slow),
            config,
            state: TradeState::new(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state(&self) -> &TradeState {
        &self.state
    }

    /// Advances the indicators; returns the readings once all are defined
    /// and a previous KDJ reading exists.
    fn update(&mut self, bar: &OhlcvBar) -> Option<SignalInputs> {
        let prev_kdj = self.kdj.value();
        let atr = self.atr.update(bar);
        let rsi = self.rsi.update(bar.close);
        let sma_close = self.sma_close.update(bar.close);
        let sma_volume = self.sma_volume.update(bar.volume as f64);
        let macd = self.macd.update(bar.close);
        let kdj = self.kdj.update(bar);

        Some(SignalInputs {
            close: bar.close,
            volume: bar.volume as f64,
            atr: atr?,
            rsi: rsi?,
            sma_close: sma_close?,
            sma_volume: sma_volume?,
            macd: macd?,
            kdj: kdj?,
            prev_kdj: prev_kdj?,
        })
    }

    /// Processes one bar. With `order_pending` the indicators still advance
    /// but no transition is evaluated.
    pub fn on_bar(&mut self, bar: &OhlcvBar, equity: f64, order_pending: bool) -> Option<OrderIntent> {
        let inputs = self.update(bar);
        if order_pending {
            debug!(code = %self.code, date = %bar.date, "order pending, skipping evaluation");
            return None;
        }
        let inputs = inputs?;
        let reason = decide(&self.state, &inputs, &self.config)?;

        let action = match reason {
            OrderReason::EnterLong | OrderReason::PyramidLong => OrderAction::Buy {
                size: position_size(equity, inputs.atr, &self.config),
            },
            OrderReason::EnterShort | OrderReason::PyramidShort => OrderAction::Sell {
                size: position_size(equity, inputs.atr, &self.config),
            },
            OrderReason::StopLoss | OrderReason::TakeProfit | OrderReason::SignalExit => {
                OrderAction::Close
            }
        };

        let from = self.state.side;
        self.state.apply(reason, bar.close);
        info!(
            code = %self.code,
            date = %bar.date,
            %reason,
            %from,
            to = %self.state.side,
            tranches = self.state.pyramid_count,
            close = bar.close,
            "signal transition"
        );

        Some(self.intent(bar.date, action, reason))
    }

    fn intent(&self, date: NaiveDate, action: OrderAction, reason: OrderReason) -> OrderIntent {
        OrderIntent {
            code: self.code.clone(),
            date,
            action,
            reason,
        }
    }
}
