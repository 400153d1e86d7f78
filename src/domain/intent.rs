//! Order intents handed to the execution collaborator.

use chrono::NaiveDate;
use std::fmt;

/// Selection path: hold `target_weight` of account value in `code`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetWeight {
    pub code: String,
    pub date: NaiveDate,
    pub target_weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Buy { size: i64 },
    Sell { size: i64 },
    /// Flatten the whole position.
    Close,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::Buy { .. } => write!(f, "buy"),
            OrderAction::Sell { .. } => write!(f, "sell"),
            OrderAction::Close => write!(f, "close"),
        }
    }
}

impl OrderAction {
    pub fn size(&self) -> Option<i64> {
        match self {
            OrderAction::Buy { size } | OrderAction::Sell { size } => Some(*size),
            OrderAction::Close => None,
        }
    }
}

/// Why the signal state machine emitted an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderReason {
    EnterLong,
    EnterShort,
    PyramidLong,
    PyramidShort,
    StopLoss,
    TakeProfit,
    SignalExit,
}

impl fmt::Display for OrderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderReason::EnterLong => "enter_long",
            OrderReason::EnterShort => "enter_short",
            OrderReason::PyramidLong => "pyramid_long",
            OrderReason::PyramidShort => "pyramid_short",
            OrderReason::StopLoss => "stop_loss",
            OrderReason::TakeProfit => "take_profit",
            OrderReason::SignalExit => "signal_exit",
        };
        f.write_str(s)
    }
}

/// Signal path: a discrete order instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderIntent {
    pub code: String,
    pub date: NaiveDate,
    pub action: OrderAction,
    pub reason: OrderReason,
}
