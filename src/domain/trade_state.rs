//! Per-instrument position state of the signal state machine.

use std::fmt;

use crate::domain::intent::OrderReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Flat,
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Flat => write!(f, "flat"),
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// Side, tranche count and the close of the latest entry or pyramid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeState {
    pub side: Side,
    pub pyramid_count: u32,
    pub entry_reference_price: Option<f64>,
}

impl TradeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.side == Side::Flat
    }

    pub fn reset(&mut self) {
        *self = TradeState::default();
    }

    /// Moves the state along a transition filled at `close`.
    pub fn apply(&mut self, reason: OrderReason, close: f64) {
        match reason {
            OrderReason::EnterLong => self.open(Side::Long, close),
            OrderReason::EnterShort => self.open(Side::Short, close),
            OrderReason::PyramidLong | OrderReason::PyramidShort => {
                self.pyramid_count += 1;
                self.entry_reference_price = Some(close);
            }
            OrderReason::StopLoss | OrderReason::TakeProfit | OrderReason::SignalExit => {
                self.reset()
            }
        }
    }

    fn open(&mut self, side: Side, close: f64) {
        self.side = side;
        self.pyramid_count = 1;
        self.entry_reference_price = Some(close);
    }
}
