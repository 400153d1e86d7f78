//! Core domain types and decision logic.

pub mod ohlcv;
pub mod fundamentals;
pub mod indicator;
pub mod snapshot;
pub mod selection;
pub mod scheduler;
pub mod target;
pub mod intent;
pub mod trade_state;
pub mod signal;
pub mod strategy;
pub mod universe;
pub mod code_data;
pub mod config_validation;
pub mod error;
