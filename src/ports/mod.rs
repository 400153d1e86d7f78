//! Port traits: the seams between the decision engines and their harness.

pub mod config_port;
pub mod data_port;
pub mod execution_port;
