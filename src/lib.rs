//! factorsig: decision engines for factor selection and per-instrument trading signals.
//!
//! Hexagonal architecture: decision logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command-line replay in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
