//! papertrade — single-user simulated stock trading session.
//!
//! Hexagonal architecture: the trading state machine lives in [`domain`],
//! port traits in [`ports`], file-backed implementations in [`adapters`].
//! [`cli`] and [`shell`] are the presentation layer.

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod shell;
