//! Core domain types and logic.

pub mod market;
pub mod price_simulator;
pub mod portfolio;
pub mod engine;
pub mod session;
pub mod config_validation;
pub mod error;
