//! Configuration validation.
//!
//! Every key is optional; a key that is present must hold a usable value.

use crate::domain::error::PapertradeError;
use crate::domain::market::parse_market_seed;
use crate::ports::config_port::ConfigPort;

pub fn validate_session_config(config: &dyn ConfigPort) -> Result<(), PapertradeError> {
    validate_initial_balance(config)?;
    validate_state_file(config)?;
    validate_market_symbols(config)?;
    validate_max_shock(config)?;
    validate_seed(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> PapertradeError {
    PapertradeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a present key as a number, so that typos are reported rather than
/// silently replaced by the default.
fn parse_number(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, PapertradeError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| invalid(section, key, &format!("'{}' is not a number", raw))),
    }
}

fn validate_initial_balance(config: &dyn ConfigPort) -> Result<(), PapertradeError> {
    if let Some(value) = parse_number(config, "session", "initial_balance")? {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(
                "session",
                "initial_balance",
                "initial_balance must be non-negative",
            ));
        }
    }
    Ok(())
}

fn validate_state_file(config: &dyn ConfigPort) -> Result<(), PapertradeError> {
    match config.get_string("session", "state_file") {
        Some(s) if s.trim().is_empty() => Err(invalid(
            "session",
            "state_file",
            "state_file must not be empty",
        )),
        _ => Ok(()),
    }
}

fn validate_market_symbols(config: &dyn ConfigPort) -> Result<(), PapertradeError> {
    if let Some(symbols) = config.get_string("market", "symbols") {
        let seed = parse_market_seed(&symbols)?;
        if seed.is_empty() {
            return Err(invalid(
                "market",
                "symbols",
                "at least one symbol is required",
            ));
        }
    }
    Ok(())
}

fn validate_max_shock(config: &dyn ConfigPort) -> Result<(), PapertradeError> {
    if let Some(value) = parse_number(config, "simulator", "max_shock")? {
        if !(value > 0.0 && value < 1.0) {
            return Err(invalid(
                "simulator",
                "max_shock",
                "max_shock must be between 0 and 1",
            ));
        }
    }
    Ok(())
}

fn validate_seed(config: &dyn ConfigPort) -> Result<(), PapertradeError> {
    if let Some(raw) = config.get_string("simulator", "seed") {
        raw.trim().parse::<u64>().map_err(|_| {
            invalid("simulator", "seed", "seed must be a non-negative integer")
        })?;
    }
    Ok(())
}
