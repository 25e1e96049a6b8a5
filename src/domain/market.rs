//! Instrument prices for the simulated market.

use std::collections::BTreeMap;

use super::error::{PapertradeError, TradeError};

/// Seed used when no market is configured.
pub const DEFAULT_MARKET: &[(&str, f64)] = &[
    ("TCS", 3200.0),
    ("INFY", 1400.0),
    ("RELIANCE", 2500.0),
    ("WIPRO", 430.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    pub price: f64,
}

/// Point-in-time view of one instrument, as handed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
}

/// Authoritative price table. Symbols are stored uppercase and iterate sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    instruments: BTreeMap<String, Instrument>,
}

/// Trim and uppercase a user-supplied symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

impl Market {
    /// Build a market from `(symbol, price)` pairs.
    ///
    /// Symbols are normalized on entry; when two entries normalize to the same
    /// symbol the later one wins.
    pub fn new<S, I>(seed: I) -> Result<Self, PapertradeError>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, f64)>,
    {
        let mut instruments = BTreeMap::new();
        for (raw, price) in seed {
            let symbol = normalize_symbol(raw.as_ref());
            if symbol.is_empty() {
                return Err(PapertradeError::InvalidSymbol {
                    symbol: raw.as_ref().to_string(),
                });
            }
            if !is_valid_price(price) {
                return Err(PapertradeError::InvalidPrice { symbol, price });
            }
            instruments.insert(symbol.clone(), Instrument { symbol, price });
        }
        Ok(Market { instruments })
    }

    /// Market seeded from [`DEFAULT_MARKET`].
    pub fn with_defaults() -> Result<Self, PapertradeError> {
        Market::new(DEFAULT_MARKET.iter().copied())
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.instruments.contains_key(&normalize_symbol(symbol))
    }

    pub fn get_price(&self, symbol: &str) -> Result<f64, TradeError> {
        let symbol = normalize_symbol(symbol);
        self.instruments
            .get(&symbol)
            .map(|inst| inst.price)
            .ok_or(TradeError::SymbolNotFound { symbol })
    }

    /// Replace the stored price for `symbol`.
    ///
    /// Non-positive or non-finite prices are rejected and the stored price is
    /// left untouched.
    pub fn apply_price_update(&mut self, symbol: &str, new_price: f64) -> Result<(), PapertradeError> {
        let symbol = normalize_symbol(symbol);
        if !is_valid_price(new_price) {
            return Err(PapertradeError::InvalidPrice {
                symbol,
                price: new_price,
            });
        }
        match self.instruments.get_mut(&symbol) {
            Some(inst) => {
                tracing::debug!(symbol = %inst.symbol, from = inst.price, to = new_price, "price update");
                inst.price = new_price;
                Ok(())
            }
            None => Err(TradeError::SymbolNotFound { symbol }.into()),
        }
    }

    pub fn symbols(&self) -> Vec<String> {
        self.instruments.keys().cloned().collect()
    }

    /// Snapshot of every instrument, sorted by symbol.
    pub fn list_all(&self) -> Vec<Quote> {
        self.instruments
            .values()
            .map(|inst| Quote {
                symbol: inst.symbol.clone(),
                price: inst.price,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

/// [`DEFAULT_MARKET`] as owned `(symbol, price)` pairs, the form config uses.
pub fn default_market_seed() -> Vec<(String, f64)> {
    DEFAULT_MARKET
        .iter()
        .map(|&(symbol, price)| (symbol.to_string(), price))
        .collect()
}

/// Parse a `SYMBOL:PRICE, SYMBOL:PRICE` list as found in `[market] symbols`.
pub fn parse_market_seed(input: &str) -> Result<Vec<(String, f64)>, PapertradeError> {
    let invalid = |reason: String| PapertradeError::ConfigInvalid {
        section: "market".to_string(),
        key: "symbols".to_string(),
        reason,
    };

    let mut seed = Vec::new();
    for entry in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (symbol, price) = entry
            .split_once(':')
            .ok_or_else(|| invalid(format!("expected SYMBOL:PRICE, got '{}'", entry)))?;
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(invalid(format!("missing symbol in '{}'", entry)));
        }
        let price: f64 = price
            .trim()
            .parse()
            .map_err(|_| invalid(format!("invalid price in '{}'", entry)))?;
        if !is_valid_price(price) {
            return Err(invalid(format!("price for {} must be positive", symbol)));
        }
        seed.push((symbol, price));
    }
    Ok(seed)
}
