//! Cash balance and holdings.

use std::collections::BTreeMap;

use super::error::TradeError;
use super::market::normalize_symbol;

pub const DEFAULT_BALANCE: f64 = 10_000.0;

/// A position in one symbol. `reference_price` is the cost basis.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub quantity: u64,
    pub reference_price: f64,
}

impl Holding {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity as f64 * (price - self.reference_price)
    }
}

/// Balance and holdings as written to durable storage. Prices are not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub balance: f64,
    pub holdings: Vec<(String, u64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    balance: f64,
    holdings: BTreeMap<String, Holding>,
}

impl Portfolio {
    pub fn new(balance: f64) -> Self {
        Portfolio {
            balance,
            holdings: BTreeMap::new(),
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn get_holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.get(&normalize_symbol(symbol))
    }

    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }

    pub fn credit(&mut self, amount: f64) {
        self.balance += amount;
    }

    pub fn debit(&mut self, amount: f64) -> Result<(), TradeError> {
        if amount > self.balance {
            return Err(TradeError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// Add `quantity` shares. A new holding takes `price` as its reference
    /// price; an existing one keeps its original reference price.
    pub fn increase_holding(&mut self, symbol: &str, quantity: u64, price: f64) -> Result<(), TradeError> {
        if quantity == 0 {
            return Err(TradeError::InvalidQuantity {
                input: quantity.to_string(),
            });
        }
        let symbol = normalize_symbol(symbol);
        match self.holdings.get_mut(&symbol) {
            Some(holding) => {
                let held = holding.quantity;
                holding.quantity = held
                    .checked_add(quantity)
                    .ok_or_else(|| TradeError::HoldingOverflow {
                        symbol: symbol.clone(),
                        requested: quantity,
                        held,
                    })?;
            }
            None => {
                self.holdings.insert(
                    symbol.clone(),
                    Holding {
                        symbol,
                        quantity,
                        reference_price: price,
                    },
                );
            }
        }
        Ok(())
    }

    /// Remove `quantity` shares, dropping the holding when it reaches zero.
    pub fn decrease_holding(&mut self, symbol: &str, quantity: u64) -> Result<(), TradeError> {
        let symbol = normalize_symbol(symbol);
        let holding = self
            .holdings
            .get_mut(&symbol)
            .ok_or_else(|| TradeError::HoldingNotFound {
                symbol: symbol.clone(),
            })?;
        if quantity > holding.quantity {
            return Err(TradeError::InsufficientHoldings {
                symbol,
                requested: quantity,
                held: holding.quantity,
            });
        }
        holding.quantity -= quantity;
        if holding.quantity == 0 {
            self.holdings.remove(&symbol);
        }
        Ok(())
    }

    /// Replace a holding outright, as done when restoring persisted state.
    pub(crate) fn set_holding(&mut self, holding: Holding) {
        self.holdings.insert(holding.symbol.clone(), holding);
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            balance: self.balance,
            holdings: self
                .holdings
                .values()
                .map(|h| (h.symbol.clone(), h.quantity))
                .collect(),
        }
    }
}

impl Default for Portfolio {
    fn default() -> Self {
        Portfolio::new(DEFAULT_BALANCE)
    }
}
