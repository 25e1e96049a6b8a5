//! Buy/sell order validation and execution.
//!
//! A request moves `Received -> Validated -> Applied`, or `Received -> Rejected`.
//! Validation reads the market and portfolio without touching them, so a
//! rejected order leaves both exactly as they were. Execution prices always
//! come from the market at evaluation time.

use std::fmt;

use super::error::TradeError;
use super::market::{normalize_symbol, Market};
use super::portfolio::Portfolio;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A raw request as collected from the user.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub side: Side,
    pub symbol: String,
    pub quantity: String,
}

impl OrderRequest {
    pub fn new(side: Side, symbol: &str, quantity: &str) -> Self {
        Self {
            side,
            symbol: symbol.to_string(),
            quantity: quantity.to_string(),
        }
    }
}

/// An order that has passed every check against the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub side: Side,
    pub symbol: String,
    pub quantity: u64,
    pub price: f64,
    /// Cost for a buy, revenue for a sell.
    pub amount: f64,
}

/// Record of an applied order.
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub side: Side,
    pub symbol: String,
    pub quantity: u64,
    pub price: f64,
    pub amount: f64,
    /// Sell price minus reference price, times quantity. `None` for buys.
    pub realized_pnl: Option<f64>,
}

/// Parse a user-entered quantity as a positive whole number.
pub fn parse_quantity(input: &str) -> Result<u64, TradeError> {
    match input.trim().parse::<u64>() {
        Ok(q) if q > 0 => Ok(q),
        _ => Err(TradeError::InvalidQuantity {
            input: input.to_string(),
        }),
    }
}

pub fn validate(
    market: &Market,
    portfolio: &Portfolio,
    request: &OrderRequest,
) -> Result<ValidatedOrder, TradeError> {
    let quantity = parse_quantity(&request.quantity)?;
    let symbol = normalize_symbol(&request.symbol);
    let price = market.get_price(&symbol)?;
    let amount = price * quantity as f64;

    match request.side {
        Side::Buy => {
            let held = portfolio.get_holding(&symbol).map_or(0, |h| h.quantity);
            if held.checked_add(quantity).is_none() {
                return Err(TradeError::HoldingOverflow {
                    symbol,
                    requested: quantity,
                    held,
                });
            }
            if amount > portfolio.balance() {
                return Err(TradeError::InsufficientFunds {
                    required: amount,
                    available: portfolio.balance(),
                });
            }
        }
        Side::Sell => {
            let held = portfolio.get_holding(&symbol).map_or(0, |h| h.quantity);
            if held < quantity {
                return Err(TradeError::InsufficientHoldings {
                    symbol,
                    requested: quantity,
                    held,
                });
            }
        }
    }

    Ok(ValidatedOrder {
        side: request.side,
        symbol,
        quantity,
        price,
        amount,
    })
}

/// Apply a validated order. Every check has already passed, so each
/// primitive below succeeds against the state `validate` saw.
pub fn apply(portfolio: &mut Portfolio, order: ValidatedOrder) -> Result<Fill, TradeError> {
    let realized_pnl = match order.side {
        Side::Buy => {
            portfolio.debit(order.amount)?;
            portfolio.increase_holding(&order.symbol, order.quantity, order.price)?;
            None
        }
        Side::Sell => {
            let reference = portfolio
                .get_holding(&order.symbol)
                .map_or(order.price, |h| h.reference_price);
            portfolio.decrease_holding(&order.symbol, order.quantity)?;
            portfolio.credit(order.amount);
            Some((order.price - reference) * order.quantity as f64)
        }
    };

    tracing::debug!(
        side = %order.side,
        symbol = %order.symbol,
        quantity = order.quantity,
        price = order.price,
        balance = portfolio.balance(),
        "order applied"
    );

    Ok(Fill {
        side: order.side,
        symbol: order.symbol,
        quantity: order.quantity,
        price: order.price,
        amount: order.amount,
        realized_pnl,
    })
}

pub fn execute(
    market: &Market,
    portfolio: &mut Portfolio,
    request: &OrderRequest,
) -> Result<Fill, TradeError> {
    let order = validate(market, portfolio, request)?;
    apply(portfolio, order)
}

pub fn buy(market: &Market, portfolio: &mut Portfolio, symbol: &str, quantity: &str) -> Result<Fill, TradeError> {
    execute(market, portfolio, &OrderRequest::new(Side::Buy, symbol, quantity))
}

pub fn sell(market: &Market, portfolio: &mut Portfolio, symbol: &str, quantity: &str) -> Result<Fill, TradeError> {
    execute(market, portfolio, &OrderRequest::new(Side::Sell, symbol, quantity))
}
