//! Bounded random-walk price simulation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::PapertradeError;
use super::market::Market;
use crate::ports::price_source::PriceSource;

pub const DEFAULT_MAX_SHOCK: f64 = 0.05;

/// Floor applied when a shock would push a price to zero or below.
pub const MIN_PRICE: f64 = 0.01;

/// Multiplicative shock drawn uniformly from `[-max_shock, +max_shock)`.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    rng: StdRng,
    max_shock: f64,
}

impl RandomWalk {
    pub fn new(max_shock: f64) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            max_shock,
        }
    }

    pub fn seeded(max_shock: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_shock,
        }
    }
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SHOCK)
    }
}

/// Clamp a candidate price into the valid range.
pub fn guard_price(candidate: f64) -> f64 {
    if candidate.is_finite() && candidate > 0.0 {
        candidate
    } else {
        MIN_PRICE
    }
}

impl PriceSource for RandomWalk {
    fn perturb(&mut self, current_price: f64) -> f64 {
        // gen_range panics on an empty range
        if !self.max_shock.is_finite() || self.max_shock <= 0.0 {
            return guard_price(current_price);
        }
        let shock: f64 = self.rng.gen_range(-self.max_shock..self.max_shock);
        guard_price(current_price * (1.0 + shock))
    }
}

/// Perturb every instrument once. Symbols are visited in sorted order.
pub fn refresh_market(market: &mut Market, source: &mut dyn PriceSource) -> Result<(), PapertradeError> {
    for quote in market.list_all() {
        let next = guard_price(source.perturb(quote.price));
        market.apply_price_update(&quote.symbol, next)?;
    }
    Ok(())
}
