//! Price source port trait.

/// Produces the next price for an instrument given its current price.
pub trait PriceSource {
    fn perturb(&mut self, current_price: f64) -> f64;
}
