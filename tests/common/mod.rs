#![allow(dead_code)]

use papertrade::domain::error::PapertradeError;
use papertrade::domain::market::Market;
use papertrade::domain::portfolio::PersistedState;
use papertrade::domain::session::TradingSession;
use papertrade::ports::price_source::PriceSource;
use papertrade::ports::state_port::StatePort;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// In-memory store. Clones share the same slot, so a test can keep a handle
/// after moving one into a session.
#[derive(Clone, Default)]
pub struct MockStatePort {
    pub saved: Rc<RefCell<Option<PersistedState>>>,
    pub save_error: Option<String>,
    pub load_error: Option<String>,
}

impl MockStatePort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(self, state: PersistedState) -> Self {
        *self.saved.borrow_mut() = Some(state);
        self
    }

    pub fn failing_save(mut self, reason: &str) -> Self {
        self.save_error = Some(reason.to_string());
        self
    }

    pub fn failing_load(mut self, reason: &str) -> Self {
        self.load_error = Some(reason.to_string());
        self
    }

    pub fn saved_state(&self) -> Option<PersistedState> {
        self.saved.borrow().clone()
    }
}

impl StatePort for MockStatePort {
    fn save(&self, state: &PersistedState) -> Result<(), PapertradeError> {
        if let Some(reason) = &self.save_error {
            return Err(PapertradeError::PersistenceWrite {
                path: "mock".into(),
                reason: reason.clone(),
            });
        }
        *self.saved.borrow_mut() = Some(state.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedState>, PapertradeError> {
        if let Some(reason) = &self.load_error {
            return Err(PapertradeError::PersistenceRead {
                path: "mock".into(),
                reason: reason.clone(),
            });
        }
        Ok(self.saved.borrow().clone())
    }
}

/// Leaves every price unchanged.
pub struct FlatPrices;

impl PriceSource for FlatPrices {
    fn perturb(&mut self, current_price: f64) -> f64 {
        current_price
    }
}

/// Applies a scripted sequence of multipliers, repeating the last one.
pub struct ScriptedShocks {
    factors: VecDeque<f64>,
    last: f64,
}

impl ScriptedShocks {
    pub fn new(factors: &[f64]) -> Self {
        Self {
            factors: factors.iter().copied().collect(),
            last: 1.0,
        }
    }
}

impl PriceSource for ScriptedShocks {
    fn perturb(&mut self, current_price: f64) -> f64 {
        if let Some(f) = self.factors.pop_front() {
            self.last = f;
        }
        current_price * self.last
    }
}

pub fn tcs_market() -> Market {
    Market::new([("TCS", 3200.0)]).unwrap()
}

pub fn session(market: Market, balance: f64, store: MockStatePort) -> TradingSession {
    TradingSession::new(market, balance, Box::new(FlatPrices), Box::new(store))
}
