//! A single trading session: market, portfolio and their collaborators.

use std::path::PathBuf;

use super::engine::{self, Fill, OrderRequest, Side};
use super::error::{PapertradeError, TradeError};
use super::market::{default_market_seed, Market, Quote};
use super::portfolio::{Holding, PersistedState, Portfolio, DEFAULT_BALANCE};
use super::price_simulator::{self, DEFAULT_MAX_SHOCK};
use crate::ports::price_source::PriceSource;
use crate::ports::state_port::StatePort;

/// Everything needed to open a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub initial_balance: f64,
    pub state_file: PathBuf,
    pub market: Vec<(String, f64)>,
    pub max_shock: f64,
    /// `None` seeds the simulator from entropy.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_balance: DEFAULT_BALANCE,
            state_file: PathBuf::from("portfolio.txt"),
            market: default_market_seed(),
            max_shock: DEFAULT_MAX_SHOCK,
            seed: None,
        }
    }
}

pub type MarketSnapshot = Vec<Quote>;

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingView {
    pub symbol: String,
    pub quantity: u64,
    pub current_price: f64,
    pub reference_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSnapshot {
    pub balance: f64,
    pub holdings: Vec<HoldingView>,
    pub total_equity: f64,
}

/// What `restore_session` found in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// Nothing persisted; the session starts fresh.
    Fresh,
    /// State restored. `skipped` lists persisted symbols absent from the market.
    Restored { holdings: usize, skipped: Vec<String> },
    /// The store could not be read; the session was reset.
    Discarded { reason: String },
}

pub struct TradingSession {
    market: Market,
    portfolio: Portfolio,
    initial_balance: f64,
    price_source: Box<dyn PriceSource>,
    store: Box<dyn StatePort>,
    fills: Vec<Fill>,
}

impl TradingSession {
    pub fn new(
        market: Market,
        initial_balance: f64,
        price_source: Box<dyn PriceSource>,
        store: Box<dyn StatePort>,
    ) -> Self {
        Self {
            market,
            portfolio: Portfolio::new(initial_balance),
            initial_balance,
            price_source,
            store,
            fills: Vec::new(),
        }
    }

    pub fn market(&self) -> &Market {
        &self.market
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn buy(&mut self, symbol: &str, quantity: &str) -> Result<PortfolioSnapshot, TradeError> {
        self.submit(&OrderRequest::new(Side::Buy, symbol, quantity))
    }

    pub fn sell(&mut self, symbol: &str, quantity: &str) -> Result<PortfolioSnapshot, TradeError> {
        self.submit(&OrderRequest::new(Side::Sell, symbol, quantity))
    }

    pub fn submit(&mut self, request: &OrderRequest) -> Result<PortfolioSnapshot, TradeError> {
        let fill = engine::execute(&self.market, &mut self.portfolio, request)?;
        self.fills.push(fill);
        Ok(self.portfolio_snapshot())
    }

    /// Advance every price by one simulator step.
    pub fn refresh_market(&mut self) -> Result<MarketSnapshot, PapertradeError> {
        price_simulator::refresh_market(&mut self.market, self.price_source.as_mut())?;
        Ok(self.market_snapshot())
    }

    pub fn market_snapshot(&self) -> MarketSnapshot {
        self.market.list_all()
    }

    pub fn portfolio_snapshot(&self) -> PortfolioSnapshot {
        let holdings: Vec<HoldingView> = self
            .portfolio
            .holdings()
            .map(|h| {
                let current_price = self.market.get_price(&h.symbol).unwrap_or(h.reference_price);
                HoldingView {
                    symbol: h.symbol.clone(),
                    quantity: h.quantity,
                    current_price,
                    reference_price: h.reference_price,
                    market_value: h.market_value(current_price),
                    unrealized_pnl: h.unrealized_pnl(current_price),
                }
            })
            .collect();
        let total_equity = self.portfolio.balance() + holdings.iter().map(|h| h.market_value).sum::<f64>();
        PortfolioSnapshot {
            balance: self.portfolio.balance(),
            holdings,
            total_equity,
        }
    }

    /// Write balance and holdings to the store. Failures are logged and
    /// returned; the in-memory session stays valid either way.
    pub fn persist_session(&self) -> Result<(), PapertradeError> {
        let state = self.portfolio.to_persisted();
        match self.store.save(&state) {
            Ok(()) => {
                tracing::info!(
                    store = %self.store.describe(),
                    holdings = state.holdings.len(),
                    "session saved"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "session not saved");
                Err(e)
            }
        }
    }

    /// Replace the portfolio with persisted state.
    ///
    /// Each restored holding takes the current market price as its reference
    /// price; the original purchase price is not stored.
    pub fn restore_session(&mut self) -> RestoreOutcome {
        let state = match self.store.load() {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::info!(store = %self.store.describe(), "no saved session, starting fresh");
                self.portfolio = Portfolio::new(self.initial_balance);
                return RestoreOutcome::Fresh;
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding saved session");
                self.portfolio = Portfolio::new(self.initial_balance);
                return RestoreOutcome::Discarded {
                    reason: e.to_string(),
                };
            }
        };
        self.apply_persisted(state)
    }

    fn apply_persisted(&mut self, state: PersistedState) -> RestoreOutcome {
        let mut portfolio = Portfolio::new(state.balance);
        let mut skipped = Vec::new();
        for (symbol, quantity) in state.holdings {
            if quantity == 0 {
                continue;
            }
            match self.market.get_price(&symbol) {
                Ok(price) => portfolio.set_holding(Holding {
                    symbol: symbol.clone(),
                    quantity,
                    reference_price: price,
                }),
                Err(_) => {
                    tracing::warn!(%symbol, quantity, "skipping holding for unknown symbol");
                    skipped.push(symbol);
                }
            }
        }
        let holdings = portfolio.holding_count();
        tracing::info!(balance = portfolio.balance(), holdings, "session restored");
        self.portfolio = portfolio;
        RestoreOutcome::Restored { holdings, skipped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Flat;

    impl PriceSource for Flat {
        fn perturb(&mut self, current_price: f64) -> f64 {
            current_price
        }
    }

    struct Scale(f64);

    impl PriceSource for Scale {
        fn perturb(&mut self, current_price: f64) -> f64 {
            current_price * self.0
        }
    }

    #[derive(Default, Clone)]
    struct MemoryStore {
        saved: Rc<RefCell<Option<PersistedState>>>,
        fail: bool,
    }

    impl StatePort for MemoryStore {
        fn save(&self, state: &PersistedState) -> Result<(), PapertradeError> {
            if self.fail {
                return Err(PapertradeError::PersistenceWrite {
                    path: "memory".into(),
                    reason: "disk full".into(),
                });
            }
            *self.saved.borrow_mut() = Some(state.clone());
            Ok(())
        }

        fn load(&self) -> Result<Option<PersistedState>, PapertradeError> {
            if self.fail {
                return Err(PapertradeError::PersistenceRead {
                    path: "memory".into(),
                    reason: "corrupt".into(),
                });
            }
            Ok(self.saved.borrow().clone())
        }
    }

    fn session_with(store: MemoryStore, source: Box<dyn PriceSource>) -> TradingSession {
        TradingSession::new(Market::with_defaults().unwrap(), 10_000.0, source, Box::new(store))
    }

    #[test]
    fn buy_returns_snapshot_and_records_fill() {
        let mut session = session_with(MemoryStore::default(), Box::new(Flat));
        let snapshot = session.buy("TCS", "2").unwrap();
        assert!((snapshot.balance - 3600.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.holdings.len(), 1);
        assert_eq!(snapshot.holdings[0].quantity, 2);
        assert!((snapshot.total_equity - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(session.fills().len(), 1);
    }

    #[test]
    fn rejection_records_no_fill() {
        let mut session = session_with(MemoryStore::default(), Box::new(Flat));
        assert!(session.sell("TCS", "1").is_err());
        assert!(session.fills().is_empty());
    }

    #[test]
    fn refresh_moves_prices_and_snapshot_tracks_them() {
        let mut session = session_with(MemoryStore::default(), Box::new(Scale(1.01)));
        session.buy("WIPRO", "10").unwrap();
        let market = session.refresh_market().unwrap();
        let wipro = market.iter().find(|q| q.symbol == "WIPRO").unwrap();
        assert!((wipro.price - 434.3).abs() < 1e-9);

        let snapshot = session.portfolio_snapshot();
        let view = &snapshot.holdings[0];
        assert!((view.current_price - 434.3).abs() < 1e-9);
        assert!((view.unrealized_pnl - 43.0).abs() < 1e-9);
    }

    #[test]
    fn persist_then_restore_rederives_reference_price() {
        let store = MemoryStore::default();
        let mut session = session_with(store.clone(), Box::new(Flat));
        session.buy("INFY", "3").unwrap();
        session.persist_session().unwrap();

        let mut market = Market::with_defaults().unwrap();
        market.apply_price_update("INFY", 1500.0).unwrap();
        let mut next = TradingSession::new(market, 10_000.0, Box::new(Flat), Box::new(store));

        let outcome = next.restore_session();
        assert_eq!(
            outcome,
            RestoreOutcome::Restored {
                holdings: 1,
                skipped: vec![]
            }
        );
        let holding = next.portfolio().get_holding("INFY").unwrap();
        assert_eq!(holding.quantity, 3);
        assert_eq!(holding.reference_price, 1500.0);
        assert!((next.portfolio().balance() - 5800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn restore_skips_unknown_symbols() {
        let store = MemoryStore::default();
        *store.saved.borrow_mut() = Some(PersistedState {
            balance: 50.0,
            holdings: vec![("GONE".into(), 4), ("TCS".into(), 1)],
        });
        let mut session = session_with(store, Box::new(Flat));
        let outcome = session.restore_session();
        assert_eq!(
            outcome,
            RestoreOutcome::Restored {
                holdings: 1,
                skipped: vec!["GONE".to_string()]
            }
        );
        assert!(session.portfolio().get_holding("GONE").is_none());
    }

    #[test]
    fn restore_with_empty_store_is_fresh() {
        let mut session = session_with(MemoryStore::default(), Box::new(Flat));
        session.buy("TCS", "1").unwrap();
        assert_eq!(session.restore_session(), RestoreOutcome::Fresh);
        assert!((session.portfolio().balance() - 10_000.0).abs() < f64::EPSILON);
        assert_eq!(session.portfolio().holding_count(), 0);
    }

    #[test]
    fn failing_store_is_non_fatal() {
        let store = MemoryStore {
            fail: true,
            ..MemoryStore::default()
        };
        let mut session = session_with(store, Box::new(Flat));
        session.buy("TCS", "1").unwrap();
        assert!(session.persist_session().is_err());
        assert!(session.portfolio().get_holding("TCS").is_some());

        assert!(matches!(
            session.restore_session(),
            RestoreOutcome::Discarded { .. }
        ));
        assert!((session.portfolio().balance() - 10_000.0).abs() < f64::EPSILON);
    }
}
