//! Domain error types.

/// Recoverable rejection of a trade request.
///
/// A rejected request never mutates session state.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TradeError {
    #[error("invalid quantity '{input}': expected a positive whole number")]
    InvalidQuantity { input: String },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("insufficient funds: need {required:.2}, have {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient holdings in {symbol}: requested {requested}, held {held}")]
    InsufficientHoldings {
        symbol: String,
        requested: u64,
        held: u64,
    },

    #[error("no holding in {symbol}")]
    HoldingNotFound { symbol: String },

    #[error("cannot add {requested} to {held} {symbol}: holding would exceed the maximum quantity")]
    HoldingOverflow {
        symbol: String,
        requested: u64,
        held: u64,
    },
}

/// Top-level error type for papertrade.
#[derive(Debug, thiserror::Error)]
pub enum PapertradeError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid price {price} for {symbol}: prices must be positive")]
    InvalidPrice { symbol: String, price: f64 },

    #[error("invalid symbol '{symbol}'")]
    InvalidSymbol { symbol: String },

    #[error("failed to read session state from {path}: {reason}")]
    PersistenceRead { path: String, reason: String },

    #[error("failed to write session state to {path}: {reason}")]
    PersistenceWrite { path: String, reason: String },

    #[error(transparent)]
    Trade(#[from] TradeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&PapertradeError> for std::process::ExitCode {
    fn from(err: &PapertradeError) -> Self {
        let code: u8 = match err {
            PapertradeError::Io(_) => 1,
            PapertradeError::ConfigParse { .. }
            | PapertradeError::ConfigMissing { .. }
            | PapertradeError::ConfigInvalid { .. } => 2,
            PapertradeError::PersistenceRead { .. } | PapertradeError::PersistenceWrite { .. } => 3,
            PapertradeError::Trade(_) => 4,
            PapertradeError::InvalidPrice { .. } | PapertradeError::InvalidSymbol { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
