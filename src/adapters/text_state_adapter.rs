//! Line-oriented text file session store.
//!
//! ```text
//! <balance>
//! <symbol>,<quantity>
//! ...
//! ```
//! Prices are not stored; they come from the market when the file is loaded.

use crate::domain::error::PapertradeError;
use crate::domain::market::normalize_symbol;
use crate::domain::portfolio::PersistedState;
use crate::ports::state_port::StatePort;
use std::fs;
use std::path::{Path, PathBuf};

pub struct TextStateAdapter {
    path: PathBuf,
}

impl TextStateAdapter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_error(&self, reason: impl Into<String>) -> PapertradeError {
        PapertradeError::PersistenceRead {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }

    fn write_error(&self, reason: impl Into<String>) -> PapertradeError {
        PapertradeError::PersistenceWrite {
            path: self.path.display().to_string(),
            reason: reason.into(),
        }
    }
}

/// Render state in the on-disk format.
pub fn encode(state: &PersistedState) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());
    wtr.write_record([state.balance.to_string()])?;
    for (symbol, quantity) in &state.holdings {
        wtr.write_record([symbol.as_str(), &quantity.to_string()])?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse the on-disk format. Any malformed line rejects the whole input.
pub fn decode(content: &str) -> Result<PersistedState, String> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let mut records = rdr.records();

    let first = records
        .next()
        .ok_or("missing balance line")?
        .map_err(|e| format!("CSV parse error: {}", e))?;
    if first.len() != 1 {
        return Err(format!("expected balance on line 1, got {} fields", first.len()));
    }
    let balance: f64 = first[0]
        .parse()
        .map_err(|_| format!("invalid balance '{}'", &first[0]))?;
    if !balance.is_finite() || balance < 0.0 {
        return Err(format!("balance must be non-negative, got {}", balance));
    }

    let mut holdings = Vec::new();
    for (index, result) in records.enumerate() {
        let line = index + 2;
        let record = result.map_err(|e| format!("CSV parse error: {}", e))?;
        if record.len() != 2 {
            return Err(format!(
                "line {}: expected symbol,quantity, got {} fields",
                line,
                record.len()
            ));
        }
        let symbol = normalize_symbol(&record[0]);
        if symbol.is_empty() {
            return Err(format!("line {}: missing symbol", line));
        }
        let quantity: u64 = record[1]
            .parse()
            .map_err(|_| format!("line {}: invalid quantity '{}'", line, &record[1]))?;
        if quantity == 0 {
            return Err(format!("line {}: quantity must be positive", line));
        }
        holdings.push((symbol, quantity));
    }

    Ok(PersistedState { balance, holdings })
}

impl StatePort for TextStateAdapter {
    fn save(&self, state: &PersistedState) -> Result<(), PapertradeError> {
        let content = encode(state).map_err(|e| self.write_error(e.to_string()))?;
        fs::write(&self.path, content).map_err(|e| self.write_error(e.to_string()))
    }

    fn load(&self) -> Result<Option<PersistedState>, PapertradeError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.read_error(e.to_string()))?;
        decode(&content).map(Some).map_err(|reason| self.read_error(reason))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
