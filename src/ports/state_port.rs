//! Session state persistence port trait.

use crate::domain::error::PapertradeError;
use crate::domain::portfolio::PersistedState;

/// Port for saving and restoring balance and holdings between sessions.
pub trait StatePort {
    fn save(&self, state: &PersistedState) -> Result<(), PapertradeError>;

    /// `Ok(None)` means no state has been persisted yet.
    fn load(&self) -> Result<Option<PersistedState>, PapertradeError>;

    /// Human-readable location, used in log messages.
    fn describe(&self) -> String {
        "session store".to_string()
    }
}
