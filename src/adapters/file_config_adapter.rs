//! Reads the papertrade INI file.
//!
//! ```ini
//! [session]
//! initial_balance = 10000
//! state_file = portfolio.txt
//!
//! [market]
//! symbols = TCS:3200, INFY:1400, RELIANCE:2500, WIPRO:430
//!
//! [simulator]
//! max_shock = 0.05
//! seed = 42
//! ```
//!
//! Section and key names are case-insensitive. Only `initial_balance` and
//! `max_shock` are read as numbers here; `symbols` and `seed` come back as
//! text and are parsed by the domain, which reports a bad value with its key.

use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

#[derive(Debug)]
pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}
