//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_state_adapter::TextStateAdapter;
use crate::domain::config_validation::validate_session_config;
use crate::domain::engine::Side;
use crate::domain::error::PapertradeError;
use crate::domain::market::{parse_market_seed, Market};
use crate::domain::price_simulator::RandomWalk;
use crate::domain::session::{RestoreOutcome, SessionConfig, TradingSession};
use crate::ports::config_port::ConfigPort;
use crate::shell;

#[derive(Parser, Debug)]
#[command(name = "papertrade", about = "Simulated stock trading session")]
pub struct Cli {
    /// INI file with [session], [market] and [simulator] sections
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Where balance and holdings are saved between sessions
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,
    /// Seed for the price simulator
    #[arg(long, global = true)]
    pub seed: Option<u64>,
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show current market prices
    Market,
    /// Show balance and holdings
    Portfolio,
    /// Buy shares at the current market price
    Buy {
        symbol: String,
        #[arg(allow_hyphen_values = true)]
        quantity: String,
    },
    /// Sell shares at the current market price
    Sell {
        symbol: String,
        #[arg(allow_hyphen_values = true)]
        quantity: String,
    },
    /// Start an interactive trading session
    Shell,
}

/// Install the stderr log subscriber.
pub fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else if quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match resolve_session_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let mut session = match build_session(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match cli.command {
        Command::Market => run_market(&session, &mut out),
        Command::Portfolio => run_portfolio(&mut session, &mut out),
        Command::Buy { symbol, quantity } => run_trade(&mut session, Side::Buy, &symbol, &quantity, &mut out),
        Command::Sell { symbol, quantity } => run_trade(&mut session, Side::Sell, &symbol, &quantity, &mut out),
        Command::Shell => {
            report_restore(&session.restore_session());
            shell::run_shell(&mut session, io::stdin().lock(), &mut out)
                .map(|()| ExitCode::SUCCESS)
                .map_err(PapertradeError::from)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, PapertradeError> {
    FileConfigAdapter::from_file(path).map_err(|e| PapertradeError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Merge the config file (if any) with command-line overrides.
pub fn resolve_session_config(cli: &Cli) -> Result<SessionConfig, PapertradeError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            build_session_config(&load_config(path)?)?
        }
        None => SessionConfig::default(),
    };
    if let Some(state_file) = &cli.state_file {
        config.state_file = state_file.clone();
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    Ok(config)
}

pub fn build_session_config(adapter: &dyn ConfigPort) -> Result<SessionConfig, PapertradeError> {
    validate_session_config(adapter)?;
    let defaults = SessionConfig::default();

    let market = match adapter.get_string("market", "symbols") {
        Some(symbols) => parse_market_seed(&symbols)?,
        None => defaults.market,
    };
    let seed = match adapter.get_string("simulator", "seed") {
        Some(raw) => Some(raw.trim().parse::<u64>().map_err(|_| PapertradeError::ConfigInvalid {
            section: "simulator".into(),
            key: "seed".into(),
            reason: "seed must be a non-negative integer".into(),
        })?),
        None => None,
    };

    Ok(SessionConfig {
        initial_balance: adapter.get_double("session", "initial_balance", defaults.initial_balance),
        state_file: adapter
            .get_string("session", "state_file")
            .map(|s| PathBuf::from(s.trim()))
            .unwrap_or(defaults.state_file),
        market,
        max_shock: adapter.get_double("simulator", "max_shock", defaults.max_shock),
        seed,
    })
}

pub fn build_session(config: &SessionConfig) -> Result<TradingSession, PapertradeError> {
    let market = Market::new(config.market.iter().map(|(s, p)| (s.as_str(), *p)))?;
    let walk = match config.seed {
        Some(seed) => RandomWalk::seeded(config.max_shock, seed),
        None => RandomWalk::new(config.max_shock),
    };
    Ok(TradingSession::new(
        market,
        config.initial_balance,
        Box::new(walk),
        Box::new(TextStateAdapter::new(&config.state_file)),
    ))
}

fn report_restore(outcome: &RestoreOutcome) {
    match outcome {
        RestoreOutcome::Discarded { reason } => {
            eprintln!("warning: saved session ignored ({reason}); starting fresh")
        }
        RestoreOutcome::Restored { skipped, .. } if !skipped.is_empty() => {
            eprintln!("warning: dropped holdings not in market: {}", skipped.join(", "))
        }
        _ => {}
    }
}

fn run_market(session: &TradingSession, out: &mut dyn Write) -> Result<ExitCode, PapertradeError> {
    shell::write_market(out, &session.market_snapshot())?;
    Ok(ExitCode::SUCCESS)
}

fn run_portfolio(session: &mut TradingSession, out: &mut dyn Write) -> Result<ExitCode, PapertradeError> {
    report_restore(&session.restore_session());
    shell::write_portfolio(out, &session.portfolio_snapshot())?;
    Ok(ExitCode::SUCCESS)
}

/// Restore, trade once, print, save.
pub fn run_trade(
    session: &mut TradingSession,
    side: Side,
    symbol: &str,
    quantity: &str,
    out: &mut dyn Write,
) -> Result<ExitCode, PapertradeError> {
    report_restore(&session.restore_session());
    let result = match side {
        Side::Buy => session.buy(symbol, quantity),
        Side::Sell => session.sell(symbol, quantity),
    };
    match result {
        Ok(snapshot) => {
            if let Some(fill) = session.fills().last() {
                shell::write_fill(out, fill)?;
            }
            shell::write_portfolio(out, &snapshot)?;
            if let Err(e) = session.persist_session() {
                eprintln!("warning: {e}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let err = PapertradeError::from(e);
            eprintln!("error: {err}");
            Ok((&err).into())
        }
    }
}
