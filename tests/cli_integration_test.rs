//! CLI integration tests.
//!
//! Tests cover:
//! - Config parsing (build_session_config) and command-line overrides
//! - One-shot trades against a state file on disk
//! - The interactive shell driven from a scripted input

mod common;

use clap::Parser;
use papertrade::adapters::file_config_adapter::FileConfigAdapter;
use papertrade::cli::{self, Cli, Command};
use papertrade::domain::engine::Side;
use papertrade::domain::error::PapertradeError;
use papertrade::domain::session::SessionConfig;
use papertrade::shell;
use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use tempfile::TempDir;

const VALID_INI: &str = r#"
[session]
initial_balance = 5000
state_file = /tmp/papertrade-test-state.txt

[market]
symbols = TCS:3200, infy:1400, HDFC:1600.5

[simulator]
max_shock = 0.02
seed = 99
"#;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn config_in(dir: &TempDir) -> SessionConfig {
    SessionConfig {
        state_file: dir.path().join("portfolio.txt"),
        seed: Some(1),
        ..SessionConfig::default()
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn build_session_config_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_session_config(&adapter).unwrap();

        assert!((config.initial_balance - 5000.0).abs() < f64::EPSILON);
        assert_eq!(config.state_file, PathBuf::from("/tmp/papertrade-test-state.txt"));
        assert_eq!(
            config.market,
            vec![
                ("TCS".to_string(), 3200.0),
                ("INFY".to_string(), 1400.0),
                ("HDFC".to_string(), 1600.5),
            ]
        );
        assert!((config.max_shock - 0.02).abs() < f64::EPSILON);
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn build_session_config_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[session]\n").unwrap();
        let config = cli::build_session_config(&adapter).unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.market.len(), 4);
        assert_eq!(config.state_file, PathBuf::from("portfolio.txt"));
    }

    #[test]
    fn build_session_config_rejects_invalid() {
        let adapter = FileConfigAdapter::from_string("[simulator]\nmax_shock = 2\n").unwrap();
        let err = cli::build_session_config(&adapter).unwrap_err();
        assert!(matches!(err, PapertradeError::ConfigInvalid { .. }));
    }

    #[test]
    fn load_config_missing_file() {
        let err = cli::load_config(&PathBuf::from("/nonexistent/papertrade.ini")).unwrap_err();
        assert!(matches!(err, PapertradeError::ConfigParse { .. }));
    }

    #[test]
    fn command_line_overrides_config_file() {
        let ini = write_temp_ini(VALID_INI);
        let cli = Cli::parse_from([
            "papertrade",
            "--config",
            ini.path().to_str().unwrap(),
            "--state-file",
            "/tmp/override.txt",
            "--seed",
            "5",
            "market",
        ]);
        let config = cli::resolve_session_config(&cli).unwrap();
        assert_eq!(config.state_file, PathBuf::from("/tmp/override.txt"));
        assert_eq!(config.seed, Some(5));
        assert!((config.initial_balance - 5000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_quantity_reaches_the_engine() {
        let cli = Cli::parse_from(["papertrade", "buy", "TCS", "-3"]);
        match cli.command {
            Command::Buy { symbol, quantity } => {
                assert_eq!(symbol, "TCS");
                assert_eq!(quantity, "-3");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}

mod one_shot {
    use super::*;

    #[test]
    fn trades_accumulate_across_invocations() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let mut out = Vec::new();
        let mut first = cli::build_session(&config).unwrap();
        cli::run_trade(&mut first, Side::Buy, "tcs", "2", &mut out).unwrap();

        let mut second = cli::build_session(&config).unwrap();
        cli::run_trade(&mut second, Side::Buy, "INFY", "1", &mut out).unwrap();

        let content = fs::read_to_string(dir.path().join("portfolio.txt")).unwrap();
        assert_eq!(content, "2200\nINFY,1\nTCS,2\n");

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("BUY 2 TCS @ 3200.00 = 6400.00"));
        assert!(text.contains("Balance: 2200.00"));
    }

    #[test]
    fn rejected_trade_does_not_touch_state_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let mut out = Vec::new();
        let mut session = cli::build_session(&config).unwrap();
        cli::run_trade(&mut session, Side::Sell, "TCS", "1", &mut out).unwrap();

        assert!(!dir.path().join("portfolio.txt").exists());
        assert!(out.is_empty());
    }

    #[test]
    fn build_session_rejects_bad_market() {
        let config = SessionConfig {
            market: vec![("TCS".into(), -1.0)],
            ..SessionConfig::default()
        };
        assert!(matches!(
            cli::build_session(&config),
            Err(PapertradeError::InvalidPrice { .. })
        ));
    }
}

mod interactive {
    use super::*;

    fn run_script(config: &SessionConfig, script: &str) -> String {
        let mut session = cli::build_session(config).unwrap();
        session.restore_session();
        let mut out = Vec::new();
        shell::run_shell(&mut session, Cursor::new(script), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn scripted_session_saves_at_quit() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let output = run_script(
            &config,
            "buy TCS 2\nsell TCS 5\nbuy XXXX 1\nbuy TCS abc\nportfolio\nhistory\nquit\nbuy TCS 1\n",
        );

        assert!(output.contains("BUY 2 TCS @ 3200.00 = 6400.00"));
        assert!(output.contains("rejected: insufficient holdings in TCS: requested 5, held 2"));
        assert!(output.contains("rejected: symbol not found: XXXX"));
        assert!(output.contains("rejected: invalid quantity 'abc'"));
        assert!(output.contains("Balance: 3600.00"));

        let content = fs::read_to_string(dir.path().join("portfolio.txt")).unwrap();
        assert_eq!(content, "3600\nTCS,2\n");
    }

    #[test]
    fn end_of_input_also_saves() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        run_script(&config, "buy WIPRO 10\n");
        let output = run_script(&config, "portfolio\n");

        assert!(output.contains("WIPRO"));
        assert!(output.contains("Balance: 5700.00"));
    }

    #[test]
    fn refresh_prints_market_and_unknown_commands_continue() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let output = run_script(&config, "dance\nrefresh\nmarket\n");
        assert!(output.contains("error: unknown command 'dance'"));
        assert_eq!(output.matches("SYMBOL").count(), 2);
        assert!(output.contains("RELIANCE"));
    }
}
