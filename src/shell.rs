//! Text rendering and the interactive command loop.

use std::io::{self, BufRead, Write};

use crate::domain::engine::{Fill, Side};
use crate::domain::error::TradeError;
use crate::domain::session::{MarketSnapshot, PortfolioSnapshot, TradingSession};

pub const HELP: &str = "\
commands:
  market              show current prices
  portfolio           show balance and holdings
  buy <SYMBOL> <QTY>  buy shares at the current price
  sell <SYMBOL> <QTY> sell shares at the current price
  refresh             move every price by one simulator step
  history             list trades made this session
  help                show this message
  quit                save and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Market,
    Portfolio,
    Trade {
        side: Side,
        symbol: String,
        quantity: String,
    },
    Refresh,
    History,
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(ShellCommand::Empty);
    };
    let args: Vec<&str> = words.collect();
    let verb = verb.to_lowercase();

    let side = match verb.as_str() {
        "buy" => Side::Buy,
        "sell" => Side::Sell,
        other => {
            if !args.is_empty() {
                return Err(format!("'{}' takes no arguments", other));
            }
            return match other {
                "market" | "m" => Ok(ShellCommand::Market),
                "portfolio" | "p" => Ok(ShellCommand::Portfolio),
                "refresh" | "r" => Ok(ShellCommand::Refresh),
                "history" => Ok(ShellCommand::History),
                "help" | "?" => Ok(ShellCommand::Help),
                "quit" | "exit" | "q" => Ok(ShellCommand::Quit),
                _ => Err(format!("unknown command '{}' (try 'help')", other)),
            };
        }
    };

    match args.as_slice() {
        [symbol, quantity] => Ok(ShellCommand::Trade {
            side,
            symbol: symbol.to_string(),
            quantity: quantity.to_string(),
        }),
        _ => Err(format!("usage: {} <SYMBOL> <QTY>", verb)),
    }
}

pub fn write_market(out: &mut dyn Write, market: &MarketSnapshot) -> io::Result<()> {
    writeln!(out, "{:<12} {:>12}", "SYMBOL", "PRICE")?;
    for quote in market {
        writeln!(out, "{:<12} {:>12.2}", quote.symbol, quote.price)?;
    }
    Ok(())
}

pub fn write_portfolio(out: &mut dyn Write, snapshot: &PortfolioSnapshot) -> io::Result<()> {
    writeln!(out, "Balance: {:.2}", snapshot.balance)?;
    if snapshot.holdings.is_empty() {
        writeln!(out, "No holdings.")?;
    } else {
        writeln!(
            out,
            "{:<12} {:>8} {:>12} {:>14} {:>12}",
            "SYMBOL", "QTY", "PRICE", "VALUE", "P&L"
        )?;
        for h in &snapshot.holdings {
            writeln!(
                out,
                "{:<12} {:>8} {:>12.2} {:>14.2} {:>12.2}",
                h.symbol, h.quantity, h.current_price, h.market_value, h.unrealized_pnl
            )?;
        }
    }
    writeln!(out, "Equity: {:.2}", snapshot.total_equity)
}

pub fn write_fill(out: &mut dyn Write, fill: &Fill) -> io::Result<()> {
    write!(
        out,
        "{} {} {} @ {:.2} = {:.2}",
        fill.side, fill.quantity, fill.symbol, fill.price, fill.amount
    )?;
    match fill.realized_pnl {
        Some(pnl) => writeln!(out, " (realized {:+.2})", pnl),
        None => writeln!(out),
    }
}

pub fn write_rejection(out: &mut dyn Write, err: &TradeError) -> io::Result<()> {
    writeln!(out, "rejected: {}", err)
}

fn execute(session: &mut TradingSession, command: ShellCommand, out: &mut dyn Write) -> io::Result<bool> {
    match command {
        ShellCommand::Empty => {}
        ShellCommand::Market => write_market(out, &session.market_snapshot())?,
        ShellCommand::Portfolio => write_portfolio(out, &session.portfolio_snapshot())?,
        ShellCommand::Trade {
            side,
            symbol,
            quantity,
        } => {
            let result = match side {
                Side::Buy => session.buy(&symbol, &quantity),
                Side::Sell => session.sell(&symbol, &quantity),
            };
            match result {
                Ok(snapshot) => {
                    if let Some(fill) = session.fills().last() {
                        write_fill(out, fill)?;
                    }
                    writeln!(out, "Balance: {:.2}", snapshot.balance)?;
                }
                Err(e) => write_rejection(out, &e)?,
            }
        }
        ShellCommand::Refresh => match session.refresh_market() {
            Ok(market) => write_market(out, &market)?,
            Err(e) => writeln!(out, "refresh failed: {}", e)?,
        },
        ShellCommand::History => {
            if session.fills().is_empty() {
                writeln!(out, "No trades yet.")?;
            }
            for fill in session.fills() {
                write_fill(out, fill)?;
            }
        }
        ShellCommand::Help => writeln!(out, "{}", HELP)?,
        ShellCommand::Quit => return Ok(false),
    }
    Ok(true)
}

/// Read commands until `quit` or end of input, then save the session once.
pub fn run_shell<R: BufRead>(session: &mut TradingSession, input: R, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "papertrade shell, type 'help' for commands")?;
    write_portfolio(out, &session.portfolio_snapshot())?;
    for line in input.lines() {
        let line = line?;
        let keep_going = match parse_command(&line) {
            Ok(command) => execute(session, command, out)?,
            Err(msg) => {
                writeln!(out, "error: {}", msg)?;
                true
            }
        };
        if !keep_going {
            break;
        }
    }
    if let Err(e) = session.persist_session() {
        writeln!(out, "warning: {}", e)?;
    }
    Ok(())
}
