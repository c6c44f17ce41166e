//! Command-line front end.
//!
//! The `lotbook` binary is a thin wrapper around [`main`].

pub mod report;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Trade-lot accounting from the command line.
#[derive(Parser, Debug)]
#[command(name = "lotbook", author, version, about, long_about = None)]
pub struct Cli {
    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import trades and tax report rows, then print holdings and gains
    Report(report::Args),
}

impl Command {
    const fn verbose(&self) -> bool {
        match self {
            Self::Report(args) => args.verbose,
        }
    }
}

/// Install the log subscriber. `RUST_LOG` is honoured unless `verbose`
/// forces debug output.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse arguments, run the command and map the result to an exit code:
/// 0 on success, 1 when input needs attention, 2 on fatal errors.
pub fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.command.verbose());

    let result = match &cli.command {
        Command::Report(args) => report::run(args),
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_report_args() {
        let cli = Cli::try_parse_from([
            "lotbook", "report", "trades.json", "--account", "3", "--fy", "2024-25", "-f", "json",
            "-v",
        ])
        .unwrap();

        let Command::Report(args) = cli.command;
        assert_eq!(args.account, Some(3));
        assert_eq!(args.fy.map(|fy| fy.start_year()), Some(2024));
        assert!(matches!(args.format, report::OutputFormat::Json));
        assert!(args.verbose);
    }

    #[test]
    fn test_bad_financial_year_rejected() {
        assert!(Cli::try_parse_from(["lotbook", "report", "t.json", "--fy", "24"]).is_err());
    }
}
