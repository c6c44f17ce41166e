//! `lotbook report`: import a trade file and print what it adds up to.

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, ValueEnum};
use lotbook_core::{
    AccountId, FinancialYear, GainSummary, RealizedGainEntry, TaxPnlEntry, Trade, TradeId,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Holding, ImportReport, Options, Portfolio, ReconcileOutcome};

/// Output format for the report.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// JSON output for tooling
    Json,
}

/// Import trades and tax report rows, then print holdings and gains.
#[derive(ClapArgs, Debug)]
pub struct Args {
    /// JSON file with `trades` and `tax_entries` arrays
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Options file (defaults to lotbook/options.json in the config directory)
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Only show holdings and gains of this account
    #[arg(long, value_name = "ID")]
    pub account: Option<u64>,

    /// Only show gains realized in this financial year (e.g. 2024-25)
    #[arg(long, value_name = "YEAR")]
    pub fy: Option<FinancialYear>,

    /// Output format (text or json)
    #[arg(long, short = 'f', value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// The input document.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Input {
    /// Trades in submission order.
    pub trades: Vec<Trade>,
    /// Tax report rows in submission order.
    pub tax_entries: Vec<TaxPnlEntry>,
}

/// JSON output structure.
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    /// Batch import counts and failures.
    pub import: &'a ImportReport,
    /// One outcome per tax report row.
    pub reconciliation: &'a [ReconcileOutcome],
    /// Current holdings.
    pub holdings: &'a [Holding],
    /// Realized gains.
    pub realized_gains: &'a [RealizedGainEntry],
    /// Profit by financial year and tax term.
    pub summary: &'a [GainSummary],
}

fn load_options(path: Option<&Path>) -> Result<Options> {
    match path {
        Some(path) => Options::from_path(path)
            .with_context(|| format!("failed to load options from {}", path.display())),
        None => Options::load_default().context("failed to load default options"),
    }
}

fn load_input(path: &Path) -> Result<Input> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// What importing one input document produced.
#[derive(Debug)]
struct Imported {
    import: ImportReport,
    reconciliation: Vec<ReconcileOutcome>,
}

/// Submit the trades, then the tax report rows. Once a row has applied a
/// corporate action, the sells that failed for lack of units are submitted
/// again in their original order.
fn import_all(portfolio: &Portfolio, input: Input) -> Result<Imported> {
    let mut import = portfolio.submit_trades(input.trades.iter().cloned());

    let mut reconciliation = Vec::with_capacity(input.tax_entries.len());
    for (i, entry) in input.tax_entries.into_iter().enumerate() {
        let outcome = portfolio
            .submit_tax_pnl_entry(entry)
            .with_context(|| format!("failed to reconcile tax entry #{}", i + 1))?;
        reconciliation.push(outcome);
    }

    let adjusted = reconciliation
        .iter()
        .any(|o| matches!(o, ReconcileOutcome::AdjustmentApplied { .. }));
    if adjusted {
        let retry: HashSet<&TradeId> = import.retryable().collect();
        if !retry.is_empty() {
            info!(trades = retry.len(), "resubmitting trades after corporate actions");
            let trades: Vec<Trade> = input
                .trades
                .iter()
                .filter(|t| retry.contains(&t.id))
                .cloned()
                .collect();
            let again = portfolio.submit_trades(trades);
            import.merge_retry(again);
        }
    }

    Ok(Imported {
        import,
        reconciliation,
    })
}

/// Run the report. Returns exit code 1 when any trade failed or any report
/// row needs review.
pub fn run(args: &Args) -> Result<ExitCode> {
    let options = load_options(args.options.as_deref())?;
    let input = load_input(&args.file)?;
    let portfolio = Portfolio::new(options);

    let Imported {
        import,
        reconciliation,
    } = import_all(&portfolio, input)?;

    let account = args.account.map(AccountId);
    let holdings = portfolio.get_holdings(account);
    let gains = portfolio.get_realized_gains(args.fy, account);
    let summary: Vec<GainSummary> = portfolio
        .gains_summary(account)
        .into_iter()
        .filter(|s| args.fy.map_or(true, |fy| s.financial_year == fy))
        .collect();

    let mut stdout = io::stdout().lock();
    match args.format {
        OutputFormat::Json => {
            let output = JsonOutput {
                import: &import,
                reconciliation: &reconciliation,
                holdings: &holdings,
                realized_gains: &gains,
                summary: &summary,
            };
            serde_json::to_writer_pretty(&mut stdout, &output)?;
            writeln!(stdout)?;
        }
        OutputFormat::Text => {
            write_import(&mut stdout, &import)?;
            write_reconciliation(&mut stdout, &reconciliation)?;
            write_holdings(&mut stdout, &holdings)?;
            write_gains(&mut stdout, &gains)?;
            write_summary(&mut stdout, &summary)?;
        }
    }

    let needs_review = reconciliation
        .iter()
        .any(|o| matches!(o, ReconcileOutcome::FlaggedForReview(_)));
    if import.is_clean() && !needs_review {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn write_import<W: Write>(out: &mut W, import: &ImportReport) -> io::Result<()> {
    writeln!(out, "Import: {import}")?;
    for failure in &import.failures {
        writeln!(
            out,
            "  {} [{}] {}: {}",
            failure.trade_id, failure.kind, failure.scope, failure.message
        )?;
    }
    Ok(())
}

fn write_reconciliation<W: Write>(out: &mut W, outcomes: &[ReconcileOutcome]) -> io::Result<()> {
    if outcomes.is_empty() {
        return Ok(());
    }
    writeln!(out, "\nReconciliation:")?;
    for (i, outcome) in outcomes.iter().enumerate() {
        match outcome {
            ReconcileOutcome::Matched => writeln!(out, "  #{}: matched", i + 1)?,
            ReconcileOutcome::DuplicateSkipped => writeln!(out, "  #{}: duplicate", i + 1)?,
            ReconcileOutcome::AdjustmentApplied {
                kind,
                ratio,
                effective_date,
            } => writeln!(
                out,
                "  #{}: {kind} {ratio}x applied from {effective_date}",
                i + 1
            )?,
            ReconcileOutcome::FlaggedForReview(item) => {
                writeln!(out, "  #{}: needs review: {}", i + 1, item.error())?;
            }
        }
    }
    Ok(())
}

fn write_holdings<W: Write>(out: &mut W, holdings: &[Holding]) -> io::Result<()> {
    writeln!(out, "\nHoldings:")?;
    if holdings.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for h in holdings {
        writeln!(
            out,
            "  {:>8} {:>8} {:>14} @ {:>12} = {:>16}",
            h.stock,
            h.account,
            h.quantity,
            h.average_price.round_dp(2),
            h.book_value.round_dp(2)
        )?;
    }
    Ok(())
}

fn write_gains<W: Write>(out: &mut W, gains: &[RealizedGainEntry]) -> io::Result<()> {
    writeln!(out, "\nRealized gains:")?;
    if gains.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for g in gains {
        writeln!(
            out,
            "  {} {:>8} {:>8} {} -> {} {:>12} units {:>14} -> {:>14} = {:>14} {} {}",
            g.sell_trade_id,
            g.stock,
            g.account,
            g.entry_date,
            g.exit_date,
            g.quantity,
            g.buy_value.round_dp(2),
            g.sell_value.round_dp(2),
            g.profit.round_dp(2),
            g.tax_term,
            g.financial_year
        )?;
    }
    Ok(())
}

fn write_summary<W: Write>(out: &mut W, summary: &[GainSummary]) -> io::Result<()> {
    writeln!(out, "\nSummary:")?;
    if summary.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for s in summary {
        writeln!(
            out,
            "  {} {} {:>16} ({} entries)",
            s.financial_year,
            s.tax_term,
            s.total_profit.round_dp(2),
            s.entries
        )?;
    }
    Ok(())
}
