mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::penalty::PenaltyArgs;
use commands::projection::{CompareArgs, ProjectArgs};
use commands::rates::{PaymentArgs, PrepaymentLimitArgs, TriggerRateArgs};
use commands::schedule::{PositionArgs, ScheduleArgs};

/// Canadian mortgage amortization and household net-worth projections
#[derive(Parser)]
#[command(
    name = "hl",
    version,
    about = "Canadian mortgage amortization and household net-worth projections",
    long_about = "A CLI for Canadian mortgage math with decimal precision. Computes \
                  payments under semi-annual compounding, full amortization schedules \
                  with prepayments and renewals, trigger rates, month-by-month net-worth \
                  projections, scenario comparisons and prepayment penalties."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine diagnostics at debug level to stderr (overrides HOMELEDGER_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Level payment, first interest/principal split and trigger rate
    Payment(PaymentArgs),
    /// Rate at which a locked payment stops covering interest
    TriggerRate(TriggerRateArgs),
    /// Check a prepayment against the yearly allowance
    PrepaymentLimit(PrepaymentLimitArgs),
    /// Generate an amortization schedule
    Schedule(ScheduleArgs),
    /// Balance, totals and remaining amortization on a date
    Position(PositionArgs),
    /// Project household net worth month by month
    Project(ProjectArgs),
    /// Project several scenarios and compare them against a baseline
    Compare(CompareArgs),
    /// Estimate the penalty for breaking the current term
    Penalty(PenaltyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::rates::run_payment(args),
        Commands::TriggerRate(args) => commands::rates::run_trigger_rate(args),
        Commands::PrepaymentLimit(args) => commands::rates::run_prepayment_limit(args),
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Position(args) => commands::schedule::run_position(args),
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Compare(args) => commands::projection::run_compare(args),
        Commands::Penalty(args) => commands::penalty::run_penalty(args),
        Commands::Version => {
            println!("hl {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
