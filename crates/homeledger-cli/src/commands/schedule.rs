use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use homeledger_core::schedule::{
    generate_schedule, mortgage_position, PositionInput, ScheduleInput, TriggerPolicy,
};

use crate::commands::{narrow, FrequencyArg, TermTypeArg};
use crate::input;

/// Which part of a schedule to print
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ScheduleView {
    /// Ledger and summary
    #[default]
    Full,
    /// Totals, payoff and status only
    Summary,
    /// One row per payment
    Ledger,
}

/// Mortgage contract given as flags
#[derive(Args)]
pub struct ContractArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate, compounded semi-annually (e.g. 0.0549 for 5.49%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization in months
    #[arg(long, default_value = "300")]
    pub amortization_months: u32,

    /// Payment cadence
    #[arg(long, value_enum, default_value_t = FrequencyArg::Monthly)]
    pub frequency: FrequencyArg,

    /// Term type
    #[arg(long, value_enum, default_value_t = TermTypeArg::Fixed)]
    pub term_type: TermTypeArg,

    /// Date of the first payment (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Stop after this many years
    #[arg(long)]
    pub horizon_years: Option<u32>,

    /// Yearly prepayment allowance, percent of the original principal
    #[arg(long)]
    pub prepayment_limit_percent: Option<Decimal>,

    /// Keep going past the trigger rate, adding unpaid interest to the balance
    #[arg(long)]
    pub capitalize_interest: bool,
}

impl ContractArgs {
    /// Build the contract when the required flags are present.
    fn to_input(&self) -> Option<ScheduleInput> {
        let mut input = ScheduleInput::new(
            self.principal?,
            self.rate?,
            self.amortization_months,
            self.frequency.into(),
            self.start_date?,
        );
        input.term_type = self.term_type.into();
        input.horizon_years = self.horizon_years;
        input.prepayment_limit_percent = self.prepayment_limit_percent;
        if self.capitalize_interest {
            input.trigger_policy = TriggerPolicy::CapitalizeInterest;
        }
        Some(input)
    }
}

/// Arguments for the amortization schedule
#[derive(Args)]
pub struct ScheduleArgs {
    #[command(flatten)]
    pub contract: ContractArgs,

    /// Part of the schedule to print
    #[arg(long, value_enum, default_value_t = ScheduleView::Full)]
    pub view: ScheduleView,

    /// Path to JSON/YAML input file with the contract and its events
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the mortgage position on a date
#[derive(Args)]
pub struct PositionArgs {
    #[command(flatten)]
    pub contract: ContractArgs,

    /// Date to report the position on (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Path to JSON/YAML input file (`{"mortgage": {...}, "as_of": "..."}`)
    #[arg(long)]
    pub input: Option<String>,
}

fn contract_or_input<T: serde::de::DeserializeOwned>(
    path: Option<&str>,
    from_flags: Option<T>,
    missing: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if path.is_none() {
        if let Some(value) = from_flags {
            return Ok(value);
        }
    }
    input::read_input(path)?.ok_or_else(|| missing.into())
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = contract_or_input(
        args.input.as_deref(),
        args.contract.to_input(),
        "--principal, --rate and --start-date are required (or provide --input)",
    )?;
    let result = generate_schedule(&schedule_input)?;
    let value = serde_json::to_value(result)?;
    Ok(match args.view {
        ScheduleView::Full => value,
        ScheduleView::Summary => narrow(value, "summary"),
        ScheduleView::Ledger => narrow(value, "payments"),
    })
}

pub fn run_position(args: PositionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let from_flags = match (args.contract.to_input(), args.as_of) {
        (Some(mortgage), Some(as_of)) => Some(PositionInput { mortgage, as_of }),
        _ => None,
    };
    let position_input: PositionInput = contract_or_input(
        args.input.as_deref(),
        from_flags,
        "--principal, --rate, --start-date and --as-of are required (or provide --input)",
    )?;
    let result = mortgage_position(&position_input)?;
    Ok(serde_json::to_value(result)?)
}
