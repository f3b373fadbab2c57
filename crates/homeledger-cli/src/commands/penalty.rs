use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use homeledger_core::penalty::{estimate_penalty, PenaltyInput};

use crate::commands::TermTypeArg;
use crate::input;

/// Arguments for the penalty to break a term early
#[derive(Args)]
pub struct PenaltyArgs {
    /// Balance being discharged
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Nominal annual rate of the current contract
    #[arg(long)]
    pub contract_rate: Option<Decimal>,

    /// Posted rate for a term matching the time left
    #[arg(long)]
    pub comparison_rate: Option<Decimal>,

    /// Months left in the current term
    #[arg(long)]
    pub remaining_term_months: Option<u32>,

    /// Term type of the current contract
    #[arg(long, value_enum, default_value_t = TermTypeArg::Fixed)]
    pub term_type: TermTypeArg,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_penalty(args: PenaltyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let penalty_input: PenaltyInput = match (
        &args.input,
        args.balance,
        args.contract_rate,
        args.remaining_term_months,
    ) {
        (None, Some(balance), Some(contract_rate), Some(remaining_term_months)) => PenaltyInput {
            balance,
            contract_rate,
            comparison_rate: args.comparison_rate.unwrap_or(contract_rate),
            remaining_term_months,
            term_type: args.term_type.into(),
        },
        _ => input::read_input(args.input.as_deref())?.ok_or(
            "--balance, --contract-rate and --remaining-term-months are required (or provide --input)",
        )?,
    };
    let result = estimate_penalty(&penalty_input)?;
    Ok(serde_json::to_value(result)?)
}
