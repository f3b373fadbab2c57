//! Prepayment penalty for breaking a mortgage term early.
//!
//! Lenders charge the greater of three months' interest and the interest
//! rate differential (IRD). Variable terms only ever pay three months'
//! interest.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::HomeLedgerError;
use crate::rates::effective_periodic_rate;
use crate::types::{
    with_metadata, ComputationOutput, Money, PaymentFrequency, Rate, TermType, MAX_AMOUNT,
};
use crate::HomeLedgerResult;

/// Longest remaining term accepted, in months.
const MAX_REMAINING_TERM_MONTHS: u32 = 1200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenaltyInput {
    pub balance: Money,
    /// Nominal annual rate of the current contract.
    pub contract_rate: Rate,
    /// Lender's posted rate for a term matching the time left.
    pub comparison_rate: Rate,
    pub remaining_term_months: u32,
    #[serde(default)]
    pub term_type: TermType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyMethod {
    ThreeMonthsInterest,
    InterestRateDifferential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyOutput {
    pub three_months_interest: Money,
    /// `None` for variable terms.
    pub interest_rate_differential: Option<Money>,
    pub penalty: Money,
    pub method: PenaltyMethod,
    pub monthly_rate: Rate,
}

/// Estimate the penalty for discharging `balance` now.
pub fn estimate_penalty(input: &PenaltyInput) -> HomeLedgerResult<ComputationOutput<PenaltyOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    validate(input)?;

    let monthly_rate = effective_periodic_rate(input.contract_rate, PaymentFrequency::Monthly);
    let three_months_interest = input.balance * monthly_rate * dec!(3);

    let interest_rate_differential = match input.term_type {
        TermType::Fixed => {
            let spread = (input.contract_rate - input.comparison_rate).max(Decimal::ZERO);
            if spread.is_zero() {
                warnings.push(
                    "Comparison rate is at or above the contract rate; IRD is zero".into(),
                );
            }
            Some(input.balance * spread * Decimal::from(input.remaining_term_months) / dec!(12))
        }
        TermType::VariableChanging | TermType::VariableFixed => None,
    };

    // Equal amounts report three months' interest.
    let (penalty, method) = match interest_rate_differential {
        Some(ird) if ird > three_months_interest => {
            (ird, PenaltyMethod::InterestRateDifferential)
        }
        _ => (three_months_interest, PenaltyMethod::ThreeMonthsInterest),
    };

    if input.remaining_term_months < 3 {
        warnings.push(format!(
            "Only {} months remain in the term; many lenders waive the penalty this close to maturity",
            input.remaining_term_months
        ));
    }

    tracing::debug!(penalty = %penalty, method = ?method, "penalty estimated");

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Greater of three months' interest and interest rate differential",
        input,
        warnings,
        elapsed,
        PenaltyOutput {
            three_months_interest,
            interest_rate_differential,
            penalty,
            method,
            monthly_rate,
        },
    ))
}

fn validate(input: &PenaltyInput) -> HomeLedgerResult<()> {
    if input.balance < Decimal::ZERO || input.balance > MAX_AMOUNT {
        return Err(HomeLedgerError::invalid(
            "balance",
            format!("Balance must be between 0 and {MAX_AMOUNT}"),
        ));
    }
    for (field, rate) in [
        ("contract_rate", input.contract_rate),
        ("comparison_rate", input.comparison_rate),
    ] {
        if rate < Decimal::ZERO || rate >= Decimal::ONE {
            return Err(HomeLedgerError::invalid(
                field,
                "Annual rate must be in [0, 1) (e.g. 0.0549 for 5.49%)",
            ));
        }
    }
    if input.remaining_term_months > MAX_REMAINING_TERM_MONTHS {
        return Err(HomeLedgerError::invalid(
            "remaining_term_months",
            format!("Remaining term cannot exceed {MAX_REMAINING_TERM_MONTHS} months"),
        ));
    }
    Ok(())
}
