//! Where a mortgage stands on a given date.
//!
//! The as-of date is always supplied by the caller; nothing here reads the
//! system clock.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::rates::{calculate_remaining_amortization, RemainingAmortization};
use crate::schedule::amortization::{
    amortize, validate_schedule_input, AmortizationSchedule, ScheduleInput,
};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::HomeLedgerResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionInput {
    pub mortgage: ScheduleInput,
    pub as_of: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgagePosition {
    pub as_of: NaiveDate,
    pub payments_made: u32,
    pub balance: Money,
    pub interest_paid: Money,
    pub principal_paid: Money,
    pub prepayments_made: Money,
    pub current_rate: Rate,
    pub current_payment: Money,
    pub remaining_amortization: RemainingAmortization,
    pub next_payment_date: Option<NaiveDate>,
}

/// Position of the mortgage after every payment dated on or before `as_of`.
pub fn position_as_of(schedule: &AmortizationSchedule, as_of: NaiveDate) -> MortgagePosition {
    let made = schedule
        .payments
        .partition_point(|p| p.payment_date <= as_of);
    let paid = &schedule.payments[..made];

    let balance = paid
        .last()
        .map(|p| p.remaining_balance)
        .unwrap_or(schedule.summary.original_principal);

    // The contract in force is the one on the last payment made, or the
    // first scheduled payment when nothing is due yet.
    let reference = paid.last().or(schedule.payments.first());
    let current_rate = reference.map(|p| p.annual_rate).unwrap_or(Decimal::ZERO);
    let current_payment = match schedule.payments.get(made) {
        Some(next) if !next.trigger_rate_hit => next.payment_amount,
        _ => reference
            .map(|p| p.payment_amount)
            .unwrap_or(schedule.summary.initial_payment_amount),
    };

    let remaining_amortization = match reference {
        Some(p) => calculate_remaining_amortization(balance, current_payment, current_rate, p.frequency),
        None => RemainingAmortization::Months(Decimal::ZERO),
    };

    MortgagePosition {
        as_of,
        payments_made: made as u32,
        balance,
        interest_paid: paid.iter().map(|p| p.interest_payment).sum(),
        principal_paid: paid.iter().map(|p| p.principal_payment).sum(),
        prepayments_made: paid.iter().map(|p| p.extra_prepayment).sum(),
        current_rate,
        current_payment,
        remaining_amortization,
        next_payment_date: schedule.payments.get(made).map(|p| p.payment_date),
    }
}

/// Validate, generate the schedule and report the position as of a date.
pub fn mortgage_position(
    input: &PositionInput,
) -> HomeLedgerResult<ComputationOutput<MortgagePosition>> {
    let start = Instant::now();
    validate_schedule_input(&input.mortgage)?;

    let (schedule, mut warnings) = amortize(&input.mortgage);
    let position = position_as_of(&schedule, input.as_of);

    if input.as_of < input.mortgage.start_date {
        warnings.push(format!(
            "as_of {} precedes the first payment on {}",
            input.as_of, input.mortgage.start_date
        ));
    }
    if position.remaining_amortization.is_trigger_rate_hit() {
        warnings.push("Current payment does not cover interest; trigger rate reached".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Mortgage position as of date",
        input,
        warnings,
        elapsed,
        position,
    ))
}
