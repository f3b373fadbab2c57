//! Payment-by-payment amortization ledger.
//!
//! Walks payment numbers from 1 until the balance is retired, the horizon
//! date passes, or a variable-fixed term hits its trigger rate under the
//! `Halt` policy. Renewals and rate moves are applied at the payment
//! boundary they target. The loop is capped by an iteration bound derived
//! from the horizon, so pathological inputs still terminate.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::HomeLedgerError;
use crate::rates::{
    calculate_interest_payment, calculate_payment, calculate_principal_payment,
    calculate_remaining_balance, is_within_prepayment_limit, periods_to_months,
};
use crate::schedule::events::{
    advance_date, PrepaymentCalendar, PrepaymentEvent, PrepaymentKind, RateChange, TermRenewal,
};
use crate::types::{
    with_metadata, ComputationOutput, Money, PaymentFrequency, Rate, TermType, MAX_AMOUNT,
};
use crate::HomeLedgerResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Residual balance below which the loan is treated as retired.
const BALANCE_EPSILON: Decimal = dec!(0.01);

/// Under `CapitalizeInterest`, generation stops once the balance exceeds this
/// multiple of the original principal.
pub const NEGATIVE_AMORTIZATION_LIMIT: Decimal = dec!(2);

/// Longest amortization or horizon accepted, in years.
pub const MAX_HORIZON_YEARS: u32 = 100;

const MAX_AMORTIZATION_MONTHS: u32 = MAX_HORIZON_YEARS * 12;

/// Highest cadence (weekly) bounds the payments per horizon year.
const MAX_PAYMENTS_PER_YEAR: u32 = 52;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// What to do once a variable-fixed payment stops covering interest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Emit the triggering payment (entirely interest) and stop.
    #[default]
    Halt,
    /// Keep going; unpaid interest is added to the balance until it passes
    /// [`NEGATIVE_AMORTIZATION_LIMIT`] times the original principal.
    CapitalizeInterest,
}

/// Mortgage contract plus the events that reshape it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub principal: Money,
    /// Nominal annual rate, compounded semi-annually (0.0549 = 5.49%).
    pub annual_rate: Rate,
    pub amortization_months: u32,
    #[serde(default)]
    pub frequency: PaymentFrequency,
    #[serde(default)]
    pub term_type: TermType,
    /// Date of the first payment.
    pub start_date: NaiveDate,
    #[serde(default)]
    pub prepayments: Vec<PrepaymentEvent>,
    #[serde(default)]
    pub renewals: Vec<TermRenewal>,
    #[serde(default)]
    pub rate_changes: Vec<RateChange>,
    /// Yearly prepayment allowance as a percentage of the original principal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prepayment_limit_percent: Option<Decimal>,
    /// Stop generating after this many years, counted in whole calendar
    /// months from the month of the first payment. Defaults to the longest
    /// contracted amortization plus a spare year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_years: Option<u32>,
    #[serde(default)]
    pub trigger_policy: TriggerPolicy,
}

impl ScheduleInput {
    /// Plain contract with no events.
    pub fn new(
        principal: Money,
        annual_rate: Rate,
        amortization_months: u32,
        frequency: PaymentFrequency,
        start_date: NaiveDate,
    ) -> Self {
        ScheduleInput {
            principal,
            annual_rate,
            amortization_months,
            frequency,
            term_type: TermType::Fixed,
            start_date,
            prepayments: Vec::new(),
            renewals: Vec::new(),
            rate_changes: Vec::new(),
            prepayment_limit_percent: None,
            horizon_years: None,
            trigger_policy: TriggerPolicy::Halt,
        }
    }

    /// Horizon in years, explicit or derived from the contracted
    /// amortizations (renewals can extend it) plus one year.
    pub fn effective_horizon_years(&self) -> u32 {
        if let Some(years) = self.horizon_years {
            return years.min(MAX_HORIZON_YEARS);
        }
        let mut months = Decimal::from(self.amortization_months);
        for renewal in &self.renewals {
            if let Some(amortization) = renewal.amortization_months {
                let elapsed = periods_to_months(
                    Decimal::from(renewal.effective_payment_number.saturating_sub(1)),
                    self.frequency,
                );
                months = months.max(elapsed + Decimal::from(amortization));
            }
        }
        // One spare year so a mid-month start never clips the last payment.
        let years = (months / dec!(12)).ceil().to_u32().unwrap_or(MAX_HORIZON_YEARS) + 1;
        years.clamp(1, MAX_HORIZON_YEARS)
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One ledger line. `remaining_balance` always equals the previous balance
/// less `principal_payment` and `extra_prepayment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_date: NaiveDate,
    pub payment_number: u32,
    pub payment_amount: Money,
    pub extra_prepayment: Money,
    pub principal_payment: Money,
    pub interest_payment: Money,
    pub remaining_balance: Money,
    pub annual_rate: Rate,
    pub term_type: TermType,
    pub frequency: PaymentFrequency,
    pub trigger_rate_hit: bool,
}

/// How generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    PaidOff,
    HorizonReached,
    TriggerRateHalted,
    /// Capitalized interest pushed the balance past the negative
    /// amortization limit.
    BalanceLimitReached,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub original_principal: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_prepayments: Money,
    pub total_paid: Money,
    pub payment_count: u32,
    pub initial_payment_amount: Money,
    pub payoff_payment_number: Option<u32>,
    pub payoff_date: Option<NaiveDate>,
    pub trigger_rate_hit_at: Option<u32>,
    pub final_balance: Money,
    pub status: ScheduleStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub payments: Vec<PaymentRecord>,
    pub summary: ScheduleSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate the contract and generate its amortization schedule.
pub fn generate_schedule(
    input: &ScheduleInput,
) -> HomeLedgerResult<ComputationOutput<AmortizationSchedule>> {
    let start = Instant::now();
    validate_schedule_input(input)?;

    let _span = tracing::debug_span!(
        "generate_schedule",
        principal = %input.principal,
        rate = %input.annual_rate,
        frequency = ?input.frequency,
    )
    .entered();

    let (schedule, warnings) = amortize(input);
    tracing::debug!(
        payments = schedule.payments.len(),
        status = ?schedule.summary.status,
        "schedule generated"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Amortization schedule (Canadian semi-annual compounding)",
        input,
        warnings,
        elapsed,
        schedule,
    ))
}

/// Generate the ledger for an already-validated contract.
///
/// Total over validated input: never panics, always terminates, and
/// produces identical output for identical input.
pub fn amortize(input: &ScheduleInput) -> (AmortizationSchedule, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();

    // The horizon spans whole calendar months from the month of the first
    // payment, matching the monthly buckets of a projection.
    let horizon_years = input.effective_horizon_years();
    let horizon_end = input
        .start_date
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(horizon_years * 12)));
    let max_payments = horizon_years * MAX_PAYMENTS_PER_YEAR + MAX_PAYMENTS_PER_YEAR;

    let mut renewals: Vec<&TermRenewal> = input.renewals.iter().collect();
    renewals.sort_by_key(|r| r.effective_payment_number);
    let mut rate_changes: Vec<&RateChange> = input.rate_changes.iter().collect();
    rate_changes.sort_by_key(|c| c.effective_payment_number);
    let mut next_renewal = 0usize;
    let mut next_rate_change = 0usize;

    let balance_limit = input.principal * NEGATIVE_AMORTIZATION_LIMIT;

    let mut calendar = PrepaymentCalendar::new(&input.prepayments);
    let mut prepaid_year: Option<(i32, Money)> = None;

    let mut term = ActiveTerm::originate(input);
    let mut balance = input.principal;
    let mut payments: Vec<PaymentRecord> = Vec::new();
    let mut status = ScheduleStatus::HorizonReached;
    let mut trigger_rate_hit_at: Option<u32> = None;

    for number in 1..=max_payments {
        while next_renewal < renewals.len()
            && renewals[next_renewal].effective_payment_number <= number
        {
            term.renew(renewals[next_renewal], number, balance);
            next_renewal += 1;
        }
        while next_rate_change < rate_changes.len()
            && rate_changes[next_rate_change].effective_payment_number <= number
        {
            if let Some(w) = term.change_rate(rate_changes[next_rate_change], number, balance) {
                warnings.push(w);
            }
            next_rate_change += 1;
        }

        let Some(payment_date) = term.payment_date(number) else {
            break;
        };
        if horizon_end.is_some_and(|end| payment_date >= end) {
            break;
        }

        let interest = calculate_interest_payment(balance, term.annual_rate, term.frequency);
        let scheduled_principal = calculate_principal_payment(term.payment, interest);
        let trigger_hit =
            term.term_type == TermType::VariableFixed && scheduled_principal <= Decimal::ZERO;

        let (mut principal, interest_applied) = if trigger_hit {
            if trigger_rate_hit_at.is_none() {
                trigger_rate_hit_at = Some(number);
                tracing::warn!(
                    payment_number = number,
                    rate = %term.annual_rate,
                    payment = %term.payment,
                    "variable-fixed payment no longer covers interest"
                );
                warnings.push(format!(
                    "Trigger rate reached at payment {number}: payment {} does not cover interest {} at {}",
                    term.payment.round_dp(2),
                    interest.round_dp(2),
                    term.annual_rate
                ));
            }
            match input.trigger_policy {
                TriggerPolicy::Halt => (Decimal::ZERO, term.payment),
                TriggerPolicy::CapitalizeInterest => (scheduled_principal, interest),
            }
        } else {
            (scheduled_principal.min(balance), interest)
        };

        // Prepayments, capped so they never overshoot the balance.
        let requested: Money = calendar.due(number, payment_date).into_iter().sum();
        let mut extra = requested.min((balance - principal).max(Decimal::ZERO));
        if extra > Decimal::ZERO {
            check_prepayment_limit(
                input,
                &mut prepaid_year,
                payment_date,
                number,
                extra,
                &mut warnings,
            );
        }

        // Fold rounding dust into the final payment.
        let mut balance_after = calculate_remaining_balance(balance, principal, extra);
        if balance_after > Decimal::ZERO && balance_after < BALANCE_EPSILON {
            if extra > Decimal::ZERO {
                extra += balance_after;
            } else {
                principal += balance_after;
            }
            balance_after = Decimal::ZERO;
        }

        let payment_amount = if trigger_hit || principal == scheduled_principal {
            term.payment
        } else {
            interest_applied + principal
        };

        balance = balance_after;

        payments.push(PaymentRecord {
            payment_date,
            payment_number: number,
            payment_amount,
            extra_prepayment: extra,
            principal_payment: principal,
            interest_payment: interest_applied,
            remaining_balance: balance,
            annual_rate: term.annual_rate,
            term_type: term.term_type,
            frequency: term.frequency,
            trigger_rate_hit: trigger_hit,
        });

        if balance.is_zero() {
            status = ScheduleStatus::PaidOff;
            break;
        }
        if trigger_hit && input.trigger_policy == TriggerPolicy::Halt {
            status = ScheduleStatus::TriggerRateHalted;
            break;
        }
        if balance > balance_limit {
            tracing::warn!(
                payment_number = number,
                balance = %balance,
                "negative amortization limit reached"
            );
            warnings.push(format!(
                "Balance {} at payment {number} exceeds {NEGATIVE_AMORTIZATION_LIMIT}x the original principal; generation stopped",
                balance.round_dp(2)
            ));
            status = ScheduleStatus::BalanceLimitReached;
            break;
        }
    }

    if status == ScheduleStatus::HorizonReached {
        tracing::debug!(horizon_years, balance = %balance, "horizon reached before payoff");
    }

    let summary = summarize(&payments, input, balance, status, trigger_rate_hit_at);
    (AmortizationSchedule { payments, summary }, warnings)
}

// ---------------------------------------------------------------------------
// Active term state
// ---------------------------------------------------------------------------

/// Contract in force for the current payment.
#[derive(Debug, Clone)]
struct ActiveTerm {
    annual_rate: Rate,
    term_type: TermType,
    frequency: PaymentFrequency,
    payment: Money,
    /// Payment number whose date is `anchor_date`.
    anchor_number: u32,
    anchor_date: NaiveDate,
    /// Contract months consumed before the anchor payment.
    months_at_anchor: Decimal,
    /// Month (from the first payment) the contracted amortization ends.
    amortization_end_month: Decimal,
}

impl ActiveTerm {
    fn originate(input: &ScheduleInput) -> Self {
        ActiveTerm {
            annual_rate: input.annual_rate,
            term_type: input.term_type,
            frequency: input.frequency,
            payment: calculate_payment(
                input.principal,
                input.annual_rate,
                input.amortization_months,
                input.frequency,
            ),
            anchor_number: 1,
            anchor_date: input.start_date,
            months_at_anchor: Decimal::ZERO,
            amortization_end_month: Decimal::from(input.amortization_months),
        }
    }

    fn payment_date(&self, number: u32) -> Option<NaiveDate> {
        advance_date(
            self.anchor_date,
            number.saturating_sub(self.anchor_number),
            self.frequency,
        )
    }

    fn months_elapsed(&self, number: u32) -> Decimal {
        self.months_at_anchor
            + periods_to_months(
                Decimal::from(number.saturating_sub(self.anchor_number)),
                self.frequency,
            )
    }

    /// Whole months left on the contracted amortization, at least one.
    fn remaining_months(&self, number: u32) -> u32 {
        let remaining = self.amortization_end_month - self.months_elapsed(number);
        remaining.round().to_u32().unwrap_or(1).max(1)
    }

    fn renew(&mut self, renewal: &TermRenewal, number: u32, balance: Money) {
        let elapsed = self.months_elapsed(number);
        let keeps_locked_payment = self.term_type == TermType::VariableFixed
            && renewal.term_type == TermType::VariableFixed
            && renewal.amortization_months.is_none()
            && renewal.frequency.is_none();

        if let Some(date) = self.payment_date(number) {
            self.anchor_date = date;
            self.anchor_number = number;
            self.months_at_anchor = elapsed;
        }
        if let Some(amortization) = renewal.amortization_months {
            self.amortization_end_month = elapsed + Decimal::from(amortization);
        }
        if let Some(frequency) = renewal.frequency {
            self.frequency = frequency;
        }
        self.annual_rate = renewal.annual_rate;
        self.term_type = renewal.term_type;

        if !keeps_locked_payment {
            self.payment = calculate_payment(
                balance,
                self.annual_rate,
                self.remaining_months(number),
                self.frequency,
            );
        }
        tracing::debug!(
            payment_number = number,
            rate = %self.annual_rate,
            term_type = ?self.term_type,
            payment = %self.payment,
            "term renewed"
        );
    }

    /// Apply a rate move inside the current term. Returns a warning when the
    /// term ignores it.
    fn change_rate(&mut self, change: &RateChange, number: u32, balance: Money) -> Option<String> {
        match self.term_type {
            TermType::Fixed => Some(format!(
                "Rate change at payment {} ignored: fixed-rate term",
                change.effective_payment_number
            )),
            TermType::VariableChanging => {
                self.annual_rate = change.annual_rate;
                self.payment = calculate_payment(
                    balance,
                    self.annual_rate,
                    self.remaining_months(number),
                    self.frequency,
                );
                None
            }
            TermType::VariableFixed => {
                self.annual_rate = change.annual_rate;
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_prepayment_limit(
    input: &ScheduleInput,
    prepaid_year: &mut Option<(i32, Money)>,
    payment_date: NaiveDate,
    number: u32,
    amount: Money,
    warnings: &mut Vec<String>,
) {
    let year = payment_date.year();
    let year_to_date = match *prepaid_year {
        Some((y, total)) if y == year => total,
        _ => Decimal::ZERO,
    };

    if let Some(limit) = input.prepayment_limit_percent {
        if !is_within_prepayment_limit(amount, year_to_date, input.principal, limit) {
            tracing::warn!(
                payment_number = number,
                year,
                amount = %amount,
                "prepayment exceeds yearly allowance"
            );
            warnings.push(format!(
                "Prepayment of {} at payment {number} brings {year} prepayments to {}, above the {limit}% allowance of {}",
                amount.round_dp(2),
                (year_to_date + amount).round_dp(2),
                (input.principal * limit / dec!(100)).round_dp(2)
            ));
        }
    }

    *prepaid_year = Some((year, year_to_date + amount));
}

fn summarize(
    payments: &[PaymentRecord],
    input: &ScheduleInput,
    final_balance: Money,
    status: ScheduleStatus,
    trigger_rate_hit_at: Option<u32>,
) -> ScheduleSummary {
    let total_interest: Money = payments.iter().map(|p| p.interest_payment).sum();
    let total_principal: Money = payments.iter().map(|p| p.principal_payment).sum();
    let total_prepayments: Money = payments.iter().map(|p| p.extra_prepayment).sum();
    let total_paid: Money = payments
        .iter()
        .map(|p| p.payment_amount + p.extra_prepayment)
        .sum();

    let payoff = if status == ScheduleStatus::PaidOff {
        payments.last()
    } else {
        None
    };

    ScheduleSummary {
        original_principal: input.principal,
        total_interest,
        total_principal,
        total_prepayments,
        total_paid,
        payment_count: payments.len() as u32,
        initial_payment_amount: payments
            .first()
            .map(|p| p.payment_amount)
            .unwrap_or_else(|| {
                calculate_payment(
                    input.principal,
                    input.annual_rate,
                    input.amortization_months,
                    input.frequency,
                )
            }),
        payoff_payment_number: payoff.map(|p| p.payment_number),
        payoff_date: payoff.map(|p| p.payment_date),
        trigger_rate_hit_at,
        final_balance,
        status,
    }
}

fn validate_rate(field: &str, rate: Rate) -> HomeLedgerResult<()> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(HomeLedgerError::invalid(
            field,
            "Annual rate must be in [0, 1) (e.g. 0.0549 for 5.49%)",
        ));
    }
    Ok(())
}

fn validate_amortization(field: &str, months: u32) -> HomeLedgerResult<()> {
    if months == 0 || months > MAX_AMORTIZATION_MONTHS {
        return Err(HomeLedgerError::invalid(
            field,
            format!("Amortization must be between 1 and {MAX_AMORTIZATION_MONTHS} months"),
        ));
    }
    Ok(())
}

/// Boundary checks; the generator assumes these hold.
pub fn validate_schedule_input(input: &ScheduleInput) -> HomeLedgerResult<()> {
    if input.principal <= Decimal::ZERO || input.principal > MAX_AMOUNT {
        return Err(HomeLedgerError::invalid(
            "principal",
            format!("Principal must be positive and at most {MAX_AMOUNT}"),
        ));
    }
    validate_rate("annual_rate", input.annual_rate)?;
    validate_amortization("amortization_months", input.amortization_months)?;

    if let Some(years) = input.horizon_years {
        if years == 0 || years > MAX_HORIZON_YEARS {
            return Err(HomeLedgerError::invalid(
                "horizon_years",
                format!("Horizon must be between 1 and {MAX_HORIZON_YEARS} years"),
            ));
        }
    }
    if let Some(limit) = input.prepayment_limit_percent {
        if limit < Decimal::ZERO || limit > dec!(100) {
            return Err(HomeLedgerError::invalid(
                "prepayment_limit_percent",
                "Prepayment limit must be between 0 and 100 percent",
            ));
        }
    }

    for (i, event) in input.prepayments.iter().enumerate() {
        if event.amount < Decimal::ZERO || event.amount > MAX_AMOUNT {
            return Err(HomeLedgerError::invalid(
                format!("prepayments[{i}].amount"),
                format!("Prepayment amount must be between 0 and {MAX_AMOUNT}"),
            ));
        }
        if event.start_payment_number == 0 {
            return Err(HomeLedgerError::invalid(
                format!("prepayments[{i}].start_payment_number"),
                "Payment numbers start at 1",
            ));
        }
        if let Some(month) = event.recurrence_month {
            if !(1..=12).contains(&month) {
                return Err(HomeLedgerError::invalid(
                    format!("prepayments[{i}].recurrence_month"),
                    "Recurrence month must be between 1 and 12",
                ));
            }
        }
        if event.kind == PrepaymentKind::OneTime && event.recurrence_month.is_some() {
            tracing::debug!(index = i, "recurrence_month ignored on one-time prepayment");
        }
    }

    for (i, renewal) in input.renewals.iter().enumerate() {
        if renewal.effective_payment_number == 0 {
            return Err(HomeLedgerError::invalid(
                format!("renewals[{i}].effective_payment_number"),
                "Payment numbers start at 1",
            ));
        }
        validate_rate(&format!("renewals[{i}].annual_rate"), renewal.annual_rate)?;
        if let Some(months) = renewal.amortization_months {
            validate_amortization(&format!("renewals[{i}].amortization_months"), months)?;
        }
    }

    for (i, change) in input.rate_changes.iter().enumerate() {
        if change.effective_payment_number == 0 {
            return Err(HomeLedgerError::invalid(
                format!("rate_changes[{i}].effective_payment_number"),
                "Payment numbers start at 1",
            ));
        }
        validate_rate(&format!("rate_changes[{i}].annual_rate"), change.annual_rate)?;
    }

    Ok(())
}
