//! Month-by-month household net-worth projection around a mortgage.
//!
//! Each calendar month takes income, subtracts living expenses and whatever
//! the amortization ledger charged that month, then routes the surplus:
//! first into the emergency fund until its target is met, then a fixed
//! share into investments, with the remainder (or the shortfall) landing in
//! a signed cash bucket.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::HomeLedgerError;
use crate::projection::aggregate::{monthly_mortgage_totals, yearly_rollup};
use crate::schedule::amortization::{validate_schedule_input, MAX_HORIZON_YEARS};
use crate::schedule::{amortize, AmortizationSchedule, ScheduleInput, ScheduleStatus, ScheduleSummary};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, MAX_AMOUNT};
use crate::HomeLedgerResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// How investment returns are credited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompoundingMode {
    /// `annual / 12` on the running balance every month.
    #[default]
    Monthly,
    /// `annual / 12` on the balance held at the start of the projection
    /// year; money added during the year earns from the next year on.
    Annual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyFundInput {
    pub target: Money,
    #[serde(default)]
    pub starting_balance: Money,
    /// Planned monthly top-up while the target is not met.
    #[serde(default)]
    pub monthly_contribution: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentInput {
    #[serde(default)]
    pub starting_balance: Money,
    /// Share (0-100) of the surplus left after the emergency fund that is
    /// invested once the fund target is met.
    pub monthly_contribution_percent: Decimal,
    pub expected_annual_return: Rate,
    #[serde(default)]
    pub compounding: CompoundingMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    pub mortgage: ScheduleInput,
    pub projection_years: u32,
    pub monthly_income: Money,
    pub monthly_expenses: Money,
    pub emergency_fund: EmergencyFundInput,
    pub investment: InvestmentInput,
    /// Opening cash; negative means consumer debt.
    #[serde(default)]
    pub starting_cash: Money,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// State of the household at the end of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
    /// 1-based month number.
    pub month: u32,
    /// First day of the calendar month.
    pub date: NaiveDate,
    pub year: u32,
    pub income: Money,
    pub expenses: Money,
    pub mortgage_payment_count: u32,
    pub mortgage_payment: Money,
    pub mortgage_principal: Money,
    pub mortgage_interest: Money,
    pub mortgage_prepayment: Money,
    pub mortgage_balance: Money,
    /// Income less expenses and mortgage outflow; may be negative.
    pub raw_surplus: Money,
    pub emergency_fund_contribution: Money,
    pub emergency_fund_balance: Money,
    pub emergency_fund_target_met: bool,
    pub investment_contribution: Money,
    pub investment_return: Money,
    pub investment_balance: Money,
    /// Surplus left after the fund and investments (signed).
    pub cash_flow: Money,
    pub cash_balance: Money,
    pub net_worth: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProjection {
    pub year: u32,
    pub months: u32,
    pub total_mortgage_payments: Money,
    pub total_principal: Money,
    pub total_interest: Money,
    pub total_prepayments: Money,
    pub total_emergency_fund_contributions: Money,
    pub total_investment_contributions: Money,
    pub investment_returns: Money,
    pub average_monthly_surplus: Money,
    pub mortgage_balance: Money,
    pub emergency_fund_balance: Money,
    pub investment_balance: Money,
    pub cash_balance: Money,
    pub net_worth: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub months: u32,
    pub initial_net_worth: Money,
    pub final_net_worth: Money,
    /// First month ending with the mortgage fully repaid.
    pub payoff_month: Option<u32>,
    pub total_interest: Money,
    pub total_investment_returns: Money,
    pub average_monthly_net_worth_growth: Money,
    /// Month the fund target was first met; 0 when already met at the start.
    pub emergency_fund_target_met_month: Option<u32>,
    pub final_mortgage_balance: Money,
    pub final_investment_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorthProjection {
    pub monthly: Vec<MonthlyProjection>,
    pub yearly: Vec<YearlyProjection>,
    pub summary: ProjectionSummary,
    pub mortgage: ScheduleSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate, amortize the mortgage over the projection window and simulate
/// the household month by month.
pub fn project_net_worth(
    input: &ProjectionInput,
) -> HomeLedgerResult<ComputationOutput<NetWorthProjection>> {
    let start = Instant::now();
    validate_projection_input(input)?;

    let _span = tracing::debug_span!(
        "project_net_worth",
        years = input.projection_years,
        income = %input.monthly_income,
        expenses = %input.monthly_expenses,
    )
    .entered();

    let (schedule, mut warnings) = amortize(&schedule_for(input));
    let (projection, sim_warnings) = simulate(input, &schedule);
    warnings.extend(sim_warnings);

    tracing::debug!(
        final_net_worth = %projection.summary.final_net_worth,
        payoff_month = ?projection.summary.payoff_month,
        "projection complete"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly net-worth projection (emergency fund first, then investments)",
        input,
        warnings,
        elapsed,
        projection,
    ))
}

/// Mortgage contract clipped to the projection window.
pub fn schedule_for(input: &ProjectionInput) -> ScheduleInput {
    let mut mortgage = input.mortgage.clone();
    mortgage.horizon_years = Some(input.projection_years);
    mortgage
}

/// Run the monthly simulation against an already generated ledger.
///
/// Pure: the same input and ledger always give the same projection.
pub fn simulate(
    input: &ProjectionInput,
    schedule: &AmortizationSchedule,
) -> (NetWorthProjection, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let months = input.projection_years * 12;
    let first_month = input
        .mortgage
        .start_date
        .with_day(1)
        .unwrap_or(input.mortgage.start_date);
    let buckets = monthly_mortgage_totals(schedule, first_month, months);

    let ef = &input.emergency_fund;
    let inv = &input.investment;
    let monthly_return = inv.expected_annual_return / dec!(12);
    let invest_share = inv.monthly_contribution_percent / dec!(100);

    let mut mortgage_balance = schedule.summary.original_principal;
    let mut ef_balance = ef.starting_balance;
    let mut ef_met = ef_balance >= ef.target;
    let mut ef_met_month = if ef_met { Some(0) } else { None };
    let mut investment_balance = inv.starting_balance;
    let mut year_opening_investment = investment_balance;
    let mut cash = input.starting_cash;
    let mut shortfall_month: Option<u32> = None;

    let initial_net_worth = net_worth(ef_balance, investment_balance, cash, mortgage_balance);
    let mut monthly: Vec<MonthlyProjection> = Vec::with_capacity(months as usize);

    for (idx, bucket) in buckets.iter().enumerate() {
        let month = idx as u32 + 1;
        if idx % 12 == 0 {
            year_opening_investment = investment_balance;
        }
        if let Some(balance) = bucket.closing_balance {
            mortgage_balance = balance;
        }

        let raw_surplus = input.monthly_income - input.monthly_expenses - bucket.outflow();
        let available = raw_surplus.max(Decimal::ZERO);

        let ef_contribution = if ef_met {
            Decimal::ZERO
        } else {
            ef.monthly_contribution
                .min(ef.target - ef_balance)
                .min(available)
                .max(Decimal::ZERO)
        };
        ef_balance += ef_contribution;
        if !ef_met && ef_balance >= ef.target {
            ef_met = true;
            ef_met_month = Some(month);
        }

        let investment_contribution = if ef_met {
            (available - ef_contribution) * invest_share
        } else {
            Decimal::ZERO
        };
        investment_balance += investment_contribution;

        let investment_return = match inv.compounding {
            CompoundingMode::Monthly => investment_balance * monthly_return,
            CompoundingMode::Annual => year_opening_investment * monthly_return,
        };
        investment_balance += investment_return;

        let cash_flow = raw_surplus - ef_contribution - investment_contribution;
        cash += cash_flow;
        if cash < Decimal::ZERO && shortfall_month.is_none() {
            shortfall_month = Some(month);
        }

        let date = first_month
            .checked_add_months(Months::new(idx as u32))
            .unwrap_or(first_month);

        monthly.push(MonthlyProjection {
            month,
            date,
            year: idx as u32 / 12 + 1,
            income: input.monthly_income,
            expenses: input.monthly_expenses,
            mortgage_payment_count: bucket.payment_count,
            mortgage_payment: bucket.payment,
            mortgage_principal: bucket.principal,
            mortgage_interest: bucket.interest,
            mortgage_prepayment: bucket.prepayment,
            mortgage_balance,
            raw_surplus,
            emergency_fund_contribution: ef_contribution,
            emergency_fund_balance: ef_balance,
            emergency_fund_target_met: ef_met,
            investment_contribution,
            investment_return,
            investment_balance,
            cash_flow,
            cash_balance: cash,
            net_worth: net_worth(ef_balance, investment_balance, cash, mortgage_balance),
        });
    }

    if let Some(month) = shortfall_month {
        warnings.push(format!(
            "Cash balance turns negative in month {month}; shortfall is carried as unfunded debt"
        ));
    }
    match schedule.summary.status {
        ScheduleStatus::TriggerRateHalted => warnings.push(
            "Mortgage ledger stopped at the trigger rate; the balance is held flat and no further payments are projected".into(),
        ),
        ScheduleStatus::BalanceLimitReached => warnings.push(
            "Mortgage ledger stopped at the negative amortization limit; the balance is held flat and no further payments are projected".into(),
        ),
        ScheduleStatus::PaidOff | ScheduleStatus::HorizonReached => {}
    }

    let yearly = yearly_rollup(&monthly);
    let final_net_worth = monthly.last().map(|m| m.net_worth).unwrap_or(initial_net_worth);
    let summary = ProjectionSummary {
        months,
        initial_net_worth,
        final_net_worth,
        payoff_month: monthly
            .iter()
            .find(|m| m.mortgage_balance.is_zero())
            .map(|m| m.month),
        total_interest: schedule.summary.total_interest,
        total_investment_returns: yearly.iter().map(|y| y.investment_returns).sum(),
        average_monthly_net_worth_growth: if months == 0 {
            Decimal::ZERO
        } else {
            (final_net_worth - initial_net_worth) / Decimal::from(months)
        },
        emergency_fund_target_met_month: ef_met_month,
        final_mortgage_balance: mortgage_balance,
        final_investment_balance: investment_balance,
    };

    (
        NetWorthProjection {
            monthly,
            yearly,
            summary,
            mortgage: schedule.summary.clone(),
        },
        warnings,
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Assets less liabilities; a negative cash bucket counts as a liability.
fn net_worth(ef: Money, investments: Money, cash: Money, mortgage: Money) -> Money {
    let assets = ef + investments + cash.max(Decimal::ZERO);
    let liabilities = mortgage + (-cash).max(Decimal::ZERO);
    assets - liabilities
}

/// Highest expected annual return accepted. Keeps a century of monthly
/// compounding inside `Decimal` range.
const MAX_EXPECTED_RETURN: Rate = dec!(0.25);

fn require_non_negative(field: &str, value: Money) -> HomeLedgerResult<()> {
    if value < Decimal::ZERO || value > MAX_AMOUNT {
        return Err(HomeLedgerError::invalid(
            field,
            format!("Value must be between 0 and {MAX_AMOUNT}"),
        ));
    }
    Ok(())
}

pub fn validate_projection_input(input: &ProjectionInput) -> HomeLedgerResult<()> {
    validate_schedule_input(&input.mortgage)?;

    if input.projection_years == 0 || input.projection_years > MAX_HORIZON_YEARS {
        return Err(HomeLedgerError::invalid(
            "projection_years",
            format!("Projection must run between 1 and {MAX_HORIZON_YEARS} years"),
        ));
    }
    require_non_negative("monthly_income", input.monthly_income)?;
    require_non_negative("monthly_expenses", input.monthly_expenses)?;
    require_non_negative("emergency_fund.target", input.emergency_fund.target)?;
    require_non_negative(
        "emergency_fund.starting_balance",
        input.emergency_fund.starting_balance,
    )?;
    require_non_negative(
        "emergency_fund.monthly_contribution",
        input.emergency_fund.monthly_contribution,
    )?;
    require_non_negative("investment.starting_balance", input.investment.starting_balance)?;

    let pct = input.investment.monthly_contribution_percent;
    if pct < Decimal::ZERO || pct > dec!(100) {
        return Err(HomeLedgerError::invalid(
            "investment.monthly_contribution_percent",
            "Investment share must be between 0 and 100 percent",
        ));
    }
    let ret = input.investment.expected_annual_return;
    if ret <= dec!(-1) || ret > MAX_EXPECTED_RETURN {
        return Err(HomeLedgerError::invalid(
            "investment.expected_annual_return",
            format!("Expected return must be in (-1, {MAX_EXPECTED_RETURN}] (e.g. 0.06 for 6%)"),
        ));
    }
    if input.starting_cash.abs() > MAX_AMOUNT {
        return Err(HomeLedgerError::invalid(
            "starting_cash",
            format!("Starting cash must be within {MAX_AMOUNT} of zero"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentFrequency;

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    fn household() -> ProjectionInput {
        ProjectionInput {
            mortgage: ScheduleInput::new(
                dec!(400000),
                dec!(0.05),
                300,
                PaymentFrequency::Monthly,
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            ),
            projection_years: 5,
            monthly_income: dec!(9000),
            monthly_expenses: dec!(4000),
            emergency_fund: EmergencyFundInput {
                target: dec!(20000),
                starting_balance: dec!(5000),
                monthly_contribution: dec!(1000),
            },
            investment: InvestmentInput {
                starting_balance: dec!(10000),
                monthly_contribution_percent: dec!(50),
                expected_annual_return: dec!(0.06),
                compounding: CompoundingMode::Monthly,
            },
            starting_cash: Decimal::ZERO,
        }
    }

    fn run(input: &ProjectionInput) -> NetWorthProjection {
        project_net_worth(input).unwrap().result
    }

    #[test]
    fn test_month_and_year_counts() {
        let p = run(&household());
        assert_eq!(p.monthly.len(), 60);
        assert_eq!(p.yearly.len(), 5);
        assert!(p.yearly.iter().all(|y| y.months == 12));
        assert_eq!(p.monthly[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(p.monthly[13].year, 2);
    }

    #[test]
    fn test_emergency_fund_fills_before_investing() {
        let p = run(&household());
        // 15,000 short at 1,000 a month: met at the end of month 15.
        assert_eq!(p.summary.emergency_fund_target_met_month, Some(15));
        for m in &p.monthly[..14] {
            assert!(!m.emergency_fund_target_met);
            assert_eq!(m.investment_contribution, Decimal::ZERO);
        }
        let m15 = &p.monthly[14];
        assert!(m15.emergency_fund_target_met);
        assert_eq!(m15.emergency_fund_balance, dec!(20000));
        assert_eq!(
            m15.investment_contribution,
            (m15.raw_surplus - dec!(1000)) * dec!(0.5)
        );
        for m in &p.monthly[15..] {
            assert_eq!(m.emergency_fund_contribution, Decimal::ZERO);
            assert!(m.emergency_fund_target_met);
        }
    }

    #[test]
    fn test_cash_flow_conservation() {
        let p = run(&household());
        for m in &p.monthly {
            assert_close(
                m.emergency_fund_contribution + m.investment_contribution + m.cash_flow,
                m.raw_surplus,
                dec!(0.000001),
                &format!("surplus routing in month {}", m.month),
            );
        }
    }

    #[test]
    fn test_net_worth_identity() {
        let p = run(&household());
        for m in &p.monthly {
            let expected = m.emergency_fund_balance + m.investment_balance
                + m.cash_balance.max(Decimal::ZERO)
                - m.mortgage_balance
                - (-m.cash_balance).max(Decimal::ZERO);
            assert_close(m.net_worth, expected, dec!(0.000001), "net worth");
        }
    }

    #[test]
    fn test_annual_compounding_uses_year_opening_balance() {
        let mut input = household();
        input.investment.compounding = CompoundingMode::Annual;
        let p = run(&input);
        // Year one earns on the opening 10,000 only.
        for m in &p.monthly[..12] {
            assert_eq!(m.investment_return, dec!(50));
        }
        let opening_year_two = p.monthly[11].investment_balance;
        assert_eq!(p.monthly[12].investment_return, opening_year_two * dec!(0.005));
    }

    #[test]
    fn test_monthly_compounding_beats_annual() {
        let monthly = run(&household());
        let mut input = household();
        input.investment.compounding = CompoundingMode::Annual;
        let annual = run(&input);
        assert!(
            monthly.summary.final_investment_balance > annual.summary.final_investment_balance
        );
    }

    #[test]
    fn test_shortfall_accumulates_as_debt() {
        let mut input = household();
        input.monthly_income = dec!(5000);
        input.monthly_expenses = dec!(4000);
        let out = project_net_worth(&input).unwrap();
        let p = &out.result;
        assert!(p.monthly[0].raw_surplus < Decimal::ZERO);
        assert_eq!(p.monthly[0].emergency_fund_contribution, Decimal::ZERO);
        assert!(p.summary.emergency_fund_target_met_month.is_none());
        assert!(p.monthly.last().unwrap().cash_balance < Decimal::ZERO);
        assert!(out.warnings.iter().any(|w| w.contains("month 1")));
    }

    #[test]
    fn test_payoff_month_reported() {
        let mut input = household();
        input.mortgage.amortization_months = 36;
        let p = run(&input);
        assert_eq!(p.summary.payoff_month, Some(36));
        assert_eq!(p.monthly[36].mortgage_payment, Decimal::ZERO);
        assert_eq!(p.monthly[40].mortgage_balance, Decimal::ZERO);
    }

    #[test]
    fn test_not_paid_off_within_window() {
        let p = run(&household());
        assert!(p.summary.payoff_month.is_none());
        assert_eq!(p.summary.total_interest, p.mortgage.total_interest);
        assert_eq!(p.mortgage.payment_count, 60);
    }

    #[test]
    fn test_starting_fund_at_target_invests_immediately() {
        let mut input = household();
        input.emergency_fund.starting_balance = dec!(20000);
        let p = run(&input);
        assert_eq!(p.summary.emergency_fund_target_met_month, Some(0));
        assert!(p.monthly[0].investment_contribution > Decimal::ZERO);
    }

    #[test]
    fn test_summary_growth_average() {
        let p = run(&household());
        assert_close(
            p.summary.average_monthly_net_worth_growth * dec!(60),
            p.summary.final_net_worth - p.summary.initial_net_worth,
            dec!(0.000001),
            "growth",
        );
        assert_close(
            p.summary.total_investment_returns,
            p.monthly.iter().map(|m| m.investment_return).sum::<Decimal>(),
            dec!(0.000001),
            "investment returns",
        );
    }

    #[test]
    fn test_validation() {
        let mut input = household();
        input.projection_years = 0;
        assert!(project_net_worth(&input).is_err());

        let mut input = household();
        input.investment.monthly_contribution_percent = dec!(120);
        assert!(project_net_worth(&input).is_err());

        let mut input = household();
        input.monthly_expenses = dec!(-1);
        assert!(project_net_worth(&input).is_err());

        let mut input = household();
        input.investment.expected_annual_return = dec!(0.5);
        assert!(project_net_worth(&input).is_err());

        let mut input = household();
        input.monthly_income = MAX_AMOUNT + Decimal::ONE;
        assert!(project_net_worth(&input).is_err());
    }

    #[test]
    fn test_century_at_the_bounds_stays_in_range() {
        let mut input = household();
        input.projection_years = MAX_HORIZON_YEARS;
        input.monthly_income = MAX_AMOUNT;
        input.investment.starting_balance = MAX_AMOUNT;
        input.investment.monthly_contribution_percent = dec!(100);
        input.investment.expected_annual_return = MAX_EXPECTED_RETURN;
        let p = run(&input);
        assert_eq!(p.monthly.len(), 1200);
        assert!(p.summary.final_investment_balance > MAX_AMOUNT);
    }
}
