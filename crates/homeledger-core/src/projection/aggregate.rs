//! Calendar bucketing of the payment ledger and yearly roll-ups of the
//! monthly simulation.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::schedule::AmortizationSchedule;
use crate::types::Money;

use super::net_worth::{MonthlyProjection, YearlyProjection};

/// Mortgage activity inside one calendar month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MortgageMonth {
    pub payment_count: u32,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub prepayment: Money,
    /// Balance after the last payment of the month, if any fell in it.
    pub closing_balance: Option<Money>,
}

impl MortgageMonth {
    /// Cash leaving the household for the mortgage: payments plus prepayments.
    pub fn outflow(&self) -> Money {
        self.payment + self.prepayment
    }
}

/// Months between the first day of `first_month` and `date`, or `None` when
/// `date` is earlier.
fn month_offset(first_month: NaiveDate, date: NaiveDate) -> Option<u32> {
    let offset = (date.year() - first_month.year()) * 12 + date.month() as i32
        - first_month.month() as i32;
    u32::try_from(offset).ok()
}

/// Sum every payment of the ledger into `months` calendar buckets starting at
/// `first_month`. Weekly and biweekly cadences put several payments in one
/// bucket; months without a payment stay empty.
pub fn monthly_mortgage_totals(
    schedule: &AmortizationSchedule,
    first_month: NaiveDate,
    months: u32,
) -> Vec<MortgageMonth> {
    let mut buckets = vec![MortgageMonth::default(); months as usize];
    for record in &schedule.payments {
        let Some(idx) = month_offset(first_month, record.payment_date) else {
            continue;
        };
        let Some(bucket) = buckets.get_mut(idx as usize) else {
            continue;
        };
        bucket.payment_count += 1;
        bucket.payment += record.payment_amount;
        bucket.principal += record.principal_payment;
        bucket.interest += record.interest_payment;
        bucket.prepayment += record.extra_prepayment;
        bucket.closing_balance = Some(record.remaining_balance);
    }
    buckets
}

/// Roll the monthly stream up into years of twelve months; a trailing
/// partial year gets its own entry.
pub fn yearly_rollup(monthly: &[MonthlyProjection]) -> Vec<YearlyProjection> {
    monthly
        .chunks(12)
        .enumerate()
        .filter_map(|(idx, chunk)| {
            let last = chunk.last()?;
            let count = Decimal::from(chunk.len() as u64);
            let total_surplus: Money = chunk.iter().map(|m| m.raw_surplus).sum();
            Some(YearlyProjection {
                year: idx as u32 + 1,
                months: chunk.len() as u32,
                total_mortgage_payments: chunk.iter().map(|m| m.mortgage_payment).sum(),
                total_principal: chunk.iter().map(|m| m.mortgage_principal).sum(),
                total_interest: chunk.iter().map(|m| m.mortgage_interest).sum(),
                total_prepayments: chunk.iter().map(|m| m.mortgage_prepayment).sum(),
                total_emergency_fund_contributions: chunk
                    .iter()
                    .map(|m| m.emergency_fund_contribution)
                    .sum(),
                total_investment_contributions: chunk
                    .iter()
                    .map(|m| m.investment_contribution)
                    .sum(),
                investment_returns: chunk.iter().map(|m| m.investment_return).sum(),
                average_monthly_surplus: total_surplus / count,
                mortgage_balance: last.mortgage_balance,
                emergency_fund_balance: last.emergency_fund_balance,
                investment_balance: last.investment_balance,
                cash_balance: last.cash_balance,
                net_worth: last.net_worth,
            })
        })
        .collect()
}
