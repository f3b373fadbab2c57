//! Events that reshape a schedule while it runs: prepayments, term renewals
//! and mid-term rate moves, plus the payment-date calendar.

use chrono::{Datelike, Days, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, PaymentFrequency, Rate, TermType};

/// Recurrence of a prepayment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrepaymentKind {
    /// Once per calendar year, in `recurrence_month`.
    Annual,
    /// Exactly once, at `start_payment_number`.
    OneTime,
}

/// A lump-sum prepayment on top of the regular payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepaymentEvent {
    pub kind: PrepaymentKind,
    pub amount: Money,
    pub start_payment_number: u32,
    /// Calendar month (1-12) an annual prepayment recurs in. Defaults to the
    /// month of the start payment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_month: Option<u32>,
}

impl PrepaymentEvent {
    pub fn annual(amount: Money, start_payment_number: u32, recurrence_month: u32) -> Self {
        PrepaymentEvent {
            kind: PrepaymentKind::Annual,
            amount,
            start_payment_number,
            recurrence_month: Some(recurrence_month),
        }
    }

    pub fn one_time(amount: Money, payment_number: u32) -> Self {
        PrepaymentEvent {
            kind: PrepaymentKind::OneTime,
            amount,
            start_payment_number: payment_number,
            recurrence_month: None,
        }
    }

    /// Stateless match of this event against a payment. Annual events match
    /// every payment in the recurrence month; the once-per-year rule is
    /// enforced by [`PrepaymentCalendar`].
    pub fn applies_to(&self, payment_number: u32, payment_date: NaiveDate) -> bool {
        match self.kind {
            PrepaymentKind::OneTime => payment_number == self.start_payment_number,
            PrepaymentKind::Annual => {
                payment_number >= self.start_payment_number
                    && self
                        .recurrence_month
                        .map_or(true, |month| payment_date.month() == month)
            }
        }
    }
}

/// Mid-schedule renegotiation applied at the start of
/// `effective_payment_number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermRenewal {
    pub effective_payment_number: u32,
    pub annual_rate: Rate,
    pub term_type: TermType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amortization_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<PaymentFrequency>,
}

/// Movement of the nominal rate inside the active term (prime moves).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateChange {
    pub effective_payment_number: u32,
    pub annual_rate: Rate,
}

/// Date of the payment `periods` cadence steps after `anchor`.
///
/// Monthly steps count calendar months from the anchor so day-of-month
/// clamping never accumulates; semi-monthly pays on the anchor day and 15
/// days later each month.
pub fn advance_date(anchor: NaiveDate, periods: u32, frequency: PaymentFrequency) -> Option<NaiveDate> {
    match frequency {
        PaymentFrequency::Monthly => anchor.checked_add_months(Months::new(periods)),
        PaymentFrequency::SemiMonthly => {
            let month_start = anchor.checked_add_months(Months::new(periods / 2))?;
            if periods % 2 == 1 {
                month_start.checked_add_days(Days::new(15))
            } else {
                Some(month_start)
            }
        }
        PaymentFrequency::Biweekly | PaymentFrequency::AcceleratedBiweekly => {
            anchor.checked_add_days(Days::new(14 * u64::from(periods)))
        }
        PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => {
            anchor.checked_add_days(Days::new(7 * u64::from(periods)))
        }
    }
}

/// Tracks which prepayments have fired. Annual events fire at most once per
/// calendar year even when several payments fall in the recurrence month.
#[derive(Debug)]
pub(crate) struct PrepaymentCalendar<'a> {
    events: &'a [PrepaymentEvent],
    resolved_months: Vec<Option<u32>>,
    last_fired_year: Vec<Option<i32>>,
}

impl<'a> PrepaymentCalendar<'a> {
    pub(crate) fn new(events: &'a [PrepaymentEvent]) -> Self {
        PrepaymentCalendar {
            events,
            resolved_months: events.iter().map(|e| e.recurrence_month).collect(),
            last_fired_year: vec![None; events.len()],
        }
    }

    /// Amounts of every event due on this payment, in declaration order.
    pub(crate) fn due(&mut self, payment_number: u32, payment_date: NaiveDate) -> Vec<Money> {
        let mut amounts = Vec::new();
        for (idx, event) in self.events.iter().enumerate() {
            if event.amount <= Decimal::ZERO {
                continue;
            }
            match event.kind {
                PrepaymentKind::OneTime => {
                    if event.applies_to(payment_number, payment_date) {
                        amounts.push(event.amount);
                    }
                }
                PrepaymentKind::Annual => {
                    if payment_number < event.start_payment_number {
                        continue;
                    }
                    let month = *self.resolved_months[idx].get_or_insert(payment_date.month());
                    let year = payment_date.year();
                    if payment_date.month() == month && self.last_fired_year[idx] != Some(year) {
                        self.last_fired_year[idx] = Some(year);
                        amounts.push(event.amount);
                    }
                }
            }
        }
        amounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_dates_do_not_drift() {
        let anchor = date(2024, 1, 31);
        assert_eq!(
            advance_date(anchor, 1, PaymentFrequency::Monthly),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            advance_date(anchor, 2, PaymentFrequency::Monthly),
            Some(date(2024, 3, 31))
        );
    }

    #[test]
    fn test_semi_monthly_dates() {
        let anchor = date(2024, 1, 1);
        assert_eq!(
            advance_date(anchor, 1, PaymentFrequency::SemiMonthly),
            Some(date(2024, 1, 16))
        );
        assert_eq!(
            advance_date(anchor, 2, PaymentFrequency::SemiMonthly),
            Some(date(2024, 2, 1))
        );
    }

    #[test]
    fn test_weekly_and_biweekly_dates() {
        let anchor = date(2024, 1, 1);
        assert_eq!(
            advance_date(anchor, 2, PaymentFrequency::AcceleratedBiweekly),
            Some(date(2024, 1, 29))
        );
        assert_eq!(
            advance_date(anchor, 3, PaymentFrequency::Weekly),
            Some(date(2024, 1, 22))
        );
    }

    #[test]
    fn test_one_time_matches_exact_number() {
        let event = PrepaymentEvent::one_time(dec!(10000), 24);
        assert!(event.applies_to(24, date(2026, 1, 1)));
        assert!(!event.applies_to(23, date(2025, 12, 1)));
        assert!(!event.applies_to(25, date(2026, 2, 1)));
    }

    #[test]
    fn test_annual_fires_once_per_year_for_weekly_cadence() {
        let events = vec![PrepaymentEvent::annual(dec!(5000), 1, 3)];
        let mut calendar = PrepaymentCalendar::new(&events);
        let anchor = date(2024, 1, 1);
        let mut fired = 0;
        for n in 1..=104u32 {
            let d = advance_date(anchor, n - 1, PaymentFrequency::Weekly).unwrap();
            fired += calendar.due(n, d).len();
        }
        assert_eq!(fired, 2);
    }

    #[test]
    fn test_annual_without_month_uses_start_payment_month() {
        let events = vec![PrepaymentEvent {
            kind: PrepaymentKind::Annual,
            amount: dec!(1000),
            start_payment_number: 6,
            recurrence_month: None,
        }];
        let mut calendar = PrepaymentCalendar::new(&events);
        let anchor = date(2024, 1, 15);
        let hits: Vec<u32> = (1..=30u32)
            .filter(|n| {
                let d = advance_date(anchor, n - 1, PaymentFrequency::Monthly).unwrap();
                !calendar.due(*n, d).is_empty()
            })
            .collect();
        assert_eq!(hits, vec![6, 18, 30]);
    }

    #[test]
    fn test_zero_amount_events_never_fire() {
        let events = vec![PrepaymentEvent::one_time(Decimal::ZERO, 1)];
        let mut calendar = PrepaymentCalendar::new(&events);
        assert!(calendar.due(1, date(2024, 1, 1)).is_empty());
    }
}
