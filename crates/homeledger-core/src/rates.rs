//! Rate and payment primitives under the Canadian semi-annual compounding
//! convention.
//!
//! Every function here is pure and total. Conditions that are financially
//! meaningful but not errors (a payment that no longer covers interest, a
//! prepayment above the yearly allowance) come back as values the caller
//! branches on.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, PaymentFrequency, Rate};

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Remaining amortization for a balance at a given payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "months")]
pub enum RemainingAmortization {
    /// Months until the balance reaches zero at the current payment.
    Months(Decimal),
    /// The payment does not exceed interest; the loan never amortizes.
    TriggerRateHit,
}

impl RemainingAmortization {
    pub fn months(self) -> Option<Decimal> {
        match self {
            RemainingAmortization::Months(m) => Some(m),
            RemainingAmortization::TriggerRateHit => None,
        }
    }

    pub fn is_trigger_rate_hit(self) -> bool {
        matches!(self, RemainingAmortization::TriggerRateHit)
    }
}

pub fn payments_per_year(frequency: PaymentFrequency) -> u32 {
    frequency.payments_per_year()
}

/// Number of payment periods in `months` at the given cadence.
pub fn amortization_periods(months: u32, frequency: PaymentFrequency) -> Decimal {
    Decimal::from(months) * Decimal::from(frequency.payments_per_year()) / MONTHS_PER_YEAR
}

/// Convert a count of payment periods back to months.
pub fn periods_to_months(periods: Decimal, frequency: PaymentFrequency) -> Decimal {
    periods * MONTHS_PER_YEAR / Decimal::from(frequency.payments_per_year())
}

/// Periodic rate for a nominal annual rate compounded semi-annually.
///
/// nominal -> semi-annual (r/2) -> effective annual ((1 + r/2)^2 - 1)
/// -> periodic ((1 + eff)^(1/ppy) - 1). The order matters; shortcuts
/// drift by compounding error.
pub fn effective_periodic_rate(annual_rate: Rate, frequency: PaymentFrequency) -> Rate {
    if annual_rate.is_zero() {
        return Decimal::ZERO;
    }
    let semi_annual = annual_rate / dec!(2);
    let effective_annual = (Decimal::ONE + semi_annual).powi(2) - Decimal::ONE;
    let per_year = Decimal::from(frequency.payments_per_year());
    (Decimal::ONE + effective_annual).powd(Decimal::ONE / per_year) - Decimal::ONE
}

/// Level payment that retires `principal` over `amortization_months`.
///
/// Accelerated cadences take the ordinary monthly payment and divide it,
/// they are never solved against their own period count.
pub fn calculate_payment(
    principal: Money,
    annual_rate: Rate,
    amortization_months: u32,
    frequency: PaymentFrequency,
) -> Money {
    if let Some(divisor) = frequency.acceleration_divisor() {
        let monthly = calculate_payment(
            principal,
            annual_rate,
            amortization_months,
            PaymentFrequency::Monthly,
        );
        return monthly / Decimal::from(divisor);
    }

    let periods = amortization_periods(amortization_months, frequency);
    if periods.is_zero() {
        return principal;
    }

    let rate = effective_periodic_rate(annual_rate, frequency);
    if rate.is_zero() {
        return principal / periods;
    }

    // P = r * PV / (1 - (1 + r)^-n) with f = (1 + r)^n. Dividing by f
    // before multiplying keeps large factors in range. If f overflows the
    // payment tends to interest-only.
    let interest_only = rate * principal;
    match (Decimal::ONE + rate).checked_powd(periods) {
        Some(factor) if factor > Decimal::ONE => {
            let retired_share = Decimal::ONE - Decimal::ONE / factor;
            if retired_share > Decimal::ZERO {
                interest_only
                    .checked_div(retired_share)
                    .unwrap_or(principal / periods)
            } else {
                principal / periods
            }
        }
        Some(_) => principal / periods,
        None => interest_only,
    }
}

pub fn calculate_interest_payment(
    balance: Money,
    annual_rate: Rate,
    frequency: PaymentFrequency,
) -> Money {
    balance * effective_periodic_rate(annual_rate, frequency)
}

/// Principal portion of a payment. Negative when the payment does not cover
/// interest; callers must branch on that instead of clamping.
pub fn calculate_principal_payment(payment_amount: Money, interest_amount: Money) -> Money {
    payment_amount - interest_amount
}

pub fn calculate_remaining_balance(
    balance: Money,
    principal: Money,
    extra_prepayment: Money,
) -> Money {
    (balance - principal - extra_prepayment).max(Decimal::ZERO)
}

/// Solve the annuity relation for the number of periods left at `payment_amount`.
pub fn calculate_remaining_amortization(
    balance: Money,
    payment_amount: Money,
    annual_rate: Rate,
    frequency: PaymentFrequency,
) -> RemainingAmortization {
    if balance <= Decimal::ZERO {
        return RemainingAmortization::Months(Decimal::ZERO);
    }

    let rate = effective_periodic_rate(annual_rate, frequency);
    let interest_only = balance * rate;
    if payment_amount <= interest_only {
        return RemainingAmortization::TriggerRateHit;
    }

    let periods = if rate.is_zero() {
        balance.checked_div(payment_amount)
    } else {
        // n = -ln(1 - r*B/P) / ln(1 + r); the argument is in (0, 1] here
        // unless it rounds to zero.
        let remaining_fraction = Decimal::ONE - rate * balance / payment_amount;
        remaining_fraction
            .checked_ln()
            .and_then(|ln| (-ln).checked_div((Decimal::ONE + rate).ln()))
    };

    // A payment too small to express the count in range never retires the loan.
    let months = periods
        .and_then(|n| n.checked_mul(MONTHS_PER_YEAR))
        .map(|n| n / Decimal::from(frequency.payments_per_year()))
        .unwrap_or(Decimal::MAX);
    RemainingAmortization::Months(months)
}

/// Nominal annual rate at which `payment_amount` exactly covers interest on
/// `balance`. Inverts [`effective_periodic_rate`] step by step.
///
/// A non-positive payment triggers at any rate (returns zero). A
/// non-positive balance never triggers (returns `Decimal::MAX`), and neither
/// does a payment so large against the balance that the rate is beyond
/// `Decimal` range (also `Decimal::MAX`).
pub fn calculate_trigger_rate(
    payment_amount: Money,
    balance: Money,
    frequency: PaymentFrequency,
) -> Rate {
    if balance <= Decimal::ZERO {
        return Decimal::MAX;
    }
    if payment_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let per_year = frequency.payments_per_year();

    // Effective annual factor is (1 + p)^ppy; the semi-annual factor is its
    // square root. Every cadence has an even ppy, so the root is exact.
    payment_amount
        .checked_div(balance)
        .and_then(|periodic| Decimal::ONE.checked_add(periodic))
        .and_then(|base| base.checked_powi(i64::from(per_year / 2)))
        .and_then(|factor| (factor - Decimal::ONE).checked_mul(dec!(2)))
        .unwrap_or(Decimal::MAX)
}

pub fn is_trigger_rate_hit(
    current_rate: Rate,
    payment_amount: Money,
    balance: Money,
    frequency: PaymentFrequency,
) -> bool {
    current_rate >= calculate_trigger_rate(payment_amount, balance, frequency)
}

/// Whether `amount` fits in the yearly prepayment allowance
/// (`limit_percent` of the original principal, 0-100 scale).
pub fn is_within_prepayment_limit(
    amount: Money,
    year_to_date_prepayments: Money,
    original_principal: Money,
    limit_percent: Decimal,
) -> bool {
    let allowance = (original_principal / dec!(100))
        .checked_mul(limit_percent)
        .unwrap_or(Decimal::MAX);
    year_to_date_prepayments
        .checked_add(amount)
        .is_some_and(|total| total <= allowance)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: Decimal = dec!(0.01);

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

    #[test]
    fn test_payments_per_year_table() {
        assert_eq!(payments_per_year(PaymentFrequency::Monthly), 12);
        assert_eq!(payments_per_year(PaymentFrequency::SemiMonthly), 24);
        assert_eq!(payments_per_year(PaymentFrequency::Biweekly), 26);
        assert_eq!(payments_per_year(PaymentFrequency::AcceleratedBiweekly), 26);
        assert_eq!(payments_per_year(PaymentFrequency::Weekly), 52);
        assert_eq!(payments_per_year(PaymentFrequency::AcceleratedWeekly), 52);
    }

    #[test]
    fn test_periodic_rate_semi_annual_monthly() {
        // (1.02745)^(1/6) - 1
        let r = effective_periodic_rate(dec!(0.0549), PaymentFrequency::Monthly);
        assert_close(r, dec!(0.0045235345), dec!(0.000000001), "monthly rate");
    }

    #[test]
    fn test_periodic_rate_zero() {
        for f in [
            PaymentFrequency::Monthly,
            PaymentFrequency::SemiMonthly,
            PaymentFrequency::AcceleratedWeekly,
        ] {
            assert_eq!(effective_periodic_rate(Decimal::ZERO, f), Decimal::ZERO);
        }
    }

    #[test]
    fn test_periodic_rate_compounds_back_to_effective_annual() {
        let rate = dec!(0.06);
        let monthly = effective_periodic_rate(rate, PaymentFrequency::Monthly);
        let eff = (Decimal::ONE + monthly).powi(12) - Decimal::ONE;
        // (1.03)^2 - 1
        assert_close(eff, dec!(0.0609), dec!(0.0000001), "effective annual");
    }

    #[test]
    fn test_accelerated_uses_base_cadence_rate() {
        let rate = dec!(0.05);
        assert_eq!(
            effective_periodic_rate(rate, PaymentFrequency::AcceleratedBiweekly),
            effective_periodic_rate(rate, PaymentFrequency::Biweekly)
        );
        assert_eq!(
            effective_periodic_rate(rate, PaymentFrequency::AcceleratedWeekly),
            effective_periodic_rate(rate, PaymentFrequency::Weekly)
        );
    }

    #[test]
    fn test_payment_known_answer() {
        let pmt = calculate_payment(dec!(500000), dec!(0.0549), 300, PaymentFrequency::Monthly);
        assert_close(pmt, dec!(3049.05), TOL, "monthly payment");
    }

    #[test]
    fn test_accelerated_payment_divides_monthly() {
        let monthly = calculate_payment(dec!(400000), dec!(0.05), 300, PaymentFrequency::Monthly);
        let ab = calculate_payment(
            dec!(400000),
            dec!(0.05),
            300,
            PaymentFrequency::AcceleratedBiweekly,
        );
        let aw = calculate_payment(
            dec!(400000),
            dec!(0.05),
            300,
            PaymentFrequency::AcceleratedWeekly,
        );
        assert_eq!(ab, monthly / dec!(2));
        assert_eq!(aw, monthly / dec!(4));
    }

    #[test]
    fn test_regular_biweekly_is_less_than_half_monthly() {
        let monthly = calculate_payment(dec!(400000), dec!(0.05), 300, PaymentFrequency::Monthly);
        let biweekly = calculate_payment(dec!(400000), dec!(0.05), 300, PaymentFrequency::Biweekly);
        assert!(biweekly < monthly / dec!(2));
        assert!(biweekly * dec!(26) < monthly * dec!(13));
    }

    #[test]
    fn test_zero_rate_straight_line() {
        let pmt = calculate_payment(dec!(120000), Decimal::ZERO, 120, PaymentFrequency::Monthly);
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_principal_payment_can_be_negative() {
        assert_eq!(calculate_principal_payment(dec!(100), dec!(150)), dec!(-50));
    }

    #[test]
    fn test_remaining_balance_clamps_at_zero() {
        assert_eq!(
            calculate_remaining_balance(dec!(100), dec!(80), dec!(50)),
            Decimal::ZERO
        );
        assert_eq!(
            calculate_remaining_balance(dec!(100), dec!(30), dec!(20)),
            dec!(50)
        );
    }

    #[test]
    fn test_remaining_amortization_matches_original_term() {
        let pmt = calculate_payment(dec!(500000), dec!(0.0549), 300, PaymentFrequency::Monthly);
        let remaining =
            calculate_remaining_amortization(dec!(500000), pmt, dec!(0.0549), PaymentFrequency::Monthly);
        assert_close(
            remaining.months().unwrap(),
            dec!(300),
            dec!(0.01),
            "remaining amortization",
        );
    }

    #[test]
    fn test_remaining_amortization_biweekly_in_months() {
        let pmt = calculate_payment(dec!(300000), dec!(0.045), 240, PaymentFrequency::Biweekly);
        let remaining =
            calculate_remaining_amortization(dec!(300000), pmt, dec!(0.045), PaymentFrequency::Biweekly);
        assert_close(
            remaining.months().unwrap(),
            dec!(240),
            dec!(0.01),
            "biweekly remaining amortization",
        );
    }

    #[test]
    fn test_remaining_amortization_trigger() {
        let interest =
            calculate_interest_payment(dec!(500000), dec!(0.06), PaymentFrequency::Monthly);
        let result =
            calculate_remaining_amortization(dec!(500000), interest, dec!(0.06), PaymentFrequency::Monthly);
        assert_eq!(result, RemainingAmortization::TriggerRateHit);
        assert!(result.months().is_none());
    }

    #[test]
    fn test_remaining_amortization_dust_payment() {
        let result = calculate_remaining_amortization(
            dec!(1000000000000),
            dec!(0.0000000000000000000000000001),
            Decimal::ZERO,
            PaymentFrequency::Monthly,
        );
        assert_eq!(result, RemainingAmortization::Months(Decimal::MAX));
    }

    #[test]
    fn test_remaining_amortization_zero_rate() {
        let result = calculate_remaining_amortization(
            dec!(12000),
            dec!(1000),
            Decimal::ZERO,
            PaymentFrequency::Monthly,
        );
        assert_eq!(result, RemainingAmortization::Months(dec!(12)));
    }

    #[test]
    fn test_trigger_rate_round_trip() {
        let balance = dec!(450000);
        let pmt = dec!(2000);
        let trigger = calculate_trigger_rate(pmt, balance, PaymentFrequency::Monthly);
        let interest = calculate_interest_payment(balance, trigger, PaymentFrequency::Monthly);
        assert_close(interest, pmt, dec!(0.001), "interest at trigger rate");
        assert!(is_trigger_rate_hit(trigger, pmt, balance, PaymentFrequency::Monthly));
        assert!(!is_trigger_rate_hit(
            trigger - dec!(0.0001),
            pmt,
            balance,
            PaymentFrequency::Monthly
        ));
    }

    #[test]
    fn test_trigger_rate_degenerate_inputs() {
        assert_eq!(
            calculate_trigger_rate(dec!(1000), Decimal::ZERO, PaymentFrequency::Monthly),
            Decimal::MAX
        );
        assert_eq!(
            calculate_trigger_rate(Decimal::ZERO, dec!(1000), PaymentFrequency::Monthly),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_trigger_rate_near_payoff_is_out_of_range() {
        // $500 weekly against a $10 balance: 51^26 is beyond Decimal range.
        assert_eq!(
            calculate_trigger_rate(dec!(500), dec!(10), PaymentFrequency::Weekly),
            Decimal::MAX
        );
        assert!(!is_trigger_rate_hit(
            dec!(0.05),
            dec!(500),
            dec!(10),
            PaymentFrequency::Weekly
        ));
        assert_eq!(
            calculate_trigger_rate(dec!(1000000), dec!(0.0000000001), PaymentFrequency::Monthly),
            Decimal::MAX
        );
    }

    #[test]
    fn test_payment_with_large_growth_factor() {
        // (1 + r)^n is huge; the payment tends to interest-only.
        let pmt = calculate_payment(dec!(500000), dec!(0.9), 1000, PaymentFrequency::Monthly);
        let interest = calculate_interest_payment(dec!(500000), dec!(0.9), PaymentFrequency::Monthly);
        assert!(pmt >= interest);
        assert_close(pmt, interest, TOL, "payment at a 90% rate over 1000 months");

        let long = calculate_payment(dec!(500000), dec!(0.9999), 1200, PaymentFrequency::Weekly);
        assert!(long > Decimal::ZERO);
    }

    #[test]
    fn test_prepayment_limit_boundary() {
        // 20% of 500k = 100k
        assert!(is_within_prepayment_limit(
            dec!(40000),
            dec!(60000),
            dec!(500000),
            dec!(20)
        ));
        assert!(!is_within_prepayment_limit(
            dec!(40000.01),
            dec!(60000),
            dec!(500000),
            dec!(20)
        ));
    }
}
