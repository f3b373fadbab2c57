#![cfg(all(feature = "comparison", feature = "penalty"))]

use chrono::NaiveDate;
use homeledger_core::comparison::{
    compare_scenarios, project_and_compare, ComparisonInput, NamedProjection, NamedScenario,
    ScenarioSetInput,
};
use homeledger_core::penalty::{estimate_penalty, PenaltyInput, PenaltyMethod};
use homeledger_core::projection::{
    project_net_worth, CompoundingMode, EmergencyFundInput, InvestmentInput, ProjectionInput,
};
use homeledger_core::schedule::{PrepaymentEvent, ScheduleInput};
use homeledger_core::{PaymentFrequency, TermType};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn household() -> ProjectionInput {
    ProjectionInput {
        mortgage: ScheduleInput::new(
            dec!(600000),
            dec!(0.0529),
            300,
            PaymentFrequency::Monthly,
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        ),
        projection_years: 15,
        monthly_income: dec!(12500),
        monthly_expenses: dec!(5800),
        emergency_fund: EmergencyFundInput {
            target: dec!(25000),
            starting_balance: dec!(10000),
            monthly_contribution: dec!(2000),
        },
        investment: InvestmentInput {
            starting_balance: dec!(40000),
            monthly_contribution_percent: dec!(80),
            expected_annual_return: dec!(0.06),
            compounding: CompoundingMode::Monthly,
        },
        starting_cash: Decimal::ZERO,
    }
}

fn scenario(name: &str, input: ProjectionInput) -> NamedScenario {
    NamedScenario {
        name: name.into(),
        input,
    }
}

// ===========================================================================
// Prepay versus invest
// ===========================================================================

#[test]
fn test_prepay_versus_invest_tradeoff() {
    let mut prepay = household();
    prepay.investment.monthly_contribution_percent = dec!(20);
    prepay
        .mortgage
        .prepayments
        .push(PrepaymentEvent::annual(dec!(20000), 12, 12));

    let set = ScenarioSetInput {
        baseline: scenario("invest", household()),
        alternatives: vec![scenario("prepay", prepay)],
    };
    let out = project_and_compare(&set).unwrap().result;
    let delta = &out.comparison.comparisons[0];

    assert_eq!(delta.name, "prepay");
    assert!(delta.interest_savings > Decimal::ZERO);
    assert!(delta.payoff_month_delta < 0);
    assert!(delta.investment_balance_delta < Decimal::ZERO);
    assert_eq!(
        delta.net_worth_delta,
        out.projections[1].projection.summary.final_net_worth
            - out.projections[0].projection.summary.final_net_worth
    );
}

#[test]
fn test_parallel_and_sequential_comparisons_agree() {
    let mut renewal_shock = household();
    renewal_shock.mortgage.annual_rate = dec!(0.0649);
    let mut weekly = household();
    weekly.mortgage.frequency = PaymentFrequency::AcceleratedWeekly;

    let set = ScenarioSetInput {
        baseline: scenario("base", household()),
        alternatives: vec![
            scenario("shock", renewal_shock.clone()),
            scenario("weekly", weekly.clone()),
        ],
    };
    let parallel = project_and_compare(&set).unwrap();

    let named = |name: &str, input: &ProjectionInput| NamedProjection {
        name: name.into(),
        projection: project_net_worth(input).unwrap().result,
    };
    let sequential = compare_scenarios(&ComparisonInput {
        baseline: named("base", &household()),
        alternatives: vec![named("shock", &renewal_shock), named("weekly", &weekly)],
    })
    .unwrap();

    assert_eq!(parallel.result.comparison, sequential.result);
    assert!(sequential.result.comparisons[0].interest_savings < Decimal::ZERO);
    assert_ne!(sequential.result.best_final_net_worth, "shock");
}

// ===========================================================================
// Breaking the term
// ===========================================================================

#[test]
fn test_penalty_on_balance_after_five_years() {
    let projection = project_net_worth(&household()).unwrap().result;
    let balance = projection.monthly[59].mortgage_balance;

    let fixed = estimate_penalty(&PenaltyInput {
        balance,
        contract_rate: dec!(0.0529),
        comparison_rate: dec!(0.0399),
        remaining_term_months: 24,
        term_type: TermType::Fixed,
    })
    .unwrap()
    .result;
    assert_eq!(fixed.method, PenaltyMethod::InterestRateDifferential);
    // Spread of 130 bp over two years.
    let ird = fixed.interest_rate_differential.unwrap();
    assert!((ird - balance * dec!(0.026)).abs() < dec!(0.000001));

    let variable = estimate_penalty(&PenaltyInput {
        balance,
        contract_rate: dec!(0.0529),
        comparison_rate: dec!(0.0399),
        remaining_term_months: 24,
        term_type: TermType::VariableChanging,
    })
    .unwrap()
    .result;
    assert_eq!(variable.method, PenaltyMethod::ThreeMonthsInterest);
    assert!(variable.penalty < fixed.penalty);
}
