//! Side-by-side comparison of net-worth projections.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Instant;

use crate::error::HomeLedgerError;
use crate::projection::net_worth::{schedule_for, validate_projection_input};
use crate::projection::{simulate, NetWorthProjection, ProjectionInput};
use crate::schedule::amortize;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::HomeLedgerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A projection that has already been computed, under a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedProjection {
    pub name: String,
    pub projection: NetWorthProjection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub baseline: NamedProjection,
    pub alternatives: Vec<NamedProjection>,
}

/// Projection inputs for one scenario, under a display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedScenario {
    pub name: String,
    pub input: ProjectionInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSetInput {
    pub baseline: NamedScenario,
    pub alternatives: Vec<NamedScenario>,
}

/// How one alternative differs from the baseline. Every delta is
/// `alternative - baseline` except the interest savings, which are
/// `baseline - alternative`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDelta {
    pub name: String,
    pub final_net_worth: Money,
    pub net_worth_delta: Money,
    pub net_worth_delta_percent: Decimal,
    pub interest_savings: Money,
    pub interest_savings_percent: Decimal,
    /// Payoff month with "not paid off" counted as the full window.
    pub payoff_month: u32,
    /// Negative when the alternative retires the mortgage sooner.
    pub payoff_month_delta: i64,
    pub investment_balance_delta: Money,
    pub average_monthly_payment_delta: Money,
    /// Difference in interest plus outstanding balance at the end of the window.
    pub total_cash_outlay_delta: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutput {
    pub baseline: String,
    pub baseline_final_net_worth: Money,
    pub baseline_payoff_month: u32,
    pub comparisons: Vec<ScenarioDelta>,
    /// Scenario (baseline included) with the highest final net worth; the
    /// baseline wins ties.
    pub best_final_net_worth: String,
}

/// Scenario projections together with their comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSetOutput {
    pub projections: Vec<NamedProjection>,
    pub comparison: ComparisonOutput,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Diff each alternative projection against the baseline.
pub fn compare_scenarios(
    input: &ComparisonInput,
) -> HomeLedgerResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    if input.alternatives.is_empty() {
        return Err(HomeLedgerError::InsufficientData(
            "At least one alternative scenario required".into(),
        ));
    }

    let mut warnings: Vec<String> = Vec::new();
    let output = compare(&input.baseline, &input.alternatives, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario comparison against baseline projection",
        &serde_json::json!({
            "baseline": input.baseline.name,
            "alternatives": input.alternatives.iter().map(|a| &a.name).collect::<Vec<_>>(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Project the baseline and every alternative, then compare them.
/// Alternatives run on scoped threads and are joined before comparing.
pub fn project_and_compare(
    input: &ScenarioSetInput,
) -> HomeLedgerResult<ComputationOutput<ScenarioSetOutput>> {
    let start = Instant::now();
    if input.alternatives.is_empty() {
        return Err(HomeLedgerError::InsufficientData(
            "At least one alternative scenario required".into(),
        ));
    }
    validate_projection_input(&input.baseline.input)?;
    for alt in &input.alternatives {
        validate_projection_input(&alt.input)?;
    }

    let _span = tracing::debug_span!(
        "project_and_compare",
        scenarios = input.alternatives.len() + 1
    )
    .entered();

    let (baseline, alternatives) = thread::scope(|scope| {
        let handles: Vec<_> = input
            .alternatives
            .iter()
            .map(|alt| (alt.name.as_str(), scope.spawn(move || run_scenario(alt))))
            .collect();
        let baseline = run_scenario(&input.baseline);
        let alternatives: HomeLedgerResult<Vec<_>> = handles
            .into_iter()
            .map(|(name, handle)| {
                handle.join().map_err(|_| HomeLedgerError::ScenarioAborted {
                    name: name.to_string(),
                })
            })
            .collect();
        (baseline, alternatives)
    });
    let alternatives = alternatives?;

    let mut warnings: Vec<String> = Vec::new();
    let (baseline, baseline_warnings) = baseline;
    prefix_warnings(&mut warnings, &baseline.name, baseline_warnings);
    let mut projections = Vec::with_capacity(alternatives.len() + 1);
    let mut alt_projections = Vec::with_capacity(alternatives.len());
    for (named, alt_warnings) in alternatives {
        prefix_warnings(&mut warnings, &named.name, alt_warnings);
        alt_projections.push(named);
    }

    let comparison = compare(&baseline, &alt_projections, &mut warnings);
    projections.push(baseline);
    projections.extend(alt_projections);

    tracing::debug!(
        best = %comparison.best_final_net_worth,
        "scenario set compared"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Parallel scenario projections compared against baseline",
        input,
        warnings,
        elapsed,
        ScenarioSetOutput {
            projections,
            comparison,
        },
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn run_scenario(scenario: &NamedScenario) -> (NamedProjection, Vec<String>) {
    let (schedule, mut warnings) = amortize(&schedule_for(&scenario.input));
    let (projection, sim_warnings) = simulate(&scenario.input, &schedule);
    warnings.extend(sim_warnings);
    (
        NamedProjection {
            name: scenario.name.clone(),
            projection,
        },
        warnings,
    )
}

fn prefix_warnings(out: &mut Vec<String>, name: &str, warnings: Vec<String>) {
    out.extend(warnings.into_iter().map(|w| format!("[{name}] {w}")));
}

/// Payoff month, or the full window when the mortgage outlives it.
fn effective_payoff_month(projection: &NetWorthProjection) -> u32 {
    projection
        .summary
        .payoff_month
        .unwrap_or(projection.summary.months)
}

/// Interest plus whatever is still owed at the end of the window.
fn total_cash_outlay(projection: &NetWorthProjection) -> Money {
    projection.summary.total_interest + projection.summary.final_mortgage_balance
}

/// `delta / |base| * 100`, or zero with a warning when the base is zero.
fn percent_of(
    delta: Decimal,
    base: Decimal,
    what: &str,
    scenario: &str,
    warnings: &mut Vec<String>,
) -> Decimal {
    if base.is_zero() {
        if !delta.is_zero() {
            warnings.push(format!(
                "Baseline {what} is zero; percent change reported as 0 for '{scenario}'"
            ));
        }
        return Decimal::ZERO;
    }
    delta / base.abs() * dec!(100)
}

/// Mean of month-by-month payment differences over the overlapping months.
fn average_payment_delta(base: &NetWorthProjection, alt: &NetWorthProjection) -> Money {
    let overlap = base.monthly.len().min(alt.monthly.len());
    if overlap == 0 {
        return Decimal::ZERO;
    }
    let total: Money = base
        .monthly
        .iter()
        .zip(&alt.monthly)
        .map(|(b, a)| a.mortgage_payment - b.mortgage_payment)
        .sum();
    total / Decimal::from(overlap as u64)
}

fn compare(
    baseline: &NamedProjection,
    alternatives: &[NamedProjection],
    warnings: &mut Vec<String>,
) -> ComparisonOutput {
    let base = &baseline.projection;
    let base_net_worth = base.summary.final_net_worth;
    let base_interest = base.summary.total_interest;
    let base_payoff = effective_payoff_month(base);

    let mut best = (baseline.name.as_str(), base_net_worth);
    let mut comparisons = Vec::with_capacity(alternatives.len());

    for named in alternatives {
        let alt = &named.projection;
        if alt.summary.months != base.summary.months {
            warnings.push(format!(
                "'{}' spans {} months against {} for the baseline; monthly deltas use the overlap",
                named.name, alt.summary.months, base.summary.months
            ));
        }

        let final_net_worth = alt.summary.final_net_worth;
        let net_worth_delta = final_net_worth - base_net_worth;
        let interest_savings = base_interest - alt.summary.total_interest;
        let payoff_month = effective_payoff_month(alt);

        if final_net_worth > best.1 {
            best = (named.name.as_str(), final_net_worth);
        }

        comparisons.push(ScenarioDelta {
            name: named.name.clone(),
            final_net_worth,
            net_worth_delta,
            net_worth_delta_percent: percent_of(
                net_worth_delta,
                base_net_worth,
                "net worth",
                &named.name,
                warnings,
            ),
            interest_savings,
            interest_savings_percent: percent_of(
                interest_savings,
                base_interest,
                "interest",
                &named.name,
                warnings,
            ),
            payoff_month,
            payoff_month_delta: i64::from(payoff_month) - i64::from(base_payoff),
            investment_balance_delta: alt.summary.final_investment_balance
                - base.summary.final_investment_balance,
            average_monthly_payment_delta: average_payment_delta(base, alt),
            total_cash_outlay_delta: total_cash_outlay(alt) - total_cash_outlay(base),
        });
    }

    ComparisonOutput {
        baseline: baseline.name.clone(),
        baseline_final_net_worth: base_net_worth,
        baseline_payoff_month: base_payoff,
        comparisons,
        best_final_net_worth: best.0.to_string(),
    }
}
