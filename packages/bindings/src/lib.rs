use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use homeledger_core::{rates, PaymentFrequency};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PaymentRequest {
    principal: Decimal,
    annual_rate: Decimal,
    amortization_months: u32,
    #[serde(default)]
    frequency: PaymentFrequency,
}

#[derive(Deserialize)]
struct TriggerRateRequest {
    payment: Decimal,
    balance: Decimal,
    #[serde(default)]
    frequency: PaymentFrequency,
}

#[napi]
pub fn calculate_payment(input_json: String) -> NapiResult<String> {
    let req: PaymentRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    if req.principal <= Decimal::ZERO || req.amortization_months == 0 {
        return Err(to_napi_error(
            "principal and amortization_months must be positive",
        ));
    }
    let payment = rates::calculate_payment(
        req.principal,
        req.annual_rate,
        req.amortization_months,
        req.frequency,
    );
    let interest = rates::calculate_interest_payment(req.principal, req.annual_rate, req.frequency);
    serde_json::to_string(&serde_json::json!({
        "payment": payment.round_dp(2),
        "first_interest": interest.round_dp(2),
        "first_principal": rates::calculate_principal_payment(payment, interest).round_dp(2),
        "periodic_rate": rates::effective_periodic_rate(req.annual_rate, req.frequency),
    }))
    .map_err(to_napi_error)
}

#[napi]
pub fn calculate_trigger_rate(input_json: String) -> NapiResult<String> {
    let req: TriggerRateRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let trigger_rate = rates::calculate_trigger_rate(req.payment, req.balance, req.frequency);
    serde_json::to_string(&serde_json::json!({ "trigger_rate": trigger_rate }))
        .map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_schedule(input_json: String) -> NapiResult<String> {
    let input: homeledger_core::schedule::ScheduleInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = homeledger_core::schedule::generate_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn mortgage_position(input_json: String) -> NapiResult<String> {
    let input: homeledger_core::schedule::PositionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = homeledger_core::schedule::mortgage_position(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[napi]
pub fn project_net_worth(input_json: String) -> NapiResult<String> {
    let input: homeledger_core::projection::ProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = homeledger_core::projection::project_net_worth(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[napi]
pub fn compare_scenarios(input_json: String) -> NapiResult<String> {
    let input: homeledger_core::comparison::ComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = homeledger_core::comparison::compare_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_and_compare(input_json: String) -> NapiResult<String> {
    let input: homeledger_core::comparison::ScenarioSetInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        homeledger_core::comparison::project_and_compare(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Penalty
// ---------------------------------------------------------------------------

#[napi]
pub fn estimate_penalty(input_json: String) -> NapiResult<String> {
    let input: homeledger_core::penalty::PenaltyInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = homeledger_core::penalty::estimate_penalty(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
