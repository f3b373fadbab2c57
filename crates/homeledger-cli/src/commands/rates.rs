use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;

use homeledger_core::rates::{
    calculate_interest_payment, calculate_payment, calculate_principal_payment,
    calculate_remaining_amortization, calculate_trigger_rate, effective_periodic_rate,
    is_trigger_rate_hit, is_within_prepayment_limit,
};
use homeledger_core::{with_metadata, PaymentFrequency};

use crate::commands::FrequencyArg;
use crate::input;

/// Arguments for the level payment of a mortgage
#[derive(Args)]
pub struct PaymentArgs {
    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Nominal annual rate, compounded semi-annually (e.g. 0.0549 for 5.49%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Amortization in months
    #[arg(long, default_value = "300")]
    pub amortization_months: u32,

    /// Payment cadence
    #[arg(long, value_enum, default_value_t = FrequencyArg::Monthly)]
    pub frequency: FrequencyArg,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the trigger rate of a locked payment
#[derive(Args)]
pub struct TriggerRateArgs {
    /// Locked periodic payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Outstanding balance
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Payment cadence
    #[arg(long, value_enum, default_value_t = FrequencyArg::Monthly)]
    pub frequency: FrequencyArg,

    /// Current nominal rate to test against the trigger
    #[arg(long)]
    pub current_rate: Option<Decimal>,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the yearly prepayment allowance check
#[derive(Args)]
pub struct PrepaymentLimitArgs {
    /// Prepayment being considered
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Prepayments already made this year
    #[arg(long, default_value = "0")]
    pub year_to_date: Decimal,

    /// Original principal of the mortgage
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Yearly allowance as a percentage of the original principal
    #[arg(long, default_value = "15")]
    pub limit_percent: Decimal,

    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PaymentInput {
    principal: Decimal,
    annual_rate: Decimal,
    amortization_months: u32,
    #[serde(default)]
    frequency: PaymentFrequency,
}

#[derive(Debug, Serialize, Deserialize)]
struct TriggerRateInput {
    payment: Decimal,
    balance: Decimal,
    #[serde(default)]
    frequency: PaymentFrequency,
    #[serde(default)]
    current_rate: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PrepaymentLimitInput {
    amount: Decimal,
    #[serde(default)]
    year_to_date: Decimal,
    principal: Decimal,
    limit_percent: Decimal,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let req: PaymentInput = if let (None, Some(principal), Some(rate)) =
        (&args.input, args.principal, args.rate)
    {
        PaymentInput {
            principal,
            annual_rate: rate,
            amortization_months: args.amortization_months,
            frequency: args.frequency.into(),
        }
    } else if let Some(req) = input::read_input(args.input.as_deref())? {
        req
    } else {
        return Err("--principal and --rate are required (or provide --input)".into());
    };

    if req.principal <= Decimal::ZERO {
        return Err("principal must be positive".into());
    }
    if req.annual_rate < Decimal::ZERO || req.annual_rate >= Decimal::ONE {
        return Err("rate must be in [0, 1), e.g. 0.0549 for 5.49%".into());
    }
    if req.amortization_months == 0 {
        return Err("amortization months must be at least 1".into());
    }

    let payment = calculate_payment(
        req.principal,
        req.annual_rate,
        req.amortization_months,
        req.frequency,
    );
    let interest = calculate_interest_payment(req.principal, req.annual_rate, req.frequency);
    let result = json!({
        "payment": payment.round_dp(2),
        "periodic_rate": effective_periodic_rate(req.annual_rate, req.frequency),
        "payments_per_year": req.frequency.payments_per_year(),
        "first_interest": interest.round_dp(2),
        "first_principal": calculate_principal_payment(payment, interest).round_dp(2),
        "trigger_rate": calculate_trigger_rate(payment, req.principal, req.frequency),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(serde_json::to_value(with_metadata(
        "Level payment under semi-annual compounding",
        &req,
        Vec::new(),
        elapsed,
        result,
    ))?)
}

pub fn run_trigger_rate(args: TriggerRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let req: TriggerRateInput = if let (None, Some(payment), Some(balance)) =
        (&args.input, args.payment, args.balance)
    {
        TriggerRateInput {
            payment,
            balance,
            frequency: args.frequency.into(),
            current_rate: args.current_rate,
        }
    } else if let Some(req) = input::read_input(args.input.as_deref())? {
        req
    } else {
        return Err("--payment and --balance are required (or provide --input)".into());
    };

    let trigger_rate = calculate_trigger_rate(req.payment, req.balance, req.frequency);
    let mut warnings = Vec::new();
    if req.balance <= Decimal::ZERO {
        warnings.push("Balance is zero; the payment can never fall below interest".to_string());
    }

    let mut result = json!({ "trigger_rate": trigger_rate });
    if let Some(rate) = req.current_rate {
        let hit = is_trigger_rate_hit(rate, req.payment, req.balance, req.frequency);
        result["trigger_rate_hit"] = json!(hit);
        result["headroom"] = json!(trigger_rate.checked_sub(rate));
        result["remaining_amortization"] = serde_json::to_value(
            calculate_remaining_amortization(req.balance, req.payment, rate, req.frequency),
        )?;
        if hit {
            warnings.push(format!(
                "Rate {rate} is at or above the trigger rate; the payment no longer covers interest"
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(serde_json::to_value(with_metadata(
        "Trigger rate by inverting the semi-annual compounding chain",
        &req,
        warnings,
        elapsed,
        result,
    ))?)
}

pub fn run_prepayment_limit(args: PrepaymentLimitArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let req: PrepaymentLimitInput = if let (None, Some(amount), Some(principal)) =
        (&args.input, args.amount, args.principal)
    {
        PrepaymentLimitInput {
            amount,
            year_to_date: args.year_to_date,
            principal,
            limit_percent: args.limit_percent,
        }
    } else if let Some(req) = input::read_input(args.input.as_deref())? {
        req
    } else {
        return Err("--amount and --principal are required (or provide --input)".into());
    };

    let allowance = (req.principal / dec!(100))
        .checked_mul(req.limit_percent)
        .unwrap_or(Decimal::MAX);
    let within = is_within_prepayment_limit(
        req.amount,
        req.year_to_date,
        req.principal,
        req.limit_percent,
    );
    let result = json!({
        "within_limit": within,
        "yearly_allowance": allowance,
        "remaining_allowance": allowance
            .checked_sub(req.year_to_date)
            .map(|left| left.max(Decimal::ZERO)),
        "excess": req
            .year_to_date
            .checked_add(req.amount)
            .and_then(|total| total.checked_sub(allowance))
            .map(|over| over.max(Decimal::ZERO)),
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(serde_json::to_value(with_metadata(
        "Yearly prepayment allowance check",
        &req,
        Vec::new(),
        elapsed,
        result,
    ))?)
}
