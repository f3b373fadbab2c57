pub mod penalty;
pub mod projection;
pub mod rates;
pub mod schedule;

use clap::ValueEnum;
use serde_json::Value;

use homeledger_core::{PaymentFrequency, TermType};

/// Payment cadence as spelled on the command line.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FrequencyArg {
    #[default]
    Monthly,
    SemiMonthly,
    Biweekly,
    AcceleratedBiweekly,
    Weekly,
    AcceleratedWeekly,
}

impl From<FrequencyArg> for PaymentFrequency {
    fn from(arg: FrequencyArg) -> Self {
        match arg {
            FrequencyArg::Monthly => PaymentFrequency::Monthly,
            FrequencyArg::SemiMonthly => PaymentFrequency::SemiMonthly,
            FrequencyArg::Biweekly => PaymentFrequency::Biweekly,
            FrequencyArg::AcceleratedBiweekly => PaymentFrequency::AcceleratedBiweekly,
            FrequencyArg::Weekly => PaymentFrequency::Weekly,
            FrequencyArg::AcceleratedWeekly => PaymentFrequency::AcceleratedWeekly,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum TermTypeArg {
    #[default]
    Fixed,
    VariableChanging,
    VariableFixed,
}

impl From<TermTypeArg> for TermType {
    fn from(arg: TermTypeArg) -> Self {
        match arg {
            TermTypeArg::Fixed => TermType::Fixed,
            TermTypeArg::VariableChanging => TermType::VariableChanging,
            TermTypeArg::VariableFixed => TermType::VariableFixed,
        }
    }
}

/// Replace the envelope's `result` with one of its fields, keeping warnings
/// and methodology. Leaves the value untouched if the field is missing.
pub fn narrow(mut value: Value, field: &str) -> Value {
    let inner = value
        .get_mut("result")
        .and_then(|r| r.get_mut(field))
        .map(Value::take);
    if let Some(inner) = inner {
        value["result"] = inner;
    }
    value
}
