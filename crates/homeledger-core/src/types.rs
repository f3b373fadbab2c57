use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dollar amounts. Always Decimal, never f64.
pub type Money = Decimal;

/// Nominal annual rates as decimals (0.0549 = 5.49%).
pub type Rate = Decimal;

/// Largest dollar amount accepted as input. Keeps a century of payments and
/// compounding inside `Decimal` range.
pub const MAX_AMOUNT: Money = rust_decimal_macros::dec!(1000000000000);

/// How often mortgage payments are made.
///
/// Accelerated variants pay the ordinary monthly payment split in two (or
/// four), so they pay the equivalent of one extra monthly payment per year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFrequency {
    #[default]
    Monthly,
    SemiMonthly,
    Biweekly,
    AcceleratedBiweekly,
    Weekly,
    AcceleratedWeekly,
}

impl PaymentFrequency {
    pub fn payments_per_year(self) -> u32 {
        match self {
            PaymentFrequency::Monthly => 12,
            PaymentFrequency::SemiMonthly => 24,
            PaymentFrequency::Biweekly | PaymentFrequency::AcceleratedBiweekly => 26,
            PaymentFrequency::Weekly | PaymentFrequency::AcceleratedWeekly => 52,
        }
    }

    /// Divisor applied to the monthly payment for accelerated cadences.
    pub fn acceleration_divisor(self) -> Option<u32> {
        match self {
            PaymentFrequency::AcceleratedBiweekly => Some(2),
            PaymentFrequency::AcceleratedWeekly => Some(4),
            PaymentFrequency::Monthly
            | PaymentFrequency::SemiMonthly
            | PaymentFrequency::Biweekly
            | PaymentFrequency::Weekly => None,
        }
    }
}

/// Contract type of a mortgage term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermType {
    /// Rate and payment constant for the term.
    #[default]
    Fixed,
    /// Payment is recalculated whenever the nominal rate moves.
    VariableChanging,
    /// Payment is locked; amortization absorbs rate moves and the trigger
    /// rate can be breached.
    VariableFixed,
}

/// Standard computation output envelope.
///
/// `result` and `warnings` are deterministic for a given input;
/// `metadata.computation_time_us` differs from call to call, so compare the
/// envelope by those two fields rather than as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
