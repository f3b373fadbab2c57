pub mod aggregate;
pub mod net_worth;

pub use net_worth::{
    project_net_worth, simulate, CompoundingMode, EmergencyFundInput, InvestmentInput,
    MonthlyProjection, NetWorthProjection, ProjectionInput, ProjectionSummary, YearlyProjection,
};
