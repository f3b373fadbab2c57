pub mod amortization;
pub mod events;
pub mod position;

pub use amortization::{
    amortize, generate_schedule, validate_schedule_input, AmortizationSchedule, PaymentRecord, ScheduleInput,
    ScheduleStatus, ScheduleSummary, TriggerPolicy, MAX_HORIZON_YEARS,
    NEGATIVE_AMORTIZATION_LIMIT,
};
pub use events::{PrepaymentEvent, PrepaymentKind, RateChange, TermRenewal};
pub use position::{mortgage_position, position_as_of, MortgagePosition, PositionInput};
