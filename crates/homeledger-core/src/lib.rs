pub mod error;
pub mod rates;
pub mod types;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "projection")]
pub mod projection;

#[cfg(feature = "comparison")]
pub mod comparison;

#[cfg(feature = "penalty")]
pub mod penalty;

pub use error::HomeLedgerError;
pub use types::*;

/// Standard result type for all homeledger operations
pub type HomeLedgerResult<T> = Result<T, HomeLedgerError>;
