pub mod error;
pub mod types;

#[cfg(feature = "construction_loan")]
pub mod construction_loan;

pub use error::LoanError;
pub use types::*;

/// Standard result type for all construction-loan operations
pub type LoanResult<T> = Result<T, LoanError>;
