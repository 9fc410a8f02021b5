pub mod amortization;
pub mod error;
pub mod types;
pub mod variables;

#[cfg(feature = "financing")]
pub mod financing;

#[cfg(feature = "income")]
pub mod income;

#[cfg(feature = "leasing")]
pub mod leasing;

#[cfg(feature = "exit")]
pub mod exit;

#[cfg(all(
    feature = "financing",
    feature = "income",
    feature = "leasing",
    feature = "exit"
))]
pub mod model;

pub use error::UnderwritingError;
pub use types::*;

/// Standard result type for all underwriting operations
pub type UnderwritingResult<T> = Result<T, UnderwritingError>;
