pub mod valuation;

pub use valuation::{ExitAssumptions, IncomeStream};
