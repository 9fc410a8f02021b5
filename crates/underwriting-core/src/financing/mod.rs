pub mod acquisition;
pub mod refinance;
pub mod selector;
pub mod sizing;

pub use selector::{BoundLoan, LoanSelection};
pub use sizing::{LoanMethodResult, SizingMethod, SizingMethods};
