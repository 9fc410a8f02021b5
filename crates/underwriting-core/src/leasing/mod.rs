pub mod reserves;

pub use reserves::{LeasingCostAssumptions, LeasingReserveInput, LeasingReserveOutput};
