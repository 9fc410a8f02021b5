pub mod expenses;
pub mod recoveries;
pub mod residential;

pub use expenses::{ExpenseFactor, OperatingExpense};
pub use recoveries::{RecoverableExpense, RentType, RentTypeIncluded, TenantLease};
pub use residential::{AmenityIncome, MarketRentAssumption, ResidentialUnit, VacatePlan};
