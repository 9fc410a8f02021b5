use clap::Args;
use serde_json::Value;

use underwriting_core::income::expenses::{self, ExpenseScheduleInput};
use underwriting_core::income::recoveries::{self, RecoveryInput};
use underwriting_core::income::residential::{self, ResidentialIncomeInput};

use crate::input;

/// Arguments for recoverable income allocation
#[derive(Args)]
pub struct RecoveriesArgs {
    /// Path to JSON input file (tenants, expenses, vacancy)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the residential rent roll and amenity income
#[derive(Args)]
pub struct ResidentialIncomeArgs {
    /// Path to JSON input file (units, market rents, amenities)
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the operating expense schedule
#[derive(Args)]
pub struct OperatingExpensesArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_recoveries(args: RecoveriesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let recovery_input: RecoveryInput = input::load(args.input.as_deref(), "recoveries")?;
    let result = recoveries::allocate_recoveries(&recovery_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_residential_income(
    args: ResidentialIncomeArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let rent_roll: ResidentialIncomeInput =
        input::load(args.input.as_deref(), "the residential rent roll")?;
    let result = residential::calculate_residential_income(&rent_roll);
    Ok(serde_json::to_value(result)?)
}

pub fn run_operating_expenses(
    args: OperatingExpensesArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ExpenseScheduleInput =
        input::load(args.input.as_deref(), "the operating expense schedule")?;
    let result = expenses::schedule_operating_expenses(&schedule_input);
    Ok(serde_json::to_value(result)?)
}
