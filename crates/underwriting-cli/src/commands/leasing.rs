use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use underwriting_core::leasing::reserves::{
    self, LeasingCostAssumptions, LeasingReserveInput,
};

use crate::input;

/// Arguments for the leasing cost reserve
#[derive(Args)]
pub struct LeasingReservesArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Total rentable square feet
    #[arg(long, alias = "sf")]
    pub square_feet: Option<Decimal>,

    /// Renewal probability, percent
    #[arg(long)]
    pub renewal_probability: Option<Decimal>,

    /// Market rent for a new lease, $/SF/yr
    #[arg(long)]
    pub rent_new: Option<Decimal>,

    /// Market rent on renewal, $/SF/yr
    #[arg(long)]
    pub rent_renewal: Option<Decimal>,

    /// Tenant improvements for a new lease, $/SF
    #[arg(long, default_value = "0")]
    pub ti_new: Decimal,

    /// Tenant improvements on renewal, $/SF
    #[arg(long, default_value = "0")]
    pub ti_renewal: Decimal,

    /// Leasing commission on a new lease, percent of rent
    #[arg(long, default_value = "0")]
    pub commission_new: Decimal,

    /// Leasing commission on renewal, percent of rent
    #[arg(long, default_value = "0")]
    pub commission_renewal: Decimal,

    /// New lease term, years
    #[arg(long, default_value = "1")]
    pub term_new: Decimal,

    /// Renewal lease term, years
    #[arg(long, default_value = "1")]
    pub term_renewal: Decimal,
}

pub fn run_leasing_reserves(args: LeasingReservesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let reserve_input: LeasingReserveInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LeasingReserveInput {
            total_square_feet: args
                .square_feet
                .ok_or("--square-feet is required (or provide --input)")?,
            assumptions: LeasingCostAssumptions {
                renewal_probability_percent: args
                    .renewal_probability
                    .ok_or("--renewal-probability is required (or provide --input)")?,
                rent_new_per_sf: args
                    .rent_new
                    .ok_or("--rent-new is required (or provide --input)")?,
                rent_renewal_per_sf: args
                    .rent_renewal
                    .ok_or("--rent-renewal is required (or provide --input)")?,
                ti_new_per_sf: args.ti_new,
                ti_renewal_per_sf: args.ti_renewal,
                commission_new_percent: args.commission_new,
                commission_renewal_percent: args.commission_renewal,
                term_new_years: args.term_new,
                term_renewal_years: args.term_renewal,
            },
        }
    };
    let result = reserves::calculate_leasing_reserves(&reserve_input);
    Ok(serde_json::to_value(result)?)
}
