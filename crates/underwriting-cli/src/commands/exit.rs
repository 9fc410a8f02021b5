use clap::Args;
use serde_json::Value;

use underwriting_core::exit::valuation::{self, ExitValuationInput};

use crate::input;

/// Arguments for exit valuation
#[derive(Args)]
pub struct ExitValuationArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_exit_valuation(args: ExitValuationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let exit_input: ExitValuationInput = input::load(args.input.as_deref(), "exit valuation")?;
    let result = valuation::value_exit(&exit_input);
    Ok(serde_json::to_value(result)?)
}
