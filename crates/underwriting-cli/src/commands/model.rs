use clap::Args;
use serde_json::{json, Value};

use underwriting_core::model::{self, UnderwritingInput, WizardInput};

use crate::input;

/// Arguments for the full model
#[derive(Args)]
pub struct UnderwriteArgs {
    /// Path to JSON input file: a typed model input, or wizard `fields` plus grid rows
    #[arg(long)]
    pub input: Option<String>,

    /// Print only the named variables map
    #[arg(long)]
    pub variables_only: bool,
}

pub fn run_underwrite(args: UnderwriteArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = input::load_value(args.input.as_deref(), "the underwriting model")?;

    // Wizard payloads carry their values as named fields
    let model_input: UnderwritingInput = if raw.get("fields").is_some() {
        tracing::debug!("reading wizard field values");
        let wizard: WizardInput = serde_json::from_value(raw)?;
        wizard.to_underwriting_input()
    } else {
        serde_json::from_value(raw)?
    };

    let result = model::underwrite(&model_input);
    if args.variables_only {
        return Ok(json!({
            "result": result.result.variables,
            "warnings": result.warnings,
            "methodology": result.methodology,
        }));
    }
    Ok(serde_json::to_value(result)?)
}
