use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use underwriting_core::amortization::{self, LoanTerms};
use underwriting_core::financing::acquisition::{self, AcquisitionLoanInput};
use underwriting_core::financing::refinance::{self, RefinanceInput};
use underwriting_core::financing::sizing::{
    DebtYieldMethod, DscrMethod, FixedMethod, LtvMethod, SizingMethods,
};

use crate::input;

/// Arguments for acquisition loan sizing
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AcquisitionLoanArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Acquisition price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Annualized NOI in the sizing month
    #[arg(long)]
    pub noi: Option<Decimal>,

    /// Annual interest rate, percent
    #[arg(long, default_value = "5")]
    pub rate: Decimal,

    /// Amortization, years
    #[arg(long, default_value_t = 30)]
    pub amortization: u32,

    /// Maximum loan-to-value, percent
    #[arg(long)]
    pub ltv: Option<Decimal>,

    /// Minimum debt-service coverage ratio
    #[arg(long, alias = "dscr")]
    pub min_dscr: Option<Decimal>,

    /// Minimum debt yield, percent
    #[arg(long, alias = "debt-yield")]
    pub min_debt_yield: Option<Decimal>,

    /// Exact loan amount
    #[arg(long)]
    pub fixed: Option<Decimal>,

    /// Lender's required interest reserve, months
    #[arg(long)]
    pub interest_reserve_months: Option<Decimal>,
}

/// Arguments for refinance sizing
#[derive(Args)]
pub struct RefinanceArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the loan constant
#[derive(Args)]
pub struct LoanConstantArgs {
    /// Annual interest rate, percent
    #[arg(long)]
    pub rate: Decimal,

    /// Amortization, years
    #[arg(long, alias = "amortization")]
    pub years: u32,

    /// Principal to compute debt service on
    #[arg(long)]
    pub principal: Option<Decimal>,
}

pub fn run_acquisition_loan(args: AcquisitionLoanArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: AcquisitionLoanInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        if args.ltv.is_none()
            && args.min_dscr.is_none()
            && args.min_debt_yield.is_none()
            && args.fixed.is_none()
        {
            return Err(
                "at least one of --ltv, --min-dscr, --min-debt-yield, --fixed is required (or provide --input)"
                    .into(),
            );
        }
        AcquisitionLoanInput {
            purchase_price: args.price,
            noi: args.noi,
            terms: LoanTerms::new(args.rate, args.amortization)?,
            methods: SizingMethods {
                ltv: args.ltv.map(|ltv_percent| LtvMethod {
                    enabled: true,
                    ltv_percent,
                    finance_hard_costs: false,
                    hard_cost_amount: Decimal::ZERO,
                    hard_cost_ltc_percent: Decimal::ZERO,
                }),
                dscr: args.min_dscr.map(|min_dscr| DscrMethod {
                    enabled: true,
                    min_dscr,
                }),
                debt_yield: args.min_debt_yield.map(|min| DebtYieldMethod {
                    enabled: true,
                    min_debt_yield_percent: min,
                }),
                fixed: args.fixed.map(|amount| FixedMethod {
                    enabled: true,
                    amount,
                }),
            },
            interest_reserve_months: args.interest_reserve_months,
        }
    };
    let result = acquisition::size_acquisition_loan(&loan_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_refinance(args: RefinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let refi_input: RefinanceInput = input::load(args.input.as_deref(), "refinance sizing")?;
    let result = refinance::size_refinance(&refi_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_loan_constant(args: LoanConstantArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let terms = LoanTerms::new(args.rate, args.years)?;
    let constant = terms.loan_constant()?;

    let mut result = json!({
        "annual_rate_percent": args.rate,
        "amortization_years": args.years,
        "loan_constant": constant,
    });
    if let Some(principal) = args.principal {
        let service = amortization::debt_service(principal, &terms)?;
        result["principal"] = json!(principal);
        result["annual_debt_service"] = json!(service.annual);
        result["monthly_debt_service"] = json!(service.monthly);
    }
    Ok(json!({ "result": result }))
}
