use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{Deserialize, Serialize};

use underwriting_core::amortization::{self, LoanTerms};
use underwriting_core::exit::valuation::{self, ExitValuationInput};
use underwriting_core::financing::acquisition::{self, AcquisitionLoanInput};
use underwriting_core::financing::refinance::{self, RefinanceInput};
use underwriting_core::income::expenses::{self, ExpenseScheduleInput};
use underwriting_core::income::recoveries::{self, RecoveryInput};
use underwriting_core::income::residential::{self, ResidentialIncomeInput};
use underwriting_core::leasing::reserves::{self, LeasingReserveInput};
use underwriting_core::model::{self, UnderwritingInput, WizardInput};
use underwriting_core::variables::FieldValues;
use underwriting_core::{Money, Percent, Rate};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: for<'de> Deserialize<'de>>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn render<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LoanConstantRequest {
    annual_rate_percent: Percent,
    amortization_years: u32,
    #[serde(default)]
    principal: Option<Money>,
}

#[derive(Serialize)]
struct LoanConstantResponse {
    loan_constant: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    debt_service: Option<amortization::DebtService>,
}

#[napi]
pub fn loan_constant(input_json: String) -> NapiResult<String> {
    let req: LoanConstantRequest = parse(&input_json)?;
    let terms =
        LoanTerms::new(req.annual_rate_percent, req.amortization_years).map_err(to_napi_error)?;
    let debt_service = req
        .principal
        .map(|p| amortization::debt_service(p, &terms))
        .transpose()
        .map_err(to_napi_error)?;
    render(&LoanConstantResponse {
        loan_constant: terms.loan_constant().map_err(to_napi_error)?,
        debt_service,
    })
}

#[napi]
pub fn size_acquisition_loan(input_json: String) -> NapiResult<String> {
    let input: AcquisitionLoanInput = parse(&input_json)?;
    render(&acquisition::size_acquisition_loan(&input))
}

#[napi]
pub fn size_refinance(input_json: String) -> NapiResult<String> {
    let input: RefinanceInput = parse(&input_json)?;
    render(&refinance::size_refinance(&input))
}

// ---------------------------------------------------------------------------
// Income
// ---------------------------------------------------------------------------

#[napi]
pub fn allocate_recoveries(input_json: String) -> NapiResult<String> {
    let input: RecoveryInput = parse(&input_json)?;
    render(&recoveries::allocate_recoveries(&input))
}

#[napi]
pub fn calculate_residential_income(input_json: String) -> NapiResult<String> {
    let input: ResidentialIncomeInput = parse(&input_json)?;
    render(&residential::calculate_residential_income(&input))
}

#[napi]
pub fn schedule_operating_expenses(input_json: String) -> NapiResult<String> {
    let input: ExpenseScheduleInput = parse(&input_json)?;
    render(&expenses::schedule_operating_expenses(&input))
}

// ---------------------------------------------------------------------------
// Leasing and exit
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_leasing_reserves(input_json: String) -> NapiResult<String> {
    let input: LeasingReserveInput = parse(&input_json)?;
    render(&reserves::calculate_leasing_reserves(&input))
}

#[napi]
pub fn value_exit(input_json: String) -> NapiResult<String> {
    let input: ExitValuationInput = parse(&input_json)?;
    render(&valuation::value_exit(&input))
}

// ---------------------------------------------------------------------------
// Full model
// ---------------------------------------------------------------------------

#[napi]
pub fn underwrite(input_json: String) -> NapiResult<String> {
    let input: UnderwritingInput = parse(&input_json)?;
    render(&model::underwrite(&input))
}

/// Wizard payload (`fields` plus grid rows) in, named variables out.
#[napi]
pub fn underwrite_wizard(input_json: String) -> NapiResult<String> {
    let wizard: WizardInput = parse(&input_json)?;
    let input = wizard.to_underwriting_input();
    render(&model::underwrite(&input).result.variables)
}

/// Field values only, as a JSON array of `{field_key, value}`.
#[napi]
pub fn underwrite_fields(fields_json: String) -> NapiResult<String> {
    let fields = FieldValues::from_json(&fields_json).map_err(to_napi_error)?;
    let input = UnderwritingInput::from_fields(&fields);
    render(&model::underwrite(&input).result.variables)
}
