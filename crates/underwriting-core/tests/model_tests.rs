use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use underwriting_core::model::{underwrite, WizardInput};
use underwriting_core::variables::{keys, VariableValue};

const WIZARD_JSON: &str = r#"{
  "fields": [
    { "field_key": "Property Type", "value": "Retail" },
    { "field_key": "Acquisition Price", "value": "$5,500,000" },
    { "field_key": "Acquisition Loan Interest Rate", "value": 6.75 },
    { "field_key": "Acquisition Loan Amortization", "value": "25" },
    { "field_key": "Acquisition Loan: LTV Calculation", "value": "yes" },
    { "field_key": "Loan-to-Value (LTV)", "value": "65" },
    { "field_key": "Acquisition Loan: Debt-Service Coverage Ratio Calculation", "value": "yes" },
    { "field_key": "Minimum DSCR", "value": "1.30" },
    { "field_key": "AQ: Annualized NOI in Month", "value": "400,000" },
    { "field_key": "Vacancy ", "value": "0" },
    { "field_key": "Renewal Property: Renewal Lease", "value": "70" },
    { "field_key": "Retail Rent: New Lease", "value": "22" },
    { "field_key": "Retail Rent: Renewal Lease", "value": "21" },
    { "field_key": "TI's: New Lease", "value": "35" },
    { "field_key": "TI's: Renewal Lease", "value": "10" },
    { "field_key": "Leasing Commissions: New Lease", "value": "6" },
    { "field_key": "Leasing Commissions: Renewal Lease", "value": "3" },
    { "field_key": "Lease Term: New Lease", "value": "10" },
    { "field_key": "Lease Term: Renewal Lease", "value": "5" },
    { "field_key": "Retail Exit Month", "value": "120" },
    { "field_key": "Retail Applied Exit Cap Rate", "value": "7" },
    { "field_key": "Retail Less: Selling Costs", "value": "2" },
    { "field_key": "Forward NOI in Month", "value": "420000" }
  ],
  "tenants": [
    { "suite": "100", "tenant_name": "A", "square_feet": "25000", "rent_per_sf_per_year": "12", "rent_type": "NNN" },
    { "suite": "200", "tenant_name": "B", "square_feet": "15000", "rent_per_sf_per_year": "18", "rent_type": "Gross" }
  ],
  "recoverable_expenses": [
    { "name": "CAM", "factor": "Annual", "cost_per": "8500", "rent_type_included": "Both" }
  ]
}"#;

fn number(v: rust_decimal::Decimal) -> Option<VariableValue> {
    Some(VariableValue::Number(v))
}

#[test]
fn test_wizard_payload_end_to_end() {
    let wizard: WizardInput = serde_json::from_str(WIZARD_JSON).unwrap();
    let input = wizard.to_underwriting_input();
    let result = underwrite(&input);
    let vars = &result.result.variables;

    assert_eq!(vars.get(keys::GPI_BEFORE_VACANCY).copied(), number(dec!(578_500)));
    assert_eq!(vars.get(keys::GPI_BEFORE_VACANCY_PER_SF).copied(), number(dec!(14.4625)));
    assert_eq!(vars.get(keys::AQ_MAX_LOAN).copied(), number(dec!(3_575_000)));
    assert_eq!(vars.get(keys::AQ_LOAN_LTC).copied(), number(dec!(3_575_000)));
    assert_eq!(vars.get(keys::LEASING_RESERVE).copied(), number(dec!(131_480)));
    assert_eq!(vars.get(keys::LEASING_RESERVE_PER_SF).copied(), number(dec!(3.287)));
    // 420,000 / 7% = 6,000,000
    assert_eq!(vars.get(keys::RETAIL_IMPLIED_VALUATION).copied(), number(dec!(6_000_000)));
    assert_eq!(vars.get(keys::RETAIL_SELLING_COSTS_AMOUNT).copied(), number(dec!(120_000)));
    assert!(vars.get(keys::REFI_MAX_LOAN).is_none());
}

#[test]
fn test_variables_serialize_as_flat_map() {
    let wizard: WizardInput = serde_json::from_str(WIZARD_JSON).unwrap();
    let output = underwrite(&wizard.to_underwriting_input());
    let json = serde_json::to_value(&output.result.variables).unwrap();
    assert!(json.is_object());
    assert_eq!(json[keys::AQ_LTV], serde_json::json!("65"));
}

#[test]
fn test_underwrite_is_idempotent() {
    let wizard: WizardInput = serde_json::from_str(WIZARD_JSON).unwrap();
    let input = wizard.to_underwriting_input();
    let first = underwrite(&input).result.variables;
    let second = underwrite(&input).result.variables;
    assert_eq!(first, second);
}

const MULTIFAMILY_JSON: &str = r#"{
  "fields": [
    { "field_key": "Property Type", "value": "multifamily" },
    { "field_key": "Acquisition Price", "value": "4,000,000" },
    { "field_key": "Multifamily Exit Month", "value": "60" },
    { "field_key": "Multifamily Applied Exit Cap Rate", "value": "5" },
    { "field_key": "Forward NOI in Month", "value": "300000" }
  ],
  "units": [
    { "layout": "2BR", "square_feet": "950", "current_rent": "1850", "vacate_flag": 0 },
    { "layout": "2BR", "square_feet": "950", "current_rent": "1700", "vacate_flag": 1, "vacate_month": 6 },
    { "layout": "Studio", "square_feet": "450", "vacate_flag": "Market Adjustment", "vacate_month": 3 }
  ],
  "market_rent_assumptions": [
    { "layout": "2BR", "pf_rent": "2050" },
    { "layout": "Studio", "pf_rent": "1200" }
  ],
  "amenity_income": [
    { "name": "Covered Parking", "start_month": 1, "utilization": "85", "unit_count": "30", "monthly_fee": "75" }
  ]
}"#;

#[test]
fn test_residential_rent_roll_end_to_end() {
    let wizard: WizardInput = serde_json::from_str(MULTIFAMILY_JSON).unwrap();
    let result = underwrite(&wizard.to_underwriting_input());
    let vars = &result.result.variables;

    assert_eq!(vars.get(keys::RESIDENTIAL_UNIT_COUNT).copied(), number(dec!(3)));
    assert_eq!(vars.get(keys::TOTAL_CURRENT_RENT).copied(), number(dec!(3_550)));
    // 1,850 kept + 2,050 re-leased + 1,200 marked to market
    assert_eq!(vars.get(keys::TOTAL_PRO_FORMA_RENT).copied(), number(dec!(5_100)));
    // round(85% of 30) = 26 spaces at $75
    assert_eq!(vars.get(keys::AMENITY_INCOME_MONTHLY).copied(), number(dec!(1_950)));
    assert_eq!(vars.get(keys::AMENITY_INCOME_ANNUAL).copied(), number(dec!(23_400)));
    assert_eq!(vars.get(keys::MF_IMPLIED_VALUATION).copied(), number(dec!(6_000_000)));

    let exit = result.result.exit.as_ref().unwrap();
    assert_eq!(exit.streams[0].value_per_unit, Some(dec!(2_000_000)));
    // No sizing method switched on
    assert_eq!(vars.get(keys::AQ_MAX_LOAN).copied(), Some(VariableValue::NotAvailable));
}
