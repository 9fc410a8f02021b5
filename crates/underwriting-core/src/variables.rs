//! The wizard's string-keyed boundary.
//!
//! Inputs arrive as `[{ "field_key": ..., "value": ... }]` with values typed
//! however the form captured them; outputs leave as a flat map of display
//! names to rounded decimals or `"N/A"`. String keys live only here and in
//! [`crate::model`].

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::types::{round_half_up, Month};
use crate::UnderwritingResult;

/// Field keys used by the wizard, input and output side.
pub mod keys {
    // --- Property ---
    pub const PROPERTY_TYPE: &str = "Property Type";
    pub const NUMBER_OF_UNITS: &str = "Number of Units";
    pub const VACANCY: &str = "Vacancy";

    // --- Acquisition loan inputs ---
    pub const ACQUISITION_PRICE: &str = "Acquisition Price";
    pub const AQ_INTEREST_RATE: &str = "Acquisition Loan Interest Rate";
    pub const AQ_AMORTIZATION: &str = "Acquisition Loan Amortization";
    pub const AQ_LTV_ENABLED: &str = "Acquisition Loan: LTV Calculation";
    pub const AQ_DSCR_ENABLED: &str = "Acquisition Loan: Debt-Service Coverage Ratio Calculation";
    pub const AQ_DEBT_YIELD_ENABLED: &str = "Acquisition Loan: Debt Yield Calculation";
    pub const AQ_FIXED_ENABLED: &str = "Acquisition Loan: Fixed Loan Amount Selected";
    pub const LTV: &str = "Loan-to-Value (LTV)";
    pub const FINANCE_HARD_COSTS: &str = "Finance Hard Costs?";
    pub const LTC_ON_HARD_COSTS: &str = "LTC on Hard Costs";
    pub const HARD_COST_AMOUNT: &str = "Hard Cost Amount";
    pub const INTEREST_RESERVE_MONTHS: &str = "Lender's Minimum Required Interest Reserve";
    pub const MIN_DSCR: &str = "Minimum DSCR";
    pub const MIN_DEBT_YIELD: &str = "Minimum Debt Yield";
    pub const FIXED_LOAN_AMOUNT: &str = "Fixed Loan Amount";

    // --- Refinance inputs ---
    pub const PERMANENT_LOAN_ISSUED: &str = "Permanent Loan Issued?";
    pub const REFI_MONTH: &str = "Refinancing Month";
    pub const REFI_INTEREST_RATE: &str = "Refinancing: Fixed Interest Rate";
    pub const REFI_AMORTIZATION: &str = "Refi Amortization";
    pub const REFI_ORIGINATION_COST: &str = "Origination Cost (Includes Title)";
    pub const REFI_SPONSOR_SHARE: &str = "Share of Equity from Sponsor";
    pub const REFI_CAP_RATE: &str = "Applied Cap Rate for Valuation at Refi";
    pub const REFI_LTV_MAX: &str = "LTV Max";
    pub const REFI_MIN_DSCR: &str = "Minimum Debt-Service-Coverage Ratio";
    pub const REFI_DEBT_YIELD_MIN: &str = "Debt Yield Min";

    // --- Leasing inputs ---
    pub const RENEWAL_PROBABILITY: &str = "Renewal Property: Renewal Lease";
    pub const RENT_NEW: &str = "Retail Rent: New Lease";
    pub const RENT_RENEWAL: &str = "Retail Rent: Renewal Lease";
    pub const TI_NEW: &str = "TI's: New Lease";
    pub const TI_RENEWAL: &str = "TI's: Renewal Lease";
    pub const COMMISSION_NEW: &str = "Leasing Commissions: New Lease";
    pub const COMMISSION_RENEWAL: &str = "Leasing Commissions: Renewal Lease";
    pub const TERM_NEW: &str = "Lease Term: New Lease";
    pub const TERM_RENEWAL: &str = "Lease Term: Renewal Lease";

    // --- Exit inputs ---
    pub const MF_EXIT_MONTH: &str = "Multifamily Exit Month";
    pub const MF_EXIT_CAP_RATE: &str = "Multifamily Applied Exit Cap Rate";
    pub const MF_SELLING_COSTS: &str = "Multifamily Less: Selling Costs";
    pub const RETAIL_EXIT_MONTH: &str = "Retail Exit Month";
    pub const RETAIL_EXIT_CAP_RATE: &str = "Retail Applied Exit Cap Rate";
    pub const RETAIL_SELLING_COSTS: &str = "Retail Less: Selling Costs";

    // --- NOI supplied by the operating model ---
    pub const AQ_NOI: &str = "AQ: Annualized NOI in Month";
    pub const REFI_NOI: &str = "Refi: Annualized NOI in Month";
    pub const FORWARD_NOI: &str = "Forward NOI in Month";
    pub const RETAIL_FORWARD_NOI: &str = "Retail: Forward NOI in Month";

    // --- Acquisition loan outputs ---
    pub const AQ_MAX_LOAN: &str = "AQ: Max Acquisition Loan at Closing";
    pub const AQ_LOAN_LTC: &str = "AQ: Max Loan Size Based on LTC";
    pub const AQ_LOAN_DSCR: &str = "AQ: Max Loan Size Based on DSCR";
    pub const AQ_LOAN_DEBT_YIELD: &str = "AQ: Max Loan Size Based on Debt Yield";
    pub const AQ_LOAN_FIXED: &str = "AQ: Exact Loan Amount";
    pub const AQ_ANNUAL_DEBT_SERVICE: &str = "AQ: Annual Debt Service";
    pub const AQ_MONTHLY_DEBT_SERVICE: &str = "AQ: Monthly Debt Service";
    pub const AQ_DSCR: &str = "AQ: DSCR";
    pub const AQ_LTV: &str = "AQ: LTV";
    pub const AQ_INTEREST_RESERVE: &str = "AQ: Interest Reserve";

    // --- Refinance outputs ---
    pub const REFI_LTV_CALC: &str = "Refi: LTV calculation";
    pub const REFI_DSCR_CALC: &str = "Refi: DSCR calculation";
    pub const REFI_DEBT_YIELD_CALC: &str = "Refi: Debt Yield calculation";
    pub const REFI_MAX_LOAN: &str = "Refi: Max Perm Loan";
    pub const REFI_LOAN_FACTOR: &str = "Refi: Loan Factor";
    pub const REFI_VALUATION: &str = "Refi: Implied Valuation";
    pub const REFI_NET_PROCEEDS: &str = "Refi: Loan Proceeds net of fees";
    pub const REFI_CASH_OUT: &str = "Refi: Proceeds from Cashout";
    pub const REFI_SPONSOR_CASH_OUT: &str = "Refi: Sponsor Share of Cashout";
    pub const REFI_ANNUAL_DEBT_SERVICE: &str = "Refi: Annual Debt Service";
    pub const REFI_MONTHLY_DEBT_SERVICE: &str = "Refi: Monthly Debt Service";
    pub const AQ_BALANCE_OUTSTANDING: &str = "Acquisition Loan Balance Outstanding";

    // --- Income and leasing outputs ---
    pub const BASE_ANNUAL_RENT: &str = "Base Annual Rent";
    pub const RECOVERY_INCOME: &str = "Recovery Income";
    pub const GPI_BEFORE_VACANCY: &str = "Gross Potential Income";
    pub const GPI_BEFORE_VACANCY_PER_SF: &str = "Gross Potential Income per SF";
    pub const VACANCY_DEDUCTION: &str = "Less: General Vacancy";
    pub const GPI_AFTER_VACANCY: &str = "Gross Potential Income after Vacancy";
    pub const GPI_AFTER_VACANCY_PER_SF: &str = "Gross Potential Income after Vacancy per SF";
    pub const TOTAL_OPERATING_EXPENSES: &str = "Total Operating Expenses";
    pub const LEASING_RESERVE: &str = "Leasing Cost Reserve";
    pub const LEASING_RESERVE_PER_SF: &str = "Leasing Cost Reserve per SF";

    // --- Residential outputs ---
    pub const RESIDENTIAL_UNIT_COUNT: &str = "Total Units";
    pub const RESIDENTIAL_SQUARE_FEET: &str = "Total Unit Square Feet";
    pub const TOTAL_CURRENT_RENT: &str = "Total Monthly Rent";
    pub const TOTAL_PRO_FORMA_RENT: &str = "Pro Forma Rent";
    pub const ANNUAL_PRO_FORMA_RENT: &str = "Pro Forma Annual Rent";
    pub const AMENITY_INCOME_MONTHLY: &str = "Amenity Income";
    pub const AMENITY_INCOME_ANNUAL: &str = "Total Amenity Income";

    // --- Exit outputs ---
    pub const MF_IMPLIED_VALUATION: &str = "Implied Valuation at Exit";
    pub const MF_SELLING_COSTS_AMOUNT: &str = "Selling Costs";
    pub const MF_NET_REVERSION: &str = "Net Reversion Proceeds";
    pub const RETAIL_IMPLIED_VALUATION: &str = "Retail: Implied Valuation at Exit";
    pub const RETAIL_SELLING_COSTS_AMOUNT: &str = "Retail: Selling Costs";
    pub const RETAIL_NET_REVERSION: &str = "Retail: Net Reversion Proceeds";
    pub const COMBINED_IMPLIED_VALUATION: &str = "Combined Implied Valuation at Exit";
    pub const BLENDED_EXIT_CAP_RATE: &str = "Blended Exit Cap Rate";
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One `{ field_key, value }` entry as the wizard stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldValue {
    pub field_key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Field values indexed by trimmed key. Later entries override earlier ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldValues {
    values: BTreeMap<String, serde_json::Value>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the wizard's JSON array of field values.
    pub fn from_json(json: &str) -> UnderwritingResult<Self> {
        let entries: Vec<FieldValue> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = FieldValue>) -> Self {
        let mut fields = Self::new();
        for entry in entries {
            fields.insert(&entry.field_key, entry.value);
        }
        fields
    }

    pub fn insert(&mut self, key: &str, value: impl Into<serde_json::Value>) {
        self.values.insert(key.trim().to_string(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key.trim())
    }

    pub fn raw(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key.trim())
    }

    /// Numeric value, or `None` when absent, blank or unparseable.
    pub fn decimal(&self, key: &str) -> Option<Decimal> {
        self.raw(key).and_then(parse_decimal)
    }

    pub fn decimal_or(&self, key: &str, default: Decimal) -> Decimal {
        self.decimal(key).unwrap_or(default)
    }

    /// Yes/no flag, or `None` when absent or unrecognised.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.raw(key).and_then(parse_flag)
    }

    /// Whole, non-negative month or year count.
    pub fn whole(&self, key: &str) -> Option<Month> {
        let d = self.decimal(key)?;
        if d < Decimal::ZERO {
            return None;
        }
        d.trunc().to_u32()
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.raw(key)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse a form value as a decimal.
///
/// Accepts JSON numbers and strings carrying thousands separators, a leading
/// `$`, a trailing `%`, or accounting-style parentheses for negatives.
pub fn parse_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                // Go through the literal text so 6.75 stays 6.75
                Decimal::from_str(&n.to_string())
                    .ok()
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            }
        }
        serde_json::Value::String(s) => parse_decimal_str(s),
        _ => None,
    }
}

fn parse_decimal_str(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let (negative, body) = match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%' | ' '))
        .collect();
    let parsed = Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()?;
    Some(if negative { -parsed } else { parsed })
}

/// Parse a yes/no form value.
pub fn parse_flag(value: &serde_json::Value) -> Option<bool> {
    match value {
        serde_json::Value::Bool(b) => Some(*b),
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Some(true),
            "no" | "n" | "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// A display value: a rounded decimal or "N/A".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableValue {
    Number(Decimal),
    NotAvailable,
}

impl VariableValue {
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            VariableValue::Number(d) => Some(*d),
            VariableValue::NotAvailable => None,
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableValue::Number(d) => write!(f, "{d}"),
            VariableValue::NotAvailable => write!(f, "N/A"),
        }
    }
}

impl Serialize for VariableValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            VariableValue::Number(d) => Serialize::serialize(d, serializer),
            VariableValue::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

/// Flat metric map handed back to the wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, VariableValue>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dollar amount, rounded to cents.
    pub fn money(&mut self, key: &str, value: Option<Decimal>) {
        self.put(key, value, 2);
    }

    /// Ratio or multiple, rounded to 4 dp.
    pub fn ratio(&mut self, key: &str, value: Option<Decimal>) {
        self.put(key, value, 4);
    }

    /// Fraction reported as a percent, rounded to 4 dp.
    pub fn percent_of(&mut self, key: &str, fraction: Option<Decimal>) {
        self.put(key, fraction.and_then(|f| f.checked_mul(dec!(100))), 4);
    }

    pub fn get(&self, key: &str) -> Option<&VariableValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn put(&mut self, key: &str, value: Option<Decimal>, dp: u32) {
        let v = match value {
            Some(d) => VariableValue::Number(round_half_up(d, dp).normalize()),
            None => VariableValue::NotAvailable,
        };
        self.0.insert(key.to_string(), v);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnderwritingError;
    use serde_json::json;

    #[test]
    fn test_parse_formatted_strings() {
        assert_eq!(parse_decimal(&json!("1,250,000")), Some(dec!(1_250_000)));
        assert_eq!(parse_decimal(&json!("$5,500,000.50")), Some(dec!(5_500_000.50)));
        assert_eq!(parse_decimal(&json!("(500)")), Some(dec!(-500)));
        assert_eq!(parse_decimal(&json!("6.75%")), Some(dec!(6.75)));
        assert_eq!(parse_decimal(&json!("")), None);
        assert_eq!(parse_decimal(&json!("abc")), None);
        assert_eq!(parse_decimal(&json!(null)), None);
    }

    #[test]
    fn test_parse_json_numbers() {
        assert_eq!(parse_decimal(&json!(30)), Some(dec!(30)));
        assert_eq!(parse_decimal(&json!(6.75)), Some(dec!(6.75)));
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(parse_flag(&json!("Yes")), Some(true));
        assert_eq!(parse_flag(&json!("no")), Some(false));
        assert_eq!(parse_flag(&json!(true)), Some(true));
        assert_eq!(parse_flag(&json!("maybe")), None);
    }

    #[test]
    fn test_field_values_trim_keys() {
        let fields = FieldValues::from_json(
            r#"[{"field_key": "Vacancy ", "value": "5"}, {"field_key": "Acquisition Price", "value": 5500000}]"#,
        )
        .unwrap();
        assert_eq!(fields.decimal(keys::VACANCY), Some(dec!(5)));
        assert_eq!(fields.decimal(keys::ACQUISITION_PRICE), Some(dec!(5_500_000)));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_whole_numbers() {
        let mut fields = FieldValues::new();
        fields.insert("Refi Amortization", "30");
        fields.insert("Refinancing Month", -3);
        assert_eq!(fields.whole("Refi Amortization"), Some(30));
        assert_eq!(fields.whole("Refinancing Month"), None);
    }

    #[test]
    fn test_bad_json_is_serialization_error() {
        let err = FieldValues::from_json("not json").unwrap_err();
        assert!(matches!(err, UnderwritingError::SerializationError(_)));
    }

    #[test]
    fn test_variables_round_and_na() {
        let mut vars = Variables::new();
        vars.money(keys::AQ_MAX_LOAN, Some(dec!(3_711_234.5678)));
        vars.ratio(keys::AQ_DSCR, Some(dec!(1.234567)));
        vars.percent_of(keys::AQ_LTV, Some(dec!(0.65)));
        vars.money(keys::REFI_MAX_LOAN, None);
        assert_eq!(vars.get(keys::AQ_MAX_LOAN), Some(&VariableValue::Number(dec!(3_711_234.57))));
        assert_eq!(vars.get(keys::AQ_DSCR), Some(&VariableValue::Number(dec!(1.2346))));
        assert_eq!(vars.get(keys::AQ_LTV), Some(&VariableValue::Number(dec!(65))));
        assert_eq!(vars.get(keys::REFI_MAX_LOAN), Some(&VariableValue::NotAvailable));

        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(json[keys::REFI_MAX_LOAN], json!("N/A"));
        assert_eq!(json[keys::AQ_MAX_LOAN], json!("3711234.57"));
    }

    #[test]
    fn test_number_serializes_through_serde() {
        let json = serde_json::to_string(&VariableValue::Number(dec!(1.25))).unwrap();
        assert_eq!(json, r#""1.25""#);
    }

    #[test]
    fn test_negative_ties_round_toward_positive_infinity() {
        let mut vars = Variables::new();
        vars.money(keys::REFI_CASH_OUT, Some(dec!(-10.005)));
        vars.percent_of(keys::AQ_LTV, Some(Decimal::MAX));
        assert_eq!(vars.get(keys::REFI_CASH_OUT), Some(&VariableValue::Number(dec!(-10))));
        assert_eq!(vars.get(keys::AQ_LTV), Some(&VariableValue::NotAvailable));
    }
}
