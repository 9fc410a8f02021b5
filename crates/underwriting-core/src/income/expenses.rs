use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

use crate::error::UnderwritingError;
use crate::types::{
    bounded_opt, bounded_or_zero, normalize_label, round_half_up, with_metadata,
    ComputationOutput, Money, Month, MAX_AMOUNT, MAX_FACTOR,
};

const PROPERTY_TAXES: &str = "Property Taxes";
const INSURANCE: &str = "Insurance";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How an operating expense row's `cost_per` becomes an annual amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ExpenseFactor {
    /// `cost_per` is the annual amount
    Total,
    /// `cost_per` times the unit count in `statistic`
    PerUnit,
    /// `cost_per` times the square footage in `statistic`
    PerSf,
    /// `cost_per` times the number of months in `statistic`
    PerMonth,
    PercentOfPurchasePrice,
    PercentOfAcquisitionLoan,
    /// Percent of the row named "Property Taxes"
    PercentOfPropertyTaxes,
    /// Percent of the row named "Insurance"
    PercentOfInsurance,
    /// Percent of every other row's annual amount
    PercentOfOtherExpenses,
}

impl ExpenseFactor {
    /// Annual amount derives from the schedule inputs alone, not other rows.
    fn is_direct(self) -> bool {
        !matches!(
            self,
            ExpenseFactor::PercentOfPropertyTaxes
                | ExpenseFactor::PercentOfInsurance
                | ExpenseFactor::PercentOfOtherExpenses
        )
    }

    pub fn depends_on_loan(self) -> bool {
        matches!(self, ExpenseFactor::PercentOfAcquisitionLoan)
    }

    fn is_percent(self) -> bool {
        !matches!(
            self,
            ExpenseFactor::Total
                | ExpenseFactor::PerUnit
                | ExpenseFactor::PerSf
                | ExpenseFactor::PerMonth
        )
    }
}

impl FromStr for ExpenseFactor {
    type Err = UnderwritingError;

    /// Accepts the expense grid's labels ("per Unit", "Percent of Insurance
    /// Cost", "Total percent of other expenses", ...) and the variant names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "total" => Ok(ExpenseFactor::Total),
            "perunit" => Ok(ExpenseFactor::PerUnit),
            "persf" => Ok(ExpenseFactor::PerSf),
            "permonth" => Ok(ExpenseFactor::PerMonth),
            "percentofpurchaseprice" => Ok(ExpenseFactor::PercentOfPurchasePrice),
            "percentofacquisitionloan" => Ok(ExpenseFactor::PercentOfAcquisitionLoan),
            "percentofpropertytaxes" => Ok(ExpenseFactor::PercentOfPropertyTaxes),
            "percentofinsurance" | "percentofinsurancecost" => Ok(ExpenseFactor::PercentOfInsurance),
            "percentofotherexpenses" | "totalpercentofotherexpenses" => {
                Ok(ExpenseFactor::PercentOfOtherExpenses)
            }
            _ => Err(UnderwritingError::InvalidInput {
                field: "factor".into(),
                reason: format!("Unrecognised value '{s}'"),
            }),
        }
    }
}

impl TryFrom<String> for ExpenseFactor {
    type Error = UnderwritingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatingExpense {
    pub name: String,
    pub factor: ExpenseFactor,
    pub cost_per: Money,
    #[serde(default)]
    pub statistic: Decimal,
    /// First model month of the expense period (default 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_month: Option<Month>,
    /// Last model month of the expense period (default 12)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_month: Option<Month>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseScheduleInput {
    pub expenses: Vec<OperatingExpense>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
    /// Bound acquisition loan; absent until the loan has been sized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition_loan: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledExpense {
    pub name: String,
    pub factor: ExpenseFactor,
    pub annual_amount: Money,
    pub months_in_period: u32,
    /// Annual spread over the period, rounded to cents
    pub monthly_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseScheduleOutput {
    pub expenses: Vec<ScheduledExpense>,
    pub total_annual: Money,
    pub total_monthly: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Convert each operating expense row to its annual and monthly amounts.
///
/// Rows are resolved in three passes: direct factors first, then rows that
/// reference "Property Taxes" or "Insurance", then percent-of-other rows
/// against the sum of everything else.
pub fn schedule_operating_expenses(
    input: &ExpenseScheduleInput,
) -> ComputationOutput<ExpenseScheduleOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let purchase_price = bounded_opt(input.purchase_price, MAX_AMOUNT, "Purchase price", &mut warnings);
    let acquisition_loan =
        bounded_opt(input.acquisition_loan, MAX_AMOUNT, "Acquisition loan", &mut warnings);
    let rows: Vec<OperatingExpense> = input
        .expenses
        .iter()
        .map(|row| sanitize_row(row, &mut warnings))
        .collect();
    let rows = &rows;
    let mut annual: Vec<Money> = vec![Decimal::ZERO; rows.len()];

    // Pass 1: direct factors
    for (i, row) in rows.iter().enumerate() {
        if row.factor.is_direct() {
            annual[i] = direct_annual(row, purchase_price, acquisition_loan, &mut warnings);
        }
    }

    // Pass 2: percent of a named row
    for (i, row) in rows.iter().enumerate() {
        let target = match row.factor {
            ExpenseFactor::PercentOfPropertyTaxes => PROPERTY_TAXES,
            ExpenseFactor::PercentOfInsurance => INSURANCE,
            _ => continue,
        };
        let base = named_row_annual(rows, &annual, target, &mut warnings);
        annual[i] = row.cost_per / dec!(100) * base;
    }

    // Pass 3: percent of all other rows
    let others: Money = rows
        .iter()
        .zip(&annual)
        .filter(|(row, _)| row.factor != ExpenseFactor::PercentOfOtherExpenses)
        .map(|(_, amount)| *amount)
        .sum();
    for (i, row) in rows.iter().enumerate() {
        if row.factor == ExpenseFactor::PercentOfOtherExpenses {
            annual[i] = row.cost_per / dec!(100) * others;
        }
    }

    let expenses: Vec<ScheduledExpense> = rows
        .iter()
        .zip(annual)
        .map(|(row, annual_amount)| {
            let months_in_period = months_in_period(row, &mut warnings);
            let monthly_amount = round_half_up(annual_amount / Decimal::from(months_in_period), 2);
            ScheduledExpense {
                name: row.name.clone(),
                factor: row.factor,
                annual_amount,
                months_in_period,
                monthly_amount,
            }
        })
        .collect();

    let total_annual: Money = expenses.iter().map(|e| e.annual_amount).sum();
    let total_monthly: Money = expenses.iter().map(|e| e.monthly_amount).sum();

    let output = ExpenseScheduleOutput {
        expenses,
        total_annual,
        total_monthly,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Operating Expense Schedule (factor-based annualization)",
        input,
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn direct_annual(
    row: &OperatingExpense,
    purchase_price: Option<Money>,
    acquisition_loan: Option<Money>,
    warnings: &mut Vec<String>,
) -> Money {
    match row.factor {
        ExpenseFactor::Total => row.cost_per,
        ExpenseFactor::PerUnit | ExpenseFactor::PerSf | ExpenseFactor::PerMonth => {
            row.cost_per * row.statistic
        }
        ExpenseFactor::PercentOfPurchasePrice => match purchase_price {
            Some(price) => row.cost_per / dec!(100) * price,
            None => {
                warnings.push(format!("'{}': no acquisition price; reported as 0", row.name));
                Decimal::ZERO
            }
        },
        ExpenseFactor::PercentOfAcquisitionLoan => match acquisition_loan {
            Some(loan) => row.cost_per / dec!(100) * loan,
            None => {
                warnings.push(format!("'{}': acquisition loan not sized; reported as 0", row.name));
                Decimal::ZERO
            }
        },
        _ => Decimal::ZERO,
    }
}

/// Annual amount of the row whose name matches `target`, ignoring case and
/// surrounding whitespace. Only direct rows can be referenced.
fn named_row_annual(
    rows: &[OperatingExpense],
    annual: &[Money],
    target: &str,
    warnings: &mut Vec<String>,
) -> Money {
    let found = rows
        .iter()
        .zip(annual)
        .find(|(row, _)| row.name.trim().eq_ignore_ascii_case(target));

    match found {
        Some((row, amount)) if row.factor.is_direct() => *amount,
        Some(_) => {
            warnings.push(format!("'{target}' row is itself a percentage of another row; treated as 0"));
            Decimal::ZERO
        }
        None => {
            warnings.push(format!("No '{target}' row in the schedule; treated as 0"));
            Decimal::ZERO
        }
    }
}

fn months_in_period(row: &OperatingExpense, warnings: &mut Vec<String>) -> u32 {
    let start = row.start_month.unwrap_or(1);
    let end = row.end_month.unwrap_or(12);
    if end < start {
        warnings.push(format!(
            "'{}': end month {end} precedes start month {start}; using 12 months",
            row.name
        ));
        return 12;
    }
    (end - start).saturating_add(1)
}

fn sanitize_row(row: &OperatingExpense, warnings: &mut Vec<String>) -> OperatingExpense {
    let mut r = row.clone();
    let max = if r.factor.is_percent() { MAX_FACTOR } else { MAX_AMOUNT };
    r.cost_per = bounded_or_zero(r.cost_per, max, &format!("'{}' cost", r.name), warnings);
    r.statistic = bounded_or_zero(r.statistic, MAX_AMOUNT, &format!("'{}' statistic", r.name), warnings);
    r
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
