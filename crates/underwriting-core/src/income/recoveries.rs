use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

use crate::error::UnderwritingError;
use crate::types::{
    bounded_or_zero, clamp_percent, normalize_label, safe_div, with_metadata, ComputationOutput,
    Money, Month, Percent, Rate, SquareFeet, MAX_AMOUNT, MAX_FACTOR,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Who bears operating costs under a lease.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum RentType {
    /// Landlord pays operating costs
    #[default]
    Gross,
    /// Tenant reimburses operating costs
    Nnn,
}

/// How a recoverable expense row's `cost_per` converts to an annual amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum RecoveryFactor {
    /// `cost_per` is the annual amount
    Annual,
    /// `cost_per` dollars per rentable SF per year
    PerSfPerYear,
    /// `cost_per` percent of annual base rent
    PercentOfBaseRent,
}

/// Which lease types an expense is recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum RentTypeIncluded {
    Gross,
    Nnn,
    Both,
}

impl FromStr for RentType {
    type Err = UnderwritingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "gross" => Ok(RentType::Gross),
            "nnn" | "triplenet" => Ok(RentType::Nnn),
            _ => Err(unknown_label("rent_type", s)),
        }
    }
}

impl FromStr for RecoveryFactor {
    type Err = UnderwritingError;

    /// Accepts the rent roll's labels ("Annual", "Per SF / Yr.", "Percent
    /// of Base Rent") as well as the variant names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "annual" => Ok(RecoveryFactor::Annual),
            "persfyr" | "persf" | "persfperyear" => Ok(RecoveryFactor::PerSfPerYear),
            "percentofbaserent" => Ok(RecoveryFactor::PercentOfBaseRent),
            _ => Err(unknown_label("factor", s)),
        }
    }
}

impl FromStr for RentTypeIncluded {
    type Err = UnderwritingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "gross" => Ok(RentTypeIncluded::Gross),
            "nnn" | "triplenet" => Ok(RentTypeIncluded::Nnn),
            "both" => Ok(RentTypeIncluded::Both),
            _ => Err(unknown_label("rent_type_included", s)),
        }
    }
}

impl TryFrom<String> for RentType {
    type Error = UnderwritingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for RecoveryFactor {
    type Error = UnderwritingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for RentTypeIncluded {
    type Error = UnderwritingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One row of the commercial rent roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantLease {
    #[serde(default)]
    pub suite: String,
    #[serde(default)]
    pub tenant_name: String,
    pub square_feet: SquareFeet,
    #[serde(default)]
    pub lease_start_month: Month,
    #[serde(default)]
    pub lease_end_month: Month,
    #[serde(default)]
    pub rent_start_month: Month,
    #[serde(default)]
    pub annual_bumps_percent: Percent,
    #[serde(alias = "rent_per_square_foot_per_year")]
    pub rent_per_sf_per_year: Money,
    #[serde(default)]
    pub rent_type: RentType,
}

/// One recoverable operating expense row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoverableExpense {
    pub name: String,
    pub factor: RecoveryFactor,
    pub cost_per: Money,
    pub rent_type_included: RentTypeIncluded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryInput {
    pub tenants: Vec<TenantLease>,
    #[serde(default)]
    pub expenses: Vec<RecoverableExpense>,
    /// General vacancy, percent of GPI
    #[serde(default)]
    pub vacancy_percent: Percent,
}

/// A tenant row annotated with its rent and recovery share.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRecovery {
    pub suite: String,
    pub tenant_name: String,
    pub square_feet: SquareFeet,
    pub rent_type: RentType,
    /// Tenant SF / total SF
    pub share_of_total_sf: Rate,
    pub annual_base_rent: Money,
    pub annual_recovery: Money,
    pub recovery_per_sf: Money,
}

/// An expense row annotated with its annual amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecovery {
    pub name: String,
    pub factor: RecoveryFactor,
    pub rent_type_included: RentTypeIncluded,
    pub annual_amount: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryOutput {
    pub total_square_feet: SquareFeet,
    pub share_gross: Rate,
    pub share_nnn: Rate,
    pub base_annual_rent: Money,
    /// Annual expense totals by `rent_type_included`
    pub recoverable_both: Money,
    pub recoverable_gross: Money,
    pub recoverable_nnn: Money,
    /// Recovery charged per SF to a Gross tenant: (Both + Gross) / total SF
    pub recovery_per_sf_gross: Money,
    /// Recovery charged per SF to an NNN tenant: (Both + NNN) / total SF
    pub recovery_per_sf_nnn: Money,
    pub recovery_income: Money,
    pub gpi_before_vacancy: Money,
    pub gpi_before_vacancy_per_sf: Money,
    pub vacancy_deduction: Money,
    pub vacancy_deduction_per_sf: Money,
    pub gpi_after_vacancy: Money,
    pub gpi_after_vacancy_per_sf: Money,
    pub tenants: Vec<TenantRecovery>,
    pub expenses: Vec<ExpenseRecovery>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Allocate recoverable expenses across the rent roll and roll them into
/// Gross Potential Income before and after vacancy.
///
/// Expenses tagged `Both` are recovered in full; expenses tagged for one
/// lease type are pro-rated by that type's share of total square footage.
/// Everything is derived from the current rows; a zero total area reports
/// zero for every per-SF figure.
pub fn allocate_recoveries(input: &RecoveryInput) -> ComputationOutput<RecoveryOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let tenants: Vec<TenantLease> = input
        .tenants
        .iter()
        .map(|t| sanitize_tenant(t, &mut warnings))
        .collect();

    let vacancy_percent = clamp_percent(input.vacancy_percent, "Vacancy", &mut warnings);
    if vacancy_percent > dec!(15) {
        warnings.push(format!(
            "Vacancy rate {vacancy_percent:.1}% exceeds 15%; above typical market norms"
        ));
    }

    // --- Rent roll totals ---
    let total_square_feet: SquareFeet = tenants.iter().map(|t| t.square_feet).sum();
    let gross_sf: SquareFeet = tenants
        .iter()
        .filter(|t| t.rent_type == RentType::Gross)
        .map(|t| t.square_feet)
        .sum();
    let nnn_sf: SquareFeet = tenants
        .iter()
        .filter(|t| t.rent_type == RentType::Nnn)
        .map(|t| t.square_feet)
        .sum();

    let share_gross = safe_div(gross_sf, total_square_feet);
    let share_nnn = safe_div(nnn_sf, total_square_feet);

    let base_annual_rent: Money = tenants
        .iter()
        .map(|t| t.square_feet * t.rent_per_sf_per_year)
        .sum();

    // --- Expense annual amounts, partitioned by lease type ---
    let expenses: Vec<ExpenseRecovery> = input
        .expenses
        .iter()
        .map(|e| {
            let e = sanitize_expense(e, &mut warnings);
            ExpenseRecovery {
                annual_amount: expense_annual_amount(&e, total_square_feet, base_annual_rent),
                name: e.name,
                factor: e.factor,
                rent_type_included: e.rent_type_included,
            }
        })
        .collect();

    let recoverable_total = |included: RentTypeIncluded| -> Money {
        expenses
            .iter()
            .filter(|e| e.rent_type_included == included)
            .map(|e| e.annual_amount)
            .sum()
    };
    let recoverable_both = recoverable_total(RentTypeIncluded::Both);
    let recoverable_gross = recoverable_total(RentTypeIncluded::Gross);
    let recoverable_nnn = recoverable_total(RentTypeIncluded::Nnn);

    let recovery_income =
        recoverable_both + share_gross * recoverable_gross + share_nnn * recoverable_nnn;

    let recovery_per_sf_gross = safe_div(recoverable_both + recoverable_gross, total_square_feet);
    let recovery_per_sf_nnn = safe_div(recoverable_both + recoverable_nnn, total_square_feet);

    // --- Tenant annotations ---
    let tenant_rows: Vec<TenantRecovery> = tenants
        .iter()
        .map(|t| {
            let share = safe_div(t.square_feet, total_square_feet);
            let pool = match t.rent_type {
                RentType::Gross => recoverable_both + recoverable_gross,
                RentType::Nnn => recoverable_both + recoverable_nnn,
            };
            let annual_recovery = share * pool;
            TenantRecovery {
                suite: t.suite.clone(),
                tenant_name: t.tenant_name.clone(),
                square_feet: t.square_feet,
                rent_type: t.rent_type,
                share_of_total_sf: share,
                annual_base_rent: t.square_feet * t.rent_per_sf_per_year,
                annual_recovery,
                recovery_per_sf: safe_div(annual_recovery, t.square_feet),
            }
        })
        .collect();

    // --- Gross potential income ---
    let gpi_before_vacancy = base_annual_rent + recovery_income;
    let vacancy_deduction = gpi_before_vacancy * vacancy_percent / dec!(100);
    let gpi_after_vacancy = gpi_before_vacancy - vacancy_deduction;

    if total_square_feet.is_zero() && !input.expenses.is_empty() {
        warnings.push("Total square footage is zero; per-SF recoveries reported as 0".into());
    }

    let output = RecoveryOutput {
        total_square_feet,
        share_gross,
        share_nnn,
        base_annual_rent,
        recoverable_both,
        recoverable_gross,
        recoverable_nnn,
        recovery_per_sf_gross,
        recovery_per_sf_nnn,
        recovery_income,
        gpi_before_vacancy,
        gpi_before_vacancy_per_sf: safe_div(gpi_before_vacancy, total_square_feet),
        vacancy_deduction,
        vacancy_deduction_per_sf: safe_div(vacancy_deduction, total_square_feet),
        gpi_after_vacancy,
        gpi_after_vacancy_per_sf: safe_div(gpi_after_vacancy, total_square_feet),
        tenants: tenant_rows,
        expenses,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Recoverable Income Allocation (rent-type share weighting)",
        input,
        warnings,
        elapsed,
        output,
    )
}

/// Annual amount of one recoverable expense row.
pub fn expense_annual_amount(
    expense: &RecoverableExpense,
    total_square_feet: SquareFeet,
    base_annual_rent: Money,
) -> Money {
    match expense.factor {
        RecoveryFactor::Annual => expense.cost_per,
        RecoveryFactor::PerSfPerYear => expense.cost_per * total_square_feet,
        RecoveryFactor::PercentOfBaseRent => expense.cost_per / dec!(100) * base_annual_rent,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sanitize_tenant(tenant: &TenantLease, warnings: &mut Vec<String>) -> TenantLease {
    let mut t = tenant.clone();
    if t.square_feet < Decimal::ZERO {
        warnings.push(format!(
            "Tenant '{}' has negative square footage; treated as 0",
            display_name(&t)
        ));
        t.square_feet = Decimal::ZERO;
    }
    if t.rent_per_sf_per_year < Decimal::ZERO {
        warnings.push(format!(
            "Tenant '{}' has negative rent; treated as 0",
            display_name(&t)
        ));
        t.rent_per_sf_per_year = Decimal::ZERO;
    }
    let label = format!("Tenant '{}' square footage", display_name(&t));
    t.square_feet = bounded_or_zero(t.square_feet, MAX_AMOUNT, &label, warnings);
    let label = format!("Tenant '{}' rent", display_name(&t));
    t.rent_per_sf_per_year = bounded_or_zero(t.rent_per_sf_per_year, MAX_AMOUNT, &label, warnings);
    t
}

fn sanitize_expense(expense: &RecoverableExpense, warnings: &mut Vec<String>) -> RecoverableExpense {
    let mut e = expense.clone();
    let max = match e.factor {
        RecoveryFactor::PercentOfBaseRent => MAX_FACTOR,
        RecoveryFactor::Annual | RecoveryFactor::PerSfPerYear => MAX_AMOUNT,
    };
    let label = format!("'{}' cost", e.name);
    e.cost_per = bounded_or_zero(e.cost_per, max, &label, warnings);
    e
}

fn unknown_label(field: &str, label: &str) -> UnderwritingError {
    UnderwritingError::InvalidInput {
        field: field.into(),
        reason: format!("Unrecognised value '{label}'"),
    }
}

fn display_name(t: &TenantLease) -> &str {
    if t.tenant_name.is_empty() {
        &t.suite
    } else {
        &t.tenant_name
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
