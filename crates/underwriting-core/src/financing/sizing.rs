use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::amortization::{self, LoanTerms};
use crate::types::{bounded, checked_ratio, Money, Multiple, Percent, Rate, MAX_AMOUNT, MAX_FACTOR};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan sizing methodology. Declaration order is the tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizingMethod {
    Ltv,
    Dscr,
    DebtYield,
    Fixed,
}

impl SizingMethod {
    /// Fixed evaluation and tie-break order.
    pub const PRIORITY: [SizingMethod; 4] = [
        SizingMethod::Ltv,
        SizingMethod::Dscr,
        SizingMethod::DebtYield,
        SizingMethod::Fixed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SizingMethod::Ltv => "LTV",
            SizingMethod::Dscr => "DSCR",
            SizingMethod::DebtYield => "Debt Yield",
            SizingMethod::Fixed => "Fixed Loan Amount",
        }
    }
}

/// Loan-to-value sizing, optionally financing a share of hard costs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LtvMethod {
    pub enabled: bool,
    /// Maximum loan-to-value, percent
    pub ltv_percent: Percent,
    #[serde(default)]
    pub finance_hard_costs: bool,
    #[serde(default)]
    pub hard_cost_amount: Money,
    /// Loan-to-cost applied to hard costs, percent
    #[serde(default)]
    pub hard_cost_ltc_percent: Percent,
}

/// Debt-service-coverage sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DscrMethod {
    pub enabled: bool,
    pub min_dscr: Multiple,
}

/// Debt-yield sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtYieldMethod {
    pub enabled: bool,
    /// Minimum NOI / loan, percent
    pub min_debt_yield_percent: Percent,
}

/// A user-supplied loan amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedMethod {
    pub enabled: bool,
    pub amount: Money,
}

/// The sizing methods configured for a loan. Absent methods are disabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingMethods {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ltv: Option<LtvMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscr: Option<DscrMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_yield: Option<DebtYieldMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed: Option<FixedMethod>,
}

impl SizingMethods {
    pub fn is_enabled(&self, method: SizingMethod) -> bool {
        match method {
            SizingMethod::Ltv => self.ltv.as_ref().is_some_and(|m| m.enabled),
            SizingMethod::Dscr => self.dscr.as_ref().is_some_and(|m| m.enabled),
            SizingMethod::DebtYield => self.debt_yield.as_ref().is_some_and(|m| m.enabled),
            SizingMethod::Fixed => self.fixed.as_ref().is_some_and(|m| m.enabled),
        }
    }

    pub fn any_enabled(&self) -> bool {
        SizingMethod::PRIORITY.iter().any(|m| self.is_enabled(*m))
    }
}

/// Income and value a loan is sized against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SizingBasis {
    /// Purchase price, or the cap-rate-implied valuation when refinancing
    pub value: Option<Money>,
    /// Annualized NOI at the sizing month
    pub noi: Option<Money>,
}

/// Debt metrics for a candidate loan amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanMetrics {
    pub annual_debt_service: Money,
    pub monthly_debt_service: Money,
    /// NOI / annual debt service
    pub dscr: Option<Multiple>,
    /// Loan / value, as a fraction
    pub ltv: Option<Rate>,
    /// NOI / loan, as a fraction
    pub debt_yield: Option<Rate>,
}

/// Outcome of one sizing method for one evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanMethodResult {
    pub method: SizingMethod,
    /// `None` when the method cannot be sized from current inputs
    pub candidate_loan_amount: Option<Money>,
    pub enabled: bool,
    pub supporting_inputs: BTreeMap<String, Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<LoanMetrics>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Size every configured method against `basis`, in priority order.
///
/// Methods that are configured but disabled are still computed so their
/// figures remain visible; selection skips them. Inputs that cannot produce
/// a loan (missing NOI, zero coverage minimums, invalid terms) give a `None`
/// candidate and a warning rather than an error.
pub fn evaluate_methods(
    methods: &SizingMethods,
    basis: &SizingBasis,
    terms: &LoanTerms,
    warnings: &mut Vec<String>,
) -> Vec<LoanMethodResult> {
    let mut results = Vec::with_capacity(SizingMethod::PRIORITY.len());

    if let Some(m) = &methods.ltv {
        let mut r = size_by_ltv(m, basis.value, warnings);
        r.metrics = r
            .candidate_loan_amount
            .and_then(|amount| loan_metrics(amount, basis, terms, warnings));
        results.push(r);
    }
    if let Some(m) = &methods.dscr {
        let mut r = size_by_dscr(m, basis.noi, terms, warnings);
        r.metrics = r
            .candidate_loan_amount
            .and_then(|amount| loan_metrics(amount, basis, terms, warnings));
        results.push(r);
    }
    if let Some(m) = &methods.debt_yield {
        let mut r = size_by_debt_yield(m, basis.noi, warnings);
        r.metrics = r
            .candidate_loan_amount
            .and_then(|amount| loan_metrics(amount, basis, terms, warnings));
        results.push(r);
    }
    if let Some(m) = &methods.fixed {
        let mut r = size_fixed(m, warnings);
        r.metrics = r
            .candidate_loan_amount
            .and_then(|amount| loan_metrics(amount, basis, terms, warnings));
        results.push(r);
    }

    results
}

/// `value * LTV% + (financed hard costs * LTC%)`
pub fn size_by_ltv(
    method: &LtvMethod,
    value: Option<Money>,
    warnings: &mut Vec<String>,
) -> LoanMethodResult {
    let mut supporting = BTreeMap::new();
    supporting.insert("ltv_percent".to_string(), method.ltv_percent);

    let ltv_percent = bounded(method.ltv_percent, MAX_FACTOR, "LTV", warnings);
    let hard_cost_loan = if method.finance_hard_costs {
        supporting.insert("hard_cost_amount".to_string(), method.hard_cost_amount);
        supporting.insert("hard_cost_ltc_percent".to_string(), method.hard_cost_ltc_percent);
        let amount = bounded(method.hard_cost_amount, MAX_AMOUNT, "Hard cost amount", warnings);
        let ltc = bounded(method.hard_cost_ltc_percent, MAX_FACTOR, "LTC on hard costs", warnings);
        amount.zip(ltc).map(|(amount, ltc)| amount * ltc / dec!(100))
    } else {
        Some(Decimal::ZERO)
    };

    let candidate = match value {
        Some(v) => {
            supporting.insert("value_basis".to_string(), v);
            ltv_percent
                .zip(hard_cost_loan)
                .and_then(|(ltv, hard_cost_loan)| {
                    (v.checked_mul(ltv)? / dec!(100)).checked_add(hard_cost_loan)
                })
                .map(|loan| loan.max(Decimal::ZERO))
        }
        None => {
            if method.enabled {
                warnings.push("LTV sizing: property value not available; N/A".into());
            }
            None
        }
    };

    if method.ltv_percent > dec!(100) {
        warnings.push(format!(
            "LTV of {}% exceeds 100%; verify lender terms",
            method.ltv_percent
        ));
    }

    LoanMethodResult {
        method: SizingMethod::Ltv,
        candidate_loan_amount: candidate,
        enabled: method.enabled,
        supporting_inputs: supporting,
        metrics: None,
    }
}

/// `NOI / min DSCR / loan constant`
pub fn size_by_dscr(
    method: &DscrMethod,
    noi: Option<Money>,
    terms: &LoanTerms,
    warnings: &mut Vec<String>,
) -> LoanMethodResult {
    let mut supporting = BTreeMap::new();
    supporting.insert("min_dscr".to_string(), method.min_dscr);
    supporting.insert("annual_rate_percent".to_string(), terms.annual_rate_percent);
    supporting.insert(
        "amortization_years".to_string(),
        Decimal::from(terms.amortization_years),
    );

    let constant = match terms.loan_constant() {
        Ok(c) => {
            supporting.insert("loan_constant".to_string(), c);
            Some(c)
        }
        Err(e) => {
            warnings.push(format!("DSCR sizing: {e}"));
            None
        }
    };
    let min_dscr = bounded(method.min_dscr, MAX_FACTOR, "Minimum DSCR", warnings);

    let candidate = match (noi, constant, min_dscr) {
        (None, _, _) => {
            if method.enabled {
                warnings.push("DSCR sizing: NOI not available; N/A".into());
            }
            None
        }
        (Some(_), None, _) | (Some(_), _, None) => None,
        (Some(_), Some(_), Some(min)) if min <= Decimal::ZERO => {
            warnings.push("DSCR sizing: minimum DSCR must be positive; N/A".into());
            None
        }
        (Some(noi), Some(c), Some(min)) => {
            supporting.insert("noi".to_string(), noi);
            checked_ratio(noi, min)
                .and_then(|coverage| checked_ratio(coverage, c))
                .map(|loan| loan.max(Decimal::ZERO))
        }
    };

    LoanMethodResult {
        method: SizingMethod::Dscr,
        candidate_loan_amount: candidate,
        enabled: method.enabled,
        supporting_inputs: supporting,
        metrics: None,
    }
}

/// `NOI / (min debt yield% / 100)`
pub fn size_by_debt_yield(
    method: &DebtYieldMethod,
    noi: Option<Money>,
    warnings: &mut Vec<String>,
) -> LoanMethodResult {
    let mut supporting = BTreeMap::new();
    supporting.insert(
        "min_debt_yield_percent".to_string(),
        method.min_debt_yield_percent,
    );
    let min_debt_yield = bounded(
        method.min_debt_yield_percent,
        MAX_FACTOR,
        "Minimum debt yield",
        warnings,
    );

    let candidate = match (noi, min_debt_yield) {
        (None, _) => {
            if method.enabled {
                warnings.push("Debt yield sizing: NOI not available; N/A".into());
            }
            None
        }
        (Some(_), None) => None,
        (Some(_), Some(min)) if min <= Decimal::ZERO => {
            warnings.push("Debt yield sizing: minimum debt yield must be positive; N/A".into());
            None
        }
        (Some(noi), Some(min)) => {
            supporting.insert("noi".to_string(), noi);
            checked_ratio(noi, min / dec!(100)).map(|loan| loan.max(Decimal::ZERO))
        }
    };

    LoanMethodResult {
        method: SizingMethod::DebtYield,
        candidate_loan_amount: candidate,
        enabled: method.enabled,
        supporting_inputs: supporting,
        metrics: None,
    }
}

pub fn size_fixed(method: &FixedMethod, warnings: &mut Vec<String>) -> LoanMethodResult {
    let mut supporting = BTreeMap::new();
    supporting.insert("amount".to_string(), method.amount);

    LoanMethodResult {
        method: SizingMethod::Fixed,
        candidate_loan_amount: bounded(method.amount, MAX_AMOUNT, "Fixed loan amount", warnings)
            .map(|amount| amount.max(Decimal::ZERO)),
        enabled: method.enabled,
        supporting_inputs: supporting,
        metrics: None,
    }
}

/// Debt service, DSCR, LTV and debt yield for a loan of `amount`.
///
/// Returns `None` (with a warning) only when the loan terms are invalid.
pub fn loan_metrics(
    amount: Money,
    basis: &SizingBasis,
    terms: &LoanTerms,
    warnings: &mut Vec<String>,
) -> Option<LoanMetrics> {
    let service = match amortization::debt_service(amount, terms) {
        Ok(s) => s,
        Err(e) => {
            warnings.push(format!("Debt service: {e}"));
            return None;
        }
    };

    let dscr = basis
        .noi
        .and_then(|noi| checked_ratio(noi, service.annual));
    let ltv = basis.value.and_then(|v| checked_ratio(amount, v));
    let debt_yield = basis.noi.and_then(|noi| checked_ratio(noi, amount));

    Some(LoanMetrics {
        annual_debt_service: service.annual,
        monthly_debt_service: service.monthly,
        dscr,
        ltv,
        debt_yield,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
