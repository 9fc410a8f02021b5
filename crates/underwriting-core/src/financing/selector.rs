use serde::{Deserialize, Serialize};

use crate::amortization::LoanTerms;
use crate::financing::sizing::{loan_metrics, LoanMethodResult, SizingBasis, SizingMethod};
use crate::types::{Money, Multiple, Rate};

/// The loan amount a lender would actually extend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundLoan {
    pub amount: Money,
    pub binding_method: SizingMethod,
    pub terms: LoanTerms,
    /// `None` when the terms cannot produce a payment
    pub annual_debt_service: Option<Money>,
    pub monthly_debt_service: Option<Money>,
    pub dscr: Option<Multiple>,
    /// Loan / value, as a fraction
    pub ltv: Option<Rate>,
}

/// Result of choosing among the enabled sizing methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoanSelection {
    Bound(BoundLoan),
    /// No enabled method produced a candidate.
    Undetermined,
}

impl LoanSelection {
    pub fn bound(&self) -> Option<&BoundLoan> {
        match self {
            LoanSelection::Bound(b) => Some(b),
            LoanSelection::Undetermined => None,
        }
    }

    pub fn amount(&self) -> Option<Money> {
        self.bound().map(|b| b.amount)
    }
}

/// The enabled method with the smallest candidate.
///
/// Candidates are scanned in `SizingMethod::PRIORITY` order and the first
/// minimum wins, so ties always resolve to the earlier method regardless of
/// the order of `results`.
pub fn binding_result(results: &[LoanMethodResult]) -> Option<&LoanMethodResult> {
    SizingMethod::PRIORITY
        .iter()
        .filter_map(|method| {
            results
                .iter()
                .find(|r| r.method == *method && r.enabled && r.candidate_loan_amount.is_some())
        })
        .min_by_key(|r| r.candidate_loan_amount)
}

/// Bind the loan to the most restrictive enabled method.
pub fn select_loan(
    results: &[LoanMethodResult],
    basis: &SizingBasis,
    terms: &LoanTerms,
    warnings: &mut Vec<String>,
) -> LoanSelection {
    let Some(binding) = binding_result(results) else {
        tracing::debug!("no enabled sizing method produced a candidate");
        return LoanSelection::Undetermined;
    };
    let Some(amount) = binding.candidate_loan_amount else {
        return LoanSelection::Undetermined;
    };

    tracing::debug!(
        method = binding.method.label(),
        amount = %amount,
        "loan bound by most restrictive method"
    );

    let metrics = loan_metrics(amount, basis, terms, warnings);

    LoanSelection::Bound(BoundLoan {
        amount,
        binding_method: binding.method,
        terms: terms.clone(),
        annual_debt_service: metrics.as_ref().map(|m| m.annual_debt_service),
        monthly_debt_service: metrics.as_ref().map(|m| m.monthly_debt_service),
        dscr: metrics.as_ref().and_then(|m| m.dscr),
        ltv: metrics.as_ref().and_then(|m| m.ltv),
    })
}
