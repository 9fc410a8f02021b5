use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::LoanTerms;
use crate::financing::selector::{select_loan, LoanSelection};
use crate::financing::sizing::{evaluate_methods, LoanMethodResult, SizingBasis, SizingMethods};
use crate::types::{bounded_opt, with_metadata, ComputationOutput, Money, MAX_AMOUNT, MAX_FACTOR};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionLoanInput {
    /// Acquisition price; the LTV method's value basis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
    /// Annualized NOI in the sizing month, produced by the operating model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noi: Option<Money>,
    pub terms: LoanTerms,
    #[serde(default)]
    pub methods: SizingMethods,
    /// Months of interest the lender requires to be held in reserve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_reserve_months: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionLoanOutput {
    /// Every configured method, in priority order
    pub methods: Vec<LoanMethodResult>,
    pub selection: LoanSelection,
    /// Max acquisition loan at closing; `None` when undetermined
    pub max_loan: Option<Money>,
    /// Bound loan * monthly interest * reserve months
    pub interest_reserve: Option<Money>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Size the acquisition loan: evaluate each configured method against the
/// purchase price and in-place NOI, then bind to the smallest enabled one.
pub fn size_acquisition_loan(
    input: &AcquisitionLoanInput,
) -> ComputationOutput<AcquisitionLoanOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if !input.methods.any_enabled() {
        warnings.push("No acquisition loan sizing method enabled; loan is undetermined".into());
    }

    let basis = SizingBasis {
        value: bounded_opt(input.purchase_price, MAX_AMOUNT, "Purchase price", &mut warnings),
        noi: bounded_opt(input.noi, MAX_AMOUNT, "NOI", &mut warnings),
    };
    let reserve_months = bounded_opt(
        input.interest_reserve_months,
        MAX_FACTOR,
        "Interest reserve months",
        &mut warnings,
    );

    let methods = evaluate_methods(&input.methods, &basis, &input.terms, &mut warnings);
    let selection = select_loan(&methods, &basis, &input.terms, &mut warnings);
    let max_loan = selection.amount();

    let interest_reserve = match (max_loan, reserve_months) {
        (Some(loan), Some(months)) if months > Decimal::ZERO => loan
            .checked_mul(input.terms.annual_rate_percent)
            .and_then(|interest| (interest / dec!(100) / dec!(12)).checked_mul(months)),
        (Some(_), _) => Some(Decimal::ZERO),
        (None, _) => None,
    };

    if let Some(bound) = selection.bound() {
        if let Some(dscr) = bound.dscr {
            if dscr < dec!(1.2) {
                warnings.push(format!(
                    "DSCR of {dscr:.2} is below 1.20x; lender covenant risk"
                ));
            }
        }
        if let Some(ltv) = bound.ltv {
            if ltv > dec!(0.80) {
                warnings.push(format!(
                    "LTV of {:.1}% exceeds 80%; high leverage",
                    ltv * dec!(100)
                ));
            }
        }
    }

    let output = AcquisitionLoanOutput {
        methods,
        selection,
        max_loan,
        interest_reserve,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Acquisition Loan Sizing (minimum of enabled methods)",
        input,
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
