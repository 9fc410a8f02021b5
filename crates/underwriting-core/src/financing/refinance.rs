use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{self, LoanTerms};
use crate::financing::selector::{select_loan, LoanSelection};
use crate::financing::sizing::{
    evaluate_methods, LoanMethodResult, SizingBasis, SizingMethod, SizingMethods,
};
use crate::types::{
    bounded, bounded_opt, with_metadata, ComputationOutput, Money, Month, Percent, MAX_AMOUNT,
    MAX_FACTOR,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The acquisition loan being taken out by the refinance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingLoan {
    pub amount: Money,
    pub terms: LoanTerms,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    /// Model month in which the permanent loan is issued; without it the
    /// acquisition loan payoff cannot be derived
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinance_month: Option<Month>,
    /// Annualized NOI projected for the refinance month
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_noi: Option<Money>,
    /// Cap rate applied to projected NOI to value the property, percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_cap_rate_percent: Option<Percent>,
    pub terms: LoanTerms,
    #[serde(default)]
    pub methods: SizingMethods,
    /// Origination costs (including title), percent of the new loan
    #[serde(default)]
    pub origination_cost_percent: Percent,
    /// Sponsor's share of equity, percent; splits the cash-out
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor_equity_share_percent: Option<Percent>,
    /// Principal outstanding on the acquisition loan at the refinance month
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal_outstanding: Option<Money>,
    /// Used to derive `principal_outstanding` when it is not supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_loan: Option<ExistingLoan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceOutput {
    pub refinance_month: Option<Month>,
    /// Projected NOI / applied cap rate
    pub implied_valuation: Option<Money>,
    pub methods: Vec<LoanMethodResult>,
    pub selection: LoanSelection,
    /// Max permanent loan; `None` when undetermined
    pub max_loan: Option<Money>,
    pub principal_outstanding: Option<Money>,
    pub origination_costs: Option<Money>,
    pub proceeds_net_of_fees: Option<Money>,
    /// Net proceeds less payoff of the acquisition loan (negative = cash-in)
    pub cash_out: Option<Money>,
    pub sponsor_share_of_cash_out: Option<Money>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `projected NOI / cap rate% * 100`; `None` for a missing or non-positive cap rate.
pub fn implied_valuation(noi: Option<Money>, cap_rate_percent: Option<Percent>) -> Option<Money> {
    match (noi, cap_rate_percent) {
        (Some(noi), Some(cap)) if cap > Decimal::ZERO => {
            noi.checked_div(cap).and_then(|v| v.checked_mul(dec!(100)))
        }
        _ => None,
    }
}

/// Size the permanent loan at the refinance month.
///
/// Same method set and minimum-of-enabled rule as the acquisition loan, but
/// the LTV basis is the cap-rate-implied valuation of projected NOI rather
/// than the purchase price.
pub fn size_refinance(input: &RefinanceInput) -> ComputationOutput<RefinanceOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let projected_noi = bounded_opt(input.projected_noi, MAX_AMOUNT, "Projected NOI", &mut warnings);
    let cap_rate = bounded_opt(
        input.applied_cap_rate_percent,
        MAX_FACTOR,
        "Applied cap rate",
        &mut warnings,
    );
    let origination_percent = bounded(
        input.origination_cost_percent,
        MAX_FACTOR,
        "Origination cost",
        &mut warnings,
    );
    let sponsor_share = bounded_opt(
        input.sponsor_equity_share_percent,
        MAX_FACTOR,
        "Sponsor equity share",
        &mut warnings,
    );

    let valuation = implied_valuation(projected_noi, cap_rate);
    if valuation.is_none() && input.methods.is_enabled(SizingMethod::Ltv) {
        warnings.push(
            "Refinance valuation requires projected NOI and a positive applied cap rate".into(),
        );
    }

    let basis = SizingBasis {
        value: valuation,
        noi: projected_noi,
    };

    let methods = evaluate_methods(&input.methods, &basis, &input.terms, &mut warnings);
    let selection = select_loan(&methods, &basis, &input.terms, &mut warnings);
    let max_loan = selection.amount();

    let principal_outstanding = resolve_principal_outstanding(input, &mut warnings);

    let origination_costs = max_loan
        .zip(origination_percent)
        .and_then(|(loan, pct)| loan.checked_mul(pct))
        .map(|fees| fees / dec!(100));
    let proceeds_net_of_fees = match (max_loan, origination_costs) {
        (Some(loan), Some(fees)) => loan.checked_sub(fees),
        _ => None,
    };

    let cash_out = match (proceeds_net_of_fees, principal_outstanding) {
        (Some(net), Some(payoff)) => net.checked_sub(payoff),
        _ => None,
    };

    if let Some(c) = cash_out {
        if c < Decimal::ZERO {
            warnings.push(format!(
                "Refinance proceeds fall {} short of the acquisition loan payoff; cash-in required",
                c.abs().round_dp(2)
            ));
        }
    }

    let sponsor_share_of_cash_out = match (cash_out, sponsor_share) {
        (Some(c), Some(share)) => c
            .max(Decimal::ZERO)
            .checked_mul(share)
            .map(|amount| amount / dec!(100)),
        _ => None,
    };

    let output = RefinanceOutput {
        refinance_month: input.refinance_month,
        implied_valuation: valuation,
        methods,
        selection,
        max_loan,
        principal_outstanding,
        origination_costs,
        proceeds_net_of_fees,
        cash_out,
        sponsor_share_of_cash_out,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Refinance Sizing (cap-rate valuation, minimum of enabled methods)",
        input,
        warnings,
        elapsed,
        output,
    )
}

fn resolve_principal_outstanding(input: &RefinanceInput, warnings: &mut Vec<String>) -> Option<Money> {
    if let Some(principal) = input.principal_outstanding {
        return bounded(principal, MAX_AMOUNT, "Principal outstanding", warnings);
    }

    let existing = input.existing_loan.as_ref()?;
    let Some(refinance_month) = input.refinance_month else {
        warnings.push("Refinancing month not set; acquisition loan payoff is N/A".into());
        return None;
    };
    // Payments made through the month before the refinance
    let months_elapsed = refinance_month.saturating_sub(1);
    match amortization::balance_outstanding(existing.amount, &existing.terms, months_elapsed) {
        Ok(balance) => Some(balance),
        Err(e) => {
            warnings.push(format!("Acquisition loan balance: {e}"));
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
