use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use underwriting_core::amortization::{self, InterestOnly, LoanTerms};
use underwriting_core::financing::acquisition::{size_acquisition_loan, AcquisitionLoanInput};
use underwriting_core::financing::refinance::{size_refinance, ExistingLoan, RefinanceInput};
use underwriting_core::financing::sizing::{
    DebtYieldMethod, DscrMethod, FixedMethod, LtvMethod, SizingMethod, SizingMethods,
};
use underwriting_core::financing::LoanSelection;

// ===========================================================================
// Helpers
// ===========================================================================

fn acquisition_input(noi: Decimal) -> AcquisitionLoanInput {
    AcquisitionLoanInput {
        purchase_price: Some(dec!(5_500_000)),
        noi: Some(noi),
        terms: LoanTerms::new(dec!(6.75), 25).unwrap(),
        methods: SizingMethods {
            ltv: Some(LtvMethod {
                enabled: true,
                ltv_percent: dec!(65),
                finance_hard_costs: false,
                hard_cost_amount: Decimal::ZERO,
                hard_cost_ltc_percent: dec!(75),
            }),
            dscr: Some(DscrMethod {
                enabled: true,
                min_dscr: dec!(1.30),
            }),
            debt_yield: None,
            fixed: Some(FixedMethod {
                enabled: false,
                amount: dec!(750_000),
            }),
        },
        interest_reserve_months: None,
    }
}

// ===========================================================================
// Acquisition loan scenario
// ===========================================================================

#[test]
fn test_acquisition_scenario_ltv_binds() {
    // $5.5M price, 65% LTV, $400k NOI, 1.30x, 6.75% / 25y, fixed $750k disabled
    let result = size_acquisition_loan(&acquisition_input(dec!(400_000)));
    let out = &result.result;

    let candidates: Vec<(SizingMethod, bool)> = out
        .methods
        .iter()
        .map(|m| (m.method, m.enabled))
        .collect();
    assert_eq!(
        candidates,
        vec![
            (SizingMethod::Ltv, true),
            (SizingMethod::Dscr, true),
            (SizingMethod::Fixed, false),
        ]
    );

    let ltv = out.methods[0].candidate_loan_amount.unwrap();
    let dscr = out.methods[1].candidate_loan_amount.unwrap();
    assert_eq!(ltv, dec!(3_575_000));
    // 400,000 / 1.30 / ~0.08291 = ~3.711M
    assert!(
        (dscr - dec!(3_711_200)).abs() < dec!(1_000),
        "Expected DSCR candidate ~3.711M, got {dscr}"
    );

    let bound = out.selection.bound().unwrap();
    assert_eq!(bound.binding_method, SizingMethod::Ltv);
    assert_eq!(bound.amount, dec!(3_575_000));
    assert_eq!(bound.ltv, Some(dec!(0.65)));
}

#[test]
fn test_acquisition_scenario_lower_noi_dscr_binds() {
    let result = size_acquisition_loan(&acquisition_input(dec!(380_000)));
    let bound = result.result.selection.bound().unwrap();
    assert_eq!(bound.binding_method, SizingMethod::Dscr);
    assert!(bound.amount > dec!(3_520_000) && bound.amount < dec!(3_530_000));
    // Binding on DSCR means coverage equals the minimum
    let dscr = bound.dscr.unwrap();
    assert!((dscr - dec!(1.30)).abs() < dec!(0.000001), "DSCR was {dscr}");
}

#[test]
fn test_fixed_amount_wins_when_enabled_and_smallest() {
    let mut input = acquisition_input(dec!(400_000));
    input.methods.fixed.as_mut().unwrap().enabled = true;
    let out = size_acquisition_loan(&input).result;
    assert_eq!(out.max_loan, Some(dec!(750_000)));
    assert_eq!(
        out.selection.bound().map(|b| b.binding_method),
        Some(SizingMethod::Fixed)
    );
}

#[test]
fn test_debt_yield_participates_in_acquisition_sizing() {
    let mut input = acquisition_input(dec!(400_000));
    input.methods.debt_yield = Some(DebtYieldMethod {
        enabled: true,
        min_debt_yield_percent: dec!(12.5),
    });
    let out = size_acquisition_loan(&input).result;
    // 400,000 / 12.5% = 3,200,000
    assert_eq!(out.max_loan, Some(dec!(3_200_000)));
}

#[test]
fn test_no_methods_configured_is_undetermined() {
    let mut input = acquisition_input(dec!(400_000));
    input.methods = SizingMethods::default();
    let result = size_acquisition_loan(&input);
    assert!(matches!(result.result.selection, LoanSelection::Undetermined));
    assert!(result.result.methods.is_empty());
    assert!(!result.warnings.is_empty());
}

#[test]
fn test_interest_only_changes_service_not_size() {
    let mut input = acquisition_input(dec!(400_000));
    input.terms.io = InterestOnly::Full;
    let out = size_acquisition_loan(&input).result;
    let bound = out.selection.bound().unwrap();
    assert_eq!(bound.amount, dec!(3_575_000));
    // 3,575,000 * 6.75%
    assert_eq!(bound.annual_debt_service, Some(dec!(241_312.5)));
}

// ===========================================================================
// Refinance
// ===========================================================================

#[test]
fn test_refinance_pays_off_amortized_acquisition_loan() {
    let acquisition_terms = LoanTerms::new(dec!(6.75), 25).unwrap();
    let input = RefinanceInput {
        refinance_month: Some(61),
        projected_noi: Some(dec!(520_000)),
        applied_cap_rate_percent: Some(dec!(6.5)),
        terms: LoanTerms::new(dec!(6), 30).unwrap(),
        methods: SizingMethods {
            ltv: Some(LtvMethod {
                enabled: true,
                ltv_percent: dec!(75),
                finance_hard_costs: false,
                hard_cost_amount: Decimal::ZERO,
                hard_cost_ltc_percent: Decimal::ZERO,
            }),
            dscr: Some(DscrMethod {
                enabled: true,
                min_dscr: dec!(1.25),
            }),
            debt_yield: Some(DebtYieldMethod {
                enabled: true,
                min_debt_yield_percent: dec!(8.75),
            }),
            fixed: None,
        },
        origination_cost_percent: dec!(1),
        sponsor_equity_share_percent: Some(dec!(10)),
        principal_outstanding: None,
        existing_loan: Some(ExistingLoan {
            amount: dec!(3_575_000),
            terms: acquisition_terms.clone(),
        }),
    };
    let out = size_refinance(&input).result;

    // 520,000 / 6.5% = 8,000,000
    assert_eq!(out.implied_valuation, Some(dec!(8_000_000)));

    let expected_payoff =
        amortization::balance_outstanding(dec!(3_575_000), &acquisition_terms, 60).unwrap();
    assert_eq!(out.principal_outstanding, Some(expected_payoff));

    let loan = out.max_loan.unwrap();
    let fees = loan * dec!(1) / dec!(100);
    assert_eq!(out.cash_out, Some(loan - fees - expected_payoff));
}
