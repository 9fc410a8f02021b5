use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{
    bounded_or_zero, clamp_percent, safe_div, with_metadata, ComputationOutput, Money, Percent,
    SquareFeet, MAX_AMOUNT, MAX_FACTOR,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Leasing assumptions for the commercial space, per rollover scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeasingCostAssumptions {
    /// Probability the in-place tenant renews, percent
    pub renewal_probability_percent: Percent,
    pub rent_new_per_sf: Money,
    pub rent_renewal_per_sf: Money,
    pub ti_new_per_sf: Money,
    pub ti_renewal_per_sf: Money,
    /// Leasing commission, percent of total rent over the term
    pub commission_new_percent: Percent,
    pub commission_renewal_percent: Percent,
    pub term_new_years: Decimal,
    pub term_renewal_years: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeasingReserveInput {
    /// Total rentable SF the reserve covers
    pub total_square_feet: SquareFeet,
    pub assumptions: LeasingCostAssumptions,
}

/// Cost build-up for one leg (new lease or renewal).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeasingLeg {
    /// Probability of this leg occurring, percent
    pub probability_percent: Percent,
    pub annual_rent: Money,
    /// TI before probability weighting
    pub tenant_improvements: Money,
    /// TI weighted by probability
    pub weighted_tenant_improvements: Money,
    pub commission: Money,
    pub total_leasing_cost: Money,
    /// Total cost spread over the lease term; 0 when the term is 0
    pub annualized_leasing_cost: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeasingReserveOutput {
    pub new_lease: LeasingLeg,
    pub renewal: LeasingLeg,
    pub weighted_annual_reserve: Money,
    pub reserve_per_sf: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Probability-weighted annual reserve for tenant improvements and leasing
/// commissions across a new-lease and a renewal scenario.
///
/// Commissions are computed on total SF for both legs.
pub fn calculate_leasing_reserves(
    input: &LeasingReserveInput,
) -> ComputationOutput<LeasingReserveOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let a = &input.assumptions;

    let total_sf = if input.total_square_feet < Decimal::ZERO {
        warnings.push("Total square footage is negative; treated as 0".into());
        Decimal::ZERO
    } else {
        bounded_or_zero(input.total_square_feet, MAX_AMOUNT, "Total square footage", &mut warnings)
    };
    let a = &bounded_assumptions(a, &mut warnings);

    let renewal_prob = clamp_percent(a.renewal_probability_percent, "Renewal probability", &mut warnings);
    let new_prob = dec!(100) - renewal_prob;

    let new_lease = leg(
        "New lease",
        total_sf,
        new_prob,
        a.rent_new_per_sf,
        a.ti_new_per_sf,
        a.commission_new_percent,
        a.term_new_years,
        &mut warnings,
    );
    let renewal = leg(
        "Renewal lease",
        total_sf,
        renewal_prob,
        a.rent_renewal_per_sf,
        a.ti_renewal_per_sf,
        a.commission_renewal_percent,
        a.term_renewal_years,
        &mut warnings,
    );

    let weighted_annual_reserve =
        new_lease.annualized_leasing_cost + renewal.annualized_leasing_cost;

    let output = LeasingReserveOutput {
        new_lease,
        renewal,
        weighted_annual_reserve,
        reserve_per_sf: safe_div(weighted_annual_reserve, total_sf),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Leasing Cost Reserve (renewal-probability weighted TI and commissions)",
        input,
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bounded_assumptions(
    a: &LeasingCostAssumptions,
    warnings: &mut Vec<String>,
) -> LeasingCostAssumptions {
    let mut amount = |value: Money, label: &str| bounded_or_zero(value, MAX_AMOUNT, label, warnings);
    let rent_new_per_sf = amount(a.rent_new_per_sf, "New lease rent");
    let rent_renewal_per_sf = amount(a.rent_renewal_per_sf, "Renewal rent");
    let ti_new_per_sf = amount(a.ti_new_per_sf, "New lease TI");
    let ti_renewal_per_sf = amount(a.ti_renewal_per_sf, "Renewal TI");

    let mut factor = |value: Decimal, label: &str| bounded_or_zero(value, MAX_FACTOR, label, warnings);
    LeasingCostAssumptions {
        renewal_probability_percent: a.renewal_probability_percent,
        rent_new_per_sf,
        rent_renewal_per_sf,
        ti_new_per_sf,
        ti_renewal_per_sf,
        commission_new_percent: factor(a.commission_new_percent, "New lease commission"),
        commission_renewal_percent: factor(a.commission_renewal_percent, "Renewal commission"),
        term_new_years: factor(a.term_new_years, "New lease term"),
        term_renewal_years: factor(a.term_renewal_years, "Renewal term"),
    }
}

#[allow(clippy::too_many_arguments)]
fn leg(
    label: &str,
    total_sf: SquareFeet,
    probability_percent: Percent,
    rent_per_sf: Money,
    ti_per_sf: Money,
    commission_percent: Percent,
    term_years: Decimal,
    warnings: &mut Vec<String>,
) -> LeasingLeg {
    let weight = probability_percent / dec!(100);
    let annual_rent = rent_per_sf * total_sf;
    let tenant_improvements = ti_per_sf * total_sf;
    let weighted_tenant_improvements = tenant_improvements * weight;
    let commission = total_sf * weight * rent_per_sf * commission_percent / dec!(100) * term_years;
    let total_leasing_cost = commission + weighted_tenant_improvements;

    let annualized_leasing_cost = if term_years > Decimal::ZERO {
        total_leasing_cost / term_years
    } else {
        warnings.push(format!(
            "{label} term must be positive; annualized leasing cost reported as 0"
        ));
        Decimal::ZERO
    };

    LeasingLeg {
        probability_percent,
        annual_rent,
        tenant_improvements,
        weighted_tenant_improvements,
        commission,
        total_leasing_cost,
        annualized_leasing_cost,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_input() -> LeasingReserveInput {
        LeasingReserveInput {
            total_square_feet: dec!(10_000),
            assumptions: LeasingCostAssumptions {
                renewal_probability_percent: dec!(75),
                rent_new_per_sf: dec!(20),
                rent_renewal_per_sf: dec!(19),
                ti_new_per_sf: dec!(40),
                ti_renewal_per_sf: dec!(10),
                commission_new_percent: dec!(6),
                commission_renewal_percent: dec!(3),
                term_new_years: dec!(5),
                term_renewal_years: dec!(5),
            },
        }
    }

    #[test]
    fn test_probabilities_sum_to_100() {
        let out = calculate_leasing_reserves(&sample_input()).result;
        assert_eq!(
            out.new_lease.probability_percent + out.renewal.probability_percent,
            dec!(100)
        );
        assert_eq!(out.new_lease.probability_percent, dec!(25));
    }

    #[test]
    fn test_new_lease_leg() {
        let out = calculate_leasing_reserves(&sample_input()).result;
        let leg = &out.new_lease;
        assert_eq!(leg.annual_rent, dec!(200_000));
        assert_eq!(leg.tenant_improvements, dec!(400_000));
        assert_eq!(leg.weighted_tenant_improvements, dec!(100_000));
        // 10,000 * 0.25 * 20 * 6% * 5
        assert_eq!(leg.commission, dec!(15_000));
        assert_eq!(leg.total_leasing_cost, dec!(115_000));
        assert_eq!(leg.annualized_leasing_cost, dec!(23_000));
    }

    #[test]
    fn test_weighted_reserve() {
        let out = calculate_leasing_reserves(&sample_input()).result;
        // Renewal: TI 100,000 * 0.75 = 75,000; commission 10,000 * 0.75 * 19 * 3% * 5 = 21,375
        assert_eq!(out.renewal.total_leasing_cost, dec!(96_375));
        assert_eq!(out.renewal.annualized_leasing_cost, dec!(19_275));
        assert_eq!(out.weighted_annual_reserve, dec!(42_275));
        assert_eq!(out.reserve_per_sf, dec!(4.2275));
    }

    #[test]
    fn test_annualized_times_term_is_total() {
        let out = calculate_leasing_reserves(&sample_input()).result;
        assert_eq!(
            out.new_lease.annualized_leasing_cost * dec!(5),
            out.new_lease.total_leasing_cost
        );
    }

    #[test]
    fn test_zero_term_does_not_divide() {
        let mut input = sample_input();
        input.assumptions.term_renewal_years = Decimal::ZERO;
        let result = calculate_leasing_reserves(&input);
        assert_eq!(result.result.renewal.annualized_leasing_cost, Decimal::ZERO);
        assert!(result.warnings.iter().any(|w| w.contains("Renewal lease term")));
    }

    #[test]
    fn test_renewal_probability_clamped() {
        let mut input = sample_input();
        input.assumptions.renewal_probability_percent = dec!(120);
        let result = calculate_leasing_reserves(&input);
        assert_eq!(result.result.new_lease.probability_percent, Decimal::ZERO);
        assert_eq!(result.result.new_lease.weighted_tenant_improvements, Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_assumptions_are_zeroed() {
        let mut input = sample_input();
        input.total_square_feet = dec!(9999999999999999999999999999);
        input.assumptions.term_new_years = dec!(9999999999999999999999999999);
        let result = calculate_leasing_reserves(&input);
        assert_eq!(result.result.weighted_annual_reserve, Decimal::ZERO);
        assert!(result.warnings.iter().any(|w| w.contains("out of range")));
    }
}
