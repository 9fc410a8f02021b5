use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use underwriting_core::exit::valuation::{
    value_exit, ExitAssumptions, ExitValuationInput, IncomeStream, StreamExitInput,
};
use underwriting_core::leasing::reserves::{
    calculate_leasing_reserves, LeasingCostAssumptions, LeasingReserveInput,
};

// ===========================================================================
// Leasing cost reserve
// ===========================================================================

#[test]
fn test_retail_leasing_reserve() {
    // 40,000 SF, 70% renewal, $22 new / $21 renewal, TI $35 / $10,
    // commissions 6% / 3%, 10-year new lease, 5-year renewal
    let input = LeasingReserveInput {
        total_square_feet: dec!(40_000),
        assumptions: LeasingCostAssumptions {
            renewal_probability_percent: dec!(70),
            rent_new_per_sf: dec!(22),
            rent_renewal_per_sf: dec!(21),
            ti_new_per_sf: dec!(35),
            ti_renewal_per_sf: dec!(10),
            commission_new_percent: dec!(6),
            commission_renewal_percent: dec!(3),
            term_new_years: dec!(10),
            term_renewal_years: dec!(5),
        },
    };
    let out = calculate_leasing_reserves(&input).result;

    // New: TI 1,400,000 * 30% = 420,000; commission 40,000 * 0.3 * 22 * 6% * 10 = 158,400
    assert_eq!(out.new_lease.total_leasing_cost, dec!(578_400));
    assert_eq!(out.new_lease.annualized_leasing_cost, dec!(57_840));
    // Renewal: TI 400,000 * 70% = 280,000; commission 40,000 * 0.7 * 21 * 3% * 5 = 88,200
    assert_eq!(out.renewal.total_leasing_cost, dec!(368_200));
    assert_eq!(out.renewal.annualized_leasing_cost, dec!(73_640));

    assert_eq!(out.weighted_annual_reserve, dec!(131_480));
    assert_eq!(out.reserve_per_sf, dec!(3.287));
}

#[test]
fn test_reserve_with_no_area_is_zero() {
    let input = LeasingReserveInput {
        total_square_feet: Decimal::ZERO,
        assumptions: LeasingCostAssumptions {
            renewal_probability_percent: dec!(50),
            rent_new_per_sf: dec!(20),
            rent_renewal_per_sf: dec!(20),
            ti_new_per_sf: dec!(20),
            ti_renewal_per_sf: dec!(5),
            commission_new_percent: dec!(5),
            commission_renewal_percent: dec!(2),
            term_new_years: dec!(5),
            term_renewal_years: dec!(5),
        },
    };
    let out = calculate_leasing_reserves(&input).result;
    assert_eq!(out.weighted_annual_reserve, Decimal::ZERO);
    assert_eq!(out.reserve_per_sf, Decimal::ZERO);
}

// ===========================================================================
// Exit valuation
// ===========================================================================

fn stream(kind: IncomeStream, noi: Option<Decimal>, cap: Option<Decimal>) -> StreamExitInput {
    StreamExitInput {
        stream: kind,
        forward_noi: noi,
        assumptions: ExitAssumptions {
            exit_month: 84,
            exit_cap_rate_percent: cap,
            selling_costs_percent: dec!(2.5),
        },
        units: None,
    }
}

#[test]
fn test_mixed_use_exit() {
    let input = ExitValuationInput {
        streams: vec![
            stream(IncomeStream::Residential, Some(dec!(750_000)), Some(dec!(5))),
            stream(IncomeStream::Commercial, Some(dec!(250_000)), Some(dec!(6.25))),
        ],
    };
    let out = value_exit(&input).result;

    assert_eq!(out.streams[0].implied_valuation, Some(dec!(15_000_000)));
    assert_eq!(out.streams[1].implied_valuation, Some(dec!(4_000_000)));
    assert_eq!(out.streams[1].selling_costs, Some(dec!(100_000)));
    assert_eq!(out.combined_implied_valuation, Some(dec!(19_000_000)));
    assert_eq!(out.combined_net_proceeds, Some(dec!(18_525_000)));
    // (5 * 750k + 6.25 * 250k) / 1M = 5.3125
    assert_eq!(out.blended_cap_rate_percent, Some(dec!(5.3125)));
}

#[test]
fn test_missing_noi_degrades_only_that_stream() {
    let input = ExitValuationInput {
        streams: vec![
            stream(IncomeStream::Residential, Some(dec!(750_000)), Some(dec!(5))),
            stream(IncomeStream::Commercial, None, Some(dec!(6.25))),
        ],
    };
    let result = value_exit(&input);
    let out = &result.result;
    assert!(out.streams[1].implied_valuation.is_none());
    assert_eq!(out.combined_implied_valuation, Some(dec!(15_000_000)));
    assert_eq!(out.blended_cap_rate_percent, Some(dec!(5)));
    assert!(result.warnings.iter().any(|w| w.starts_with("Commercial")));
}
