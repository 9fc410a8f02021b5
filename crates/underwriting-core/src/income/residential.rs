use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::UnderwritingError;
use crate::types::{
    bounded_or_zero, clamp_percent, normalize_label, round_half_up, safe_div, with_metadata,
    ComputationOutput, Money, Month, Percent, SquareFeet, MAX_AMOUNT,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// What happens to a unit's in-place lease over the hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "VacateFlag")]
pub enum VacatePlan {
    /// Tenant stays; rent follows growth assumptions
    #[default]
    Keep,
    /// Tenant leaves and the unit re-leases at market
    VacateAndRelease,
    /// Tenant stays but rent moves to market
    MarketAdjustment,
}

/// The rent roll stores the plan as a 0/1/2 code; labels are accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum VacateFlag {
    Code(u8),
    Label(String),
}

impl TryFrom<VacateFlag> for VacatePlan {
    type Error = UnderwritingError;

    fn try_from(flag: VacateFlag) -> Result<Self, Self::Error> {
        let plan = match flag {
            VacateFlag::Code(0) => Some(VacatePlan::Keep),
            VacateFlag::Code(1) => Some(VacatePlan::VacateAndRelease),
            VacateFlag::Code(2) => Some(VacatePlan::MarketAdjustment),
            VacateFlag::Code(_) => None,
            VacateFlag::Label(ref s) => match normalize_label(s).as_str() {
                "0" | "keep" | "keeptenant" => Some(VacatePlan::Keep),
                "1" | "vacateandrelease" | "vacaterelease" => Some(VacatePlan::VacateAndRelease),
                "2" | "marketadjustment" => Some(VacatePlan::MarketAdjustment),
                _ => None,
            },
        };
        plan.ok_or_else(|| UnderwritingError::InvalidInput {
            field: "vacate_flag".into(),
            reason: "Expected 0 (keep), 1 (vacate & re-lease) or 2 (market adjustment)".into(),
        })
    }
}

/// One row of the residential rent roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentialUnit {
    pub layout: String,
    #[serde(default)]
    pub square_feet: SquareFeet,
    /// In-place monthly rent; blank for a vacant unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_rent: Option<Money>,
    #[serde(default, alias = "vacate_flag")]
    pub vacate: VacatePlan,
    /// Month the plan takes effect; 0 when not scheduled
    #[serde(default)]
    pub vacate_month: Month,
}

/// Market (pro forma) monthly rent for a unit layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRentAssumption {
    pub layout: String,
    #[serde(alias = "pf_rent")]
    pub pro_forma_rent: Money,
}

/// A fee-paying amenity (parking, storage, pet rent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmenityIncome {
    pub name: String,
    #[serde(default)]
    pub start_month: Month,
    /// Share of available spaces in use, percent
    #[serde(alias = "utilization")]
    pub utilization_percent: Percent,
    /// Spaces available
    pub unit_count: Decimal,
    pub monthly_fee: Money,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResidentialIncomeInput {
    #[serde(default)]
    pub units: Vec<ResidentialUnit>,
    #[serde(default, alias = "market_rent_assumptions")]
    pub market_rents: Vec<MarketRentAssumption>,
    #[serde(default)]
    pub amenities: Vec<AmenityIncome>,
}

impl ResidentialIncomeInput {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty() && self.amenities.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitRent {
    pub layout: String,
    pub square_feet: SquareFeet,
    pub vacate: VacatePlan,
    pub current_rent: Money,
    /// Current rent when kept, else the layout's market rent
    pub pro_forma_rent: Money,
}

/// Rent roll figures for one layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutSummary {
    pub layout: String,
    /// Units kept, or with a scheduled vacate month
    pub unit_count: u32,
    pub total_square_feet: SquareFeet,
    pub average_current_rent: Money,
    pub current_rent_per_sf: Money,
    pub pro_forma_rent: Money,
    /// `units * market rent / total SF`
    pub pro_forma_rent_per_sf: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmenityRow {
    pub name: String,
    pub start_month: Month,
    /// Spaces in use: utilization x spaces, rounded to a whole space
    pub usage: Decimal,
    pub monthly_income: Money,
    pub annual_income: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentialIncomeOutput {
    pub units: Vec<UnitRent>,
    pub layouts: Vec<LayoutSummary>,
    pub amenities: Vec<AmenityRow>,
    pub unit_count: u32,
    pub total_square_feet: SquareFeet,
    /// Monthly in-place rent across the roll
    pub total_current_rent: Money,
    /// Monthly pro forma rent across the roll
    pub total_pro_forma_rent: Money,
    pub annual_pro_forma_rent: Money,
    pub total_amenity_monthly: Money,
    pub total_amenity_annual: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Residential rent roll and amenity income.
///
/// Kept units carry their current rent into pro forma; vacated or
/// market-adjusted units take their layout's market rent. Layout summaries
/// follow the order of the market rent assumptions.
pub fn calculate_residential_income(
    input: &ResidentialIncomeInput,
) -> ComputationOutput<ResidentialIncomeOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let units: Vec<ResidentialUnit> = input
        .units
        .iter()
        .enumerate()
        .map(|(i, u)| sanitize_unit(i + 1, u, &mut warnings))
        .collect();

    let market_rent = |layout: &str| -> Option<Money> {
        input
            .market_rents
            .iter()
            .find(|a| a.layout.trim().eq_ignore_ascii_case(layout.trim()))
            .map(|a| a.pro_forma_rent.max(Decimal::ZERO).min(MAX_AMOUNT))
    };

    let unit_rows: Vec<UnitRent> = units
        .iter()
        .enumerate()
        .map(|(i, u)| {
            let current_rent = u.current_rent.unwrap_or(Decimal::ZERO);
            let pro_forma_rent = match u.vacate {
                VacatePlan::Keep => current_rent,
                VacatePlan::VacateAndRelease | VacatePlan::MarketAdjustment => {
                    market_rent(&u.layout).unwrap_or_else(|| {
                        warnings.push(format!(
                            "Unit {}: no market rent for layout '{}'; pro forma rent 0",
                            i + 1,
                            u.layout
                        ));
                        Decimal::ZERO
                    })
                }
            };
            UnitRent {
                layout: u.layout.clone(),
                square_feet: u.square_feet,
                vacate: u.vacate,
                current_rent,
                pro_forma_rent,
            }
        })
        .collect();

    let layouts: Vec<LayoutSummary> = input
        .market_rents
        .iter()
        .map(|a| summarize_layout(a, &units))
        .collect();

    let amenities: Vec<AmenityRow> = input
        .amenities
        .iter()
        .map(|a| amenity_row(a, &mut warnings))
        .collect();

    let total_square_feet: SquareFeet = unit_rows.iter().map(|u| u.square_feet).sum();
    let total_current_rent: Money = unit_rows.iter().map(|u| u.current_rent).sum();
    let total_pro_forma_rent: Money = unit_rows.iter().map(|u| u.pro_forma_rent).sum();
    let total_amenity_monthly: Money = amenities.iter().map(|a| a.monthly_income).sum();
    let total_amenity_annual: Money = amenities.iter().map(|a| a.annual_income).sum();

    let output = ResidentialIncomeOutput {
        unit_count: unit_rows.len() as u32,
        units: unit_rows,
        layouts,
        amenities,
        total_square_feet,
        total_current_rent,
        total_pro_forma_rent,
        annual_pro_forma_rent: total_pro_forma_rent * dec!(12),
        total_amenity_monthly,
        total_amenity_annual,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Residential Income (unit rent roll and amenity income)",
        input,
        warnings,
        elapsed,
        output,
    )
}

/// `round(utilization% x spaces)`, the whole number of spaces in use.
pub fn amenity_usage(utilization_percent: Percent, unit_count: Decimal) -> Decimal {
    round_half_up(utilization_percent / dec!(100) * unit_count, 0)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn sanitize_unit(number: usize, unit: &ResidentialUnit, warnings: &mut Vec<String>) -> ResidentialUnit {
    let mut u = unit.clone();
    if u.square_feet < Decimal::ZERO {
        warnings.push(format!("Unit {number}: negative square footage; treated as 0"));
        u.square_feet = Decimal::ZERO;
    }
    if u.current_rent.is_some_and(|r| r < Decimal::ZERO) {
        warnings.push(format!("Unit {number}: negative rent; treated as 0"));
        u.current_rent = Some(Decimal::ZERO);
    }
    u.square_feet = bounded_or_zero(
        u.square_feet,
        MAX_AMOUNT,
        &format!("Unit {number} square footage"),
        warnings,
    );
    u.current_rent = u
        .current_rent
        .map(|r| bounded_or_zero(r, MAX_AMOUNT, &format!("Unit {number} rent"), warnings));
    u
}

fn summarize_layout(assumption: &MarketRentAssumption, units: &[ResidentialUnit]) -> LayoutSummary {
    let counted: Vec<&ResidentialUnit> = units
        .iter()
        .filter(|u| u.layout.trim().eq_ignore_ascii_case(assumption.layout.trim()))
        .filter(|u| u.vacate == VacatePlan::Keep || u.vacate_month > 0)
        .collect();

    let unit_count = counted.len() as u32;
    let count = Decimal::from(unit_count);
    let total_square_feet: SquareFeet = counted.iter().map(|u| u.square_feet).sum();
    let total_current_rent: Money = counted
        .iter()
        .map(|u| u.current_rent.unwrap_or(Decimal::ZERO))
        .sum();
    let pro_forma_rent = assumption.pro_forma_rent.max(Decimal::ZERO).min(MAX_AMOUNT);

    LayoutSummary {
        layout: assumption.layout.clone(),
        unit_count,
        total_square_feet,
        average_current_rent: safe_div(total_current_rent, count),
        current_rent_per_sf: safe_div(total_current_rent, total_square_feet),
        pro_forma_rent,
        pro_forma_rent_per_sf: safe_div(count * pro_forma_rent, total_square_feet),
    }
}

fn amenity_row(amenity: &AmenityIncome, warnings: &mut Vec<String>) -> AmenityRow {
    let label = format!("'{}'", amenity.name);
    let utilization = clamp_percent(
        amenity.utilization_percent,
        &format!("{label} utilization"),
        warnings,
    );
    let spaces = bounded_or_zero(
        amenity.unit_count.max(Decimal::ZERO),
        MAX_AMOUNT,
        &format!("{label} unit count"),
        warnings,
    );
    let fee = bounded_or_zero(amenity.monthly_fee, MAX_AMOUNT, &format!("{label} fee"), warnings);

    let usage = amenity_usage(utilization, spaces);
    let monthly_income = usage * fee;

    AmenityRow {
        name: amenity.name.clone(),
        start_month: amenity.start_month,
        usage,
        monthly_income,
        annual_income: monthly_income * dec!(12),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn unit(layout: &str, sf: Decimal, rent: Option<Decimal>, vacate: VacatePlan, month: Month) -> ResidentialUnit {
        ResidentialUnit {
            layout: layout.into(),
            square_feet: sf,
            current_rent: rent,
            vacate,
            vacate_month: month,
        }
    }

    fn sample_input() -> ResidentialIncomeInput {
        ResidentialIncomeInput {
            units: vec![
                unit("1BR", dec!(700), Some(dec!(1_400)), VacatePlan::Keep, 0),
                unit("1BR", dec!(720), Some(dec!(1_350)), VacatePlan::VacateAndRelease, 6),
                unit("2BR", dec!(1_000), Some(dec!(1_900)), VacatePlan::MarketAdjustment, 0),
                unit("2BR", dec!(1_050), None, VacatePlan::VacateAndRelease, 1),
            ],
            market_rents: vec![
                MarketRentAssumption {
                    layout: "1BR".into(),
                    pro_forma_rent: dec!(1_550),
                },
                MarketRentAssumption {
                    layout: "2BR".into(),
                    pro_forma_rent: dec!(2_100),
                },
            ],
            amenities: vec![AmenityIncome {
                name: "Parking".into(),
                start_month: 1,
                utilization_percent: dec!(85),
                unit_count: dec!(30),
                monthly_fee: dec!(75),
            }],
        }
    }

    #[test]
    fn test_pro_forma_rent_by_vacate_plan() {
        let out = calculate_residential_income(&sample_input()).result;
        let pf: Vec<Decimal> = out.units.iter().map(|u| u.pro_forma_rent).collect();
        assert_eq!(pf, vec![dec!(1_400), dec!(1_550), dec!(2_100), dec!(2_100)]);
        assert_eq!(out.total_current_rent, dec!(4_650));
        assert_eq!(out.total_pro_forma_rent, dec!(7_150));
        assert_eq!(out.annual_pro_forma_rent, dec!(85_800));
        assert_eq!(out.total_square_feet, dec!(3_470));
        assert_eq!(out.unit_count, 4);
    }

    #[test]
    fn test_layout_summary_skips_unscheduled_moves() {
        let out = calculate_residential_income(&sample_input()).result;
        let one = &out.layouts[0];
        assert_eq!(one.unit_count, 2);
        assert_eq!(one.total_square_feet, dec!(1_420));
        assert_eq!(one.average_current_rent, dec!(1_375));
        // 2 * 1,550 / 1,420
        assert_eq!(one.pro_forma_rent_per_sf, dec!(3_100) / dec!(1_420));

        // The market adjustment with no month is left out
        let two = &out.layouts[1];
        assert_eq!(two.unit_count, 1);
        assert_eq!(two.total_square_feet, dec!(1_050));
        assert_eq!(two.current_rent_per_sf, Decimal::ZERO);
        assert_eq!(two.pro_forma_rent_per_sf, dec!(2_100) / dec!(1_050));
    }

    #[test]
    fn test_amenity_usage_rounds_to_whole_spaces() {
        let out = calculate_residential_income(&sample_input()).result;
        let parking = &out.amenities[0];
        // 85% of 30 = 25.5, rounds up to 26
        assert_eq!(parking.usage, dec!(26));
        assert_eq!(parking.monthly_income, dec!(1_950));
        assert_eq!(parking.annual_income, dec!(23_400));
        assert_eq!(out.total_amenity_annual, dec!(23_400));
        assert_eq!(amenity_usage(dec!(10), dec!(4)), dec!(0));
        assert_eq!(amenity_usage(dec!(12.5), dec!(4)), dec!(1));
    }

    #[test]
    fn test_missing_market_rent_warns() {
        let mut input = sample_input();
        input.market_rents.truncate(1);
        let result = calculate_residential_income(&input);
        assert_eq!(result.result.units[3].pro_forma_rent, Decimal::ZERO);
        assert!(result.warnings.iter().any(|w| w.contains("'2BR'")));
    }

    #[test]
    fn test_over_full_utilization_is_clamped() {
        let mut input = sample_input();
        input.amenities[0].utilization_percent = dec!(140);
        let result = calculate_residential_income(&input);
        assert_eq!(result.result.amenities[0].usage, dec!(30));
        assert!(result.warnings.iter().any(|w| w.contains("exceeds 100%")));
    }

    #[test]
    fn test_rows_accept_rent_roll_json() {
        let input: ResidentialIncomeInput = serde_json::from_str(
            r#"{
                "units": [
                    {"layout": "Studio", "square_feet": 450, "current_rent": null, "vacate_flag": 1, "vacate_month": 3},
                    {"layout": "Studio", "square_feet": "460", "current_rent": "1100", "vacate_flag": "0"}
                ],
                "market_rent_assumptions": [{"layout": "Studio", "pf_rent": 1200}],
                "amenities": [{"name": "Storage", "start_month": 1, "utilization": 50, "unit_count": 10, "monthly_fee": 40}]
            }"#,
        )
        .unwrap();
        assert_eq!(input.units[0].vacate, VacatePlan::VacateAndRelease);
        assert_eq!(input.units[1].vacate, VacatePlan::Keep);
        let out = calculate_residential_income(&input).result;
        assert_eq!(out.total_pro_forma_rent, dec!(2_300));
        assert_eq!(out.total_amenity_monthly, dec!(200));
    }
}
