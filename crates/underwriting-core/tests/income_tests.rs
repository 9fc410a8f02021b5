use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use underwriting_core::income::expenses::{
    schedule_operating_expenses, ExpenseFactor, ExpenseScheduleInput, OperatingExpense,
};
use underwriting_core::income::recoveries::{
    allocate_recoveries, RecoverableExpense, RecoveryFactor, RecoveryInput, RentType,
    RentTypeIncluded, TenantLease,
};

fn tenant(name: &str, sf: Decimal, rent: Decimal, rent_type: RentType) -> TenantLease {
    TenantLease {
        suite: format!("Suite {name}"),
        tenant_name: name.into(),
        square_feet: sf,
        lease_start_month: 1,
        lease_end_month: 60,
        rent_start_month: 1,
        annual_bumps_percent: dec!(3),
        rent_per_sf_per_year: rent,
        rent_type,
    }
}

fn scenario() -> RecoveryInput {
    RecoveryInput {
        tenants: vec![
            tenant("A", dec!(25_000), dec!(12), RentType::Nnn),
            tenant("B", dec!(15_000), dec!(18), RentType::Gross),
        ],
        expenses: vec![RecoverableExpense {
            name: "CAM".into(),
            factor: RecoveryFactor::Annual,
            cost_per: dec!(8_500),
            rent_type_included: RentTypeIncluded::Both,
        }],
        vacancy_percent: Decimal::ZERO,
    }
}

// ===========================================================================
// Recoverable income
// ===========================================================================

#[test]
fn test_gpi_reference_scenario() {
    let out = allocate_recoveries(&scenario()).result;
    assert_eq!(
        (out.total_square_feet, out.base_annual_rent, out.recovery_income),
        (dec!(40_000), dec!(570_000), dec!(8_500))
    );
    assert_eq!(out.gpi_before_vacancy, dec!(578_500));
    assert_eq!(out.gpi_before_vacancy_per_sf, dec!(14.4625));
    assert_eq!(out.gpi_after_vacancy, dec!(578_500));
}

#[test]
fn test_reference_scenario_tenant_rows() {
    let out = allocate_recoveries(&scenario()).result;
    let rows: Vec<(String, Decimal, Decimal)> = out
        .tenants
        .iter()
        .map(|t| (t.tenant_name.clone(), t.share_of_total_sf, t.annual_base_rent))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("A".to_string(), dec!(0.625), dec!(300_000)),
            ("B".to_string(), dec!(0.375), dec!(270_000)),
        ]
    );
}

#[test]
fn test_percent_of_base_rent_expense() {
    let mut input = scenario();
    input.expenses.push(RecoverableExpense {
        name: "Management".into(),
        factor: RecoveryFactor::PercentOfBaseRent,
        cost_per: dec!(4),
        rent_type_included: RentTypeIncluded::Nnn,
    });
    let out = allocate_recoveries(&input).result;
    // 4% of 570,000 = 22,800, recovered from the 62.5% NNN share
    assert_eq!(out.recoverable_nnn, dec!(22_800));
    assert_eq!(out.recovery_income, dec!(8_500) + dec!(14_250));
}

#[test]
fn test_vacancy_applied_after_recoveries() {
    let mut input = scenario();
    input.vacancy_percent = dec!(5);
    let out = allocate_recoveries(&input).result;
    assert_eq!(out.vacancy_deduction, dec!(28_925));
    assert_eq!(out.gpi_after_vacancy, dec!(549_575));
}

// ===========================================================================
// Operating expense schedule
// ===========================================================================

#[test]
fn test_expense_schedule_partial_year() {
    let input = ExpenseScheduleInput {
        expenses: vec![
            OperatingExpense {
                name: "Property Taxes".into(),
                factor: ExpenseFactor::Total,
                cost_per: dec!(48_000),
                statistic: Decimal::ZERO,
                start_month: None,
                end_month: None,
            },
            OperatingExpense {
                name: "Payroll".into(),
                factor: ExpenseFactor::PerMonth,
                cost_per: dec!(2_000),
                statistic: dec!(6),
                start_month: Some(7),
                end_month: Some(12),
            },
        ],
        purchase_price: None,
        acquisition_loan: None,
    };
    let out = schedule_operating_expenses(&input).result;
    let monthly: Vec<(u32, Decimal)> = out
        .expenses
        .iter()
        .map(|e| (e.months_in_period, e.monthly_amount))
        .collect();
    assert_eq!(monthly, vec![(12, dec!(4_000)), (6, dec!(2_000))]);
    assert_eq!(out.total_annual, dec!(60_000));
    assert_eq!(out.total_monthly, dec!(6_000));
}
