//! Full-model evaluation: every component in dependency order, flattened into
//! the wizard's variables map.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{InterestOnly, LoanTerms};
use crate::exit::valuation::{
    value_exit, ExitAssumptions, ExitValuationInput, ExitValuationOutput, IncomeStream,
    StreamExitInput,
};
use crate::financing::acquisition::{size_acquisition_loan, AcquisitionLoanInput, AcquisitionLoanOutput};
use crate::financing::refinance::{size_refinance, ExistingLoan, RefinanceInput, RefinanceOutput};
use crate::financing::sizing::{
    DebtYieldMethod, DscrMethod, FixedMethod, LoanMethodResult, LtvMethod, SizingMethod,
    SizingMethods,
};
use crate::income::expenses::{
    schedule_operating_expenses, ExpenseScheduleInput, ExpenseScheduleOutput, OperatingExpense,
};
use crate::income::recoveries::{
    allocate_recoveries, RecoverableExpense, RecoveryInput, RecoveryOutput, TenantLease,
};
use crate::income::residential::{
    calculate_residential_income, AmenityIncome, MarketRentAssumption, ResidentialIncomeInput,
    ResidentialIncomeOutput, ResidentialUnit,
};
use crate::leasing::reserves::{
    calculate_leasing_reserves, LeasingCostAssumptions, LeasingReserveInput, LeasingReserveOutput,
};
use crate::types::{with_metadata, ComputationOutput, Month, Percent, PropertyType};
use crate::variables::{keys, FieldValue, FieldValues, Variables};

/// Fixed loan amount the wizard starts from.
const DEFAULT_FIXED_LOAN_AMOUNT: Decimal = dec!(750_000);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnderwritingInput {
    #[serde(default)]
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition: Option<AcquisitionLoanInput>,
    #[serde(default)]
    pub tenants: Vec<TenantLease>,
    #[serde(default)]
    pub recoverable_expenses: Vec<RecoverableExpense>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residential: Option<ResidentialIncomeInput>,
    #[serde(default)]
    pub operating_expenses: Vec<OperatingExpense>,
    #[serde(default)]
    pub vacancy_percent: Percent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leasing: Option<LeasingCostAssumptions>,
    /// Present only when a permanent loan is issued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinance: Option<RefinanceInput>,
    #[serde(default)]
    pub exit: Vec<StreamExitInput>,
    /// Field values that were present but unusable, noted while mapping
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_warnings: Vec<String>,
}

/// The wizard's own payload: field values plus the grid rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WizardInput {
    pub fields: Vec<FieldValue>,
    #[serde(default)]
    pub tenants: Vec<TenantLease>,
    #[serde(default)]
    pub recoverable_expenses: Vec<RecoverableExpense>,
    #[serde(default)]
    pub operating_expenses: Vec<OperatingExpense>,
    #[serde(default)]
    pub units: Vec<ResidentialUnit>,
    #[serde(default, alias = "market_rent_assumptions")]
    pub market_rents: Vec<MarketRentAssumption>,
    #[serde(default, alias = "amenity_income")]
    pub amenities: Vec<AmenityIncome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnderwritingOutput {
    pub property_type: PropertyType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recoveries: Option<RecoveryOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residential: Option<ResidentialIncomeOutput>,
    pub operating_expenses: ExpenseScheduleOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leasing: Option<LeasingReserveOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acquisition: Option<AcquisitionLoanOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinance: Option<RefinanceOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitValuationOutput>,
    pub variables: Variables,
}

// ---------------------------------------------------------------------------
// Field mapping
// ---------------------------------------------------------------------------

impl UnderwritingInput {
    /// Map the wizard's named fields onto a typed model input.
    ///
    /// Never fails: the wizard saves half-filled forms, so absent fields take
    /// the wizard's defaults and unusable ones are noted in
    /// `field_warnings`, leaving the affected figures "N/A". Grid rows
    /// (tenants, units, expenses) are not field values and are left empty.
    pub fn from_fields(fields: &FieldValues) -> Self {
        let mut reader = FieldReader::new(fields);

        let property_type = reader.property_type();
        let acquisition = acquisition_from_fields(&mut reader);
        let vacancy_percent = reader.decimal_or(keys::VACANCY, dec!(5));
        let leasing = leasing_from_fields(&mut reader);
        let refinance = refinance_from_fields(&mut reader);
        let exit = exit_from_fields(&mut reader, property_type);

        UnderwritingInput {
            property_type,
            acquisition: Some(acquisition),
            tenants: Vec::new(),
            recoverable_expenses: Vec::new(),
            residential: None,
            operating_expenses: Vec::new(),
            vacancy_percent,
            leasing,
            refinance,
            exit,
            field_warnings: reader.warnings,
        }
    }
}

impl WizardInput {
    pub fn to_underwriting_input(&self) -> UnderwritingInput {
        let fields = FieldValues::from_entries(self.fields.iter().cloned());
        let mut input = UnderwritingInput::from_fields(&fields);
        input.tenants = self.tenants.clone();
        input.recoverable_expenses = self.recoverable_expenses.clone();
        input.operating_expenses = self.operating_expenses.clone();
        let residential = ResidentialIncomeInput {
            units: self.units.clone(),
            market_rents: self.market_rents.clone(),
            amenities: self.amenities.clone(),
        };
        input.residential = (!residential.is_empty()).then_some(residential);
        input
    }
}

/// Reads typed values from the field map, noting values that are filled in
/// but cannot be used.
struct FieldReader<'a> {
    fields: &'a FieldValues,
    warnings: Vec<String>,
}

impl<'a> FieldReader<'a> {
    fn new(fields: &'a FieldValues) -> Self {
        Self {
            fields,
            warnings: Vec::new(),
        }
    }

    fn is_filled(&self, key: &str) -> bool {
        match self.fields.raw(key) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.fields.contains(key)
    }

    fn decimal(&mut self, key: &str) -> Option<Decimal> {
        let value = self.fields.decimal(key);
        if value.is_none() && self.is_filled(key) {
            self.warnings.push(format!("'{key}' is not a number; ignored"));
        }
        value
    }

    fn decimal_or(&mut self, key: &str, default: Decimal) -> Decimal {
        self.decimal(key).unwrap_or(default)
    }

    /// Whole, non-negative count; anything else is noted and dropped.
    fn whole(&mut self, key: &str) -> Option<Month> {
        let value = self.decimal(key)?;
        let whole = if value.fract().is_zero() {
            self.fields.whole(key)
        } else {
            None
        };
        if whole.is_none() {
            self.warnings
                .push(format!("'{key}' of {value} is not a whole number; ignored"));
        }
        whole
    }

    fn flag_or(&mut self, key: &str, default: bool) -> bool {
        match self.fields.flag(key) {
            Some(flag) => flag,
            None => {
                if self.is_filled(key) {
                    let shown = if default { "yes" } else { "no" };
                    self.warnings
                        .push(format!("'{key}' is not yes or no; treated as {shown}"));
                }
                default
            }
        }
    }

    fn property_type(&mut self) -> PropertyType {
        let key = keys::PROPERTY_TYPE;
        let parsed = self.fields.text(key).map(str::parse::<PropertyType>);
        match parsed {
            Some(Ok(property_type)) => property_type,
            Some(Err(_)) | None if self.is_filled(key) => {
                let fallback = PropertyType::default();
                self.warnings.push(format!(
                    "'{key}' is not a known property type; treated as {fallback:?}"
                ));
                fallback
            }
            _ => PropertyType::default(),
        }
    }

    /// Loan terms as entered. Unusable amortization becomes 0 years, which
    /// every sizing method reports as "N/A".
    fn loan_terms(&mut self, rate_key: &str, amortization_key: &str) -> LoanTerms {
        let annual_rate_percent = self.decimal_or(rate_key, dec!(5));
        let amortization_years = if self.is_filled(amortization_key) {
            self.whole(amortization_key).unwrap_or(0)
        } else {
            30
        };
        LoanTerms {
            annual_rate_percent,
            amortization_years,
            io: InterestOnly::None,
            interest_only_months: 0,
        }
    }
}

fn acquisition_from_fields(r: &mut FieldReader<'_>) -> AcquisitionLoanInput {
    let terms = r.loan_terms(keys::AQ_INTEREST_RATE, keys::AQ_AMORTIZATION);

    let ltv = Some(LtvMethod {
        enabled: r.flag_or(keys::AQ_LTV_ENABLED, false),
        ltv_percent: r.decimal_or(keys::LTV, Decimal::ZERO),
        finance_hard_costs: r.flag_or(keys::FINANCE_HARD_COSTS, false),
        hard_cost_amount: r.decimal_or(keys::HARD_COST_AMOUNT, Decimal::ZERO),
        hard_cost_ltc_percent: r.decimal_or(keys::LTC_ON_HARD_COSTS, dec!(75)),
    });
    let dscr = Some(DscrMethod {
        enabled: r.flag_or(keys::AQ_DSCR_ENABLED, false),
        min_dscr: r.decimal_or(keys::MIN_DSCR, dec!(1.25)),
    });
    let debt_yield = r.decimal(keys::MIN_DEBT_YIELD).map(|min| DebtYieldMethod {
        enabled: r.flag_or(keys::AQ_DEBT_YIELD_ENABLED, false),
        min_debt_yield_percent: min,
    });
    let fixed = Some(FixedMethod {
        enabled: r.flag_or(keys::AQ_FIXED_ENABLED, false),
        amount: r.decimal_or(keys::FIXED_LOAN_AMOUNT, DEFAULT_FIXED_LOAN_AMOUNT),
    });

    AcquisitionLoanInput {
        purchase_price: r.decimal(keys::ACQUISITION_PRICE),
        noi: r.decimal(keys::AQ_NOI),
        terms,
        methods: SizingMethods {
            ltv,
            dscr,
            debt_yield,
            fixed,
        },
        interest_reserve_months: r.decimal(keys::INTEREST_RESERVE_MONTHS),
    }
}

fn refinance_from_fields(r: &mut FieldReader<'_>) -> Option<RefinanceInput> {
    if !r.flag_or(keys::PERMANENT_LOAN_ISSUED, false) {
        return None;
    }

    let refinance_month = r.whole(keys::REFI_MONTH);
    let terms = r.loan_terms(keys::REFI_INTEREST_RATE, keys::REFI_AMORTIZATION);

    Some(RefinanceInput {
        refinance_month,
        projected_noi: r.decimal(keys::REFI_NOI),
        applied_cap_rate_percent: Some(r.decimal_or(keys::REFI_CAP_RATE, dec!(6))),
        terms,
        methods: SizingMethods {
            ltv: Some(LtvMethod {
                enabled: true,
                ltv_percent: r.decimal_or(keys::REFI_LTV_MAX, dec!(75)),
                finance_hard_costs: false,
                hard_cost_amount: Decimal::ZERO,
                hard_cost_ltc_percent: Decimal::ZERO,
            }),
            dscr: Some(DscrMethod {
                enabled: true,
                min_dscr: r.decimal_or(keys::REFI_MIN_DSCR, dec!(1.25)),
            }),
            debt_yield: Some(DebtYieldMethod {
                enabled: true,
                min_debt_yield_percent: r.decimal_or(keys::REFI_DEBT_YIELD_MIN, dec!(8.75)),
            }),
            fixed: None,
        },
        origination_cost_percent: r.decimal_or(keys::REFI_ORIGINATION_COST, Decimal::ZERO),
        sponsor_equity_share_percent: r.decimal(keys::REFI_SPONSOR_SHARE),
        principal_outstanding: None,
        existing_loan: None,
    })
}

fn leasing_from_fields(r: &mut FieldReader<'_>) -> Option<LeasingCostAssumptions> {
    let leasing_keys = [
        keys::RENEWAL_PROBABILITY,
        keys::RENT_NEW,
        keys::RENT_RENEWAL,
        keys::TI_NEW,
        keys::TI_RENEWAL,
    ];
    if !leasing_keys.iter().any(|k| r.contains(k)) {
        return None;
    }
    Some(LeasingCostAssumptions {
        renewal_probability_percent: r.decimal_or(keys::RENEWAL_PROBABILITY, Decimal::ZERO),
        rent_new_per_sf: r.decimal_or(keys::RENT_NEW, Decimal::ZERO),
        rent_renewal_per_sf: r.decimal_or(keys::RENT_RENEWAL, Decimal::ZERO),
        ti_new_per_sf: r.decimal_or(keys::TI_NEW, Decimal::ZERO),
        ti_renewal_per_sf: r.decimal_or(keys::TI_RENEWAL, Decimal::ZERO),
        commission_new_percent: r.decimal_or(keys::COMMISSION_NEW, Decimal::ZERO),
        commission_renewal_percent: r.decimal_or(keys::COMMISSION_RENEWAL, Decimal::ZERO),
        // The wizard defaults lease terms to one year
        term_new_years: r.decimal_or(keys::TERM_NEW, Decimal::ONE),
        term_renewal_years: r.decimal_or(keys::TERM_RENEWAL, Decimal::ONE),
    })
}

fn exit_from_fields(r: &mut FieldReader<'_>, property_type: PropertyType) -> Vec<StreamExitInput> {
    let mut streams = Vec::new();

    if property_type.has_residential_income()
        && (r.contains(keys::MF_EXIT_CAP_RATE) || r.contains(keys::MF_EXIT_MONTH))
    {
        streams.push(StreamExitInput {
            stream: IncomeStream::Residential,
            forward_noi: r.decimal(keys::FORWARD_NOI),
            assumptions: ExitAssumptions {
                exit_month: r.whole(keys::MF_EXIT_MONTH).unwrap_or(0),
                exit_cap_rate_percent: r.decimal(keys::MF_EXIT_CAP_RATE),
                selling_costs_percent: r.decimal_or(keys::MF_SELLING_COSTS, Decimal::ZERO),
            },
            units: r.decimal(keys::NUMBER_OF_UNITS),
        });
    }

    if property_type.has_commercial_income()
        && (r.contains(keys::RETAIL_EXIT_CAP_RATE) || r.contains(keys::RETAIL_EXIT_MONTH))
    {
        let forward_noi = if property_type == PropertyType::MixedUse {
            r.decimal(keys::RETAIL_FORWARD_NOI)
        } else if r.is_filled(keys::RETAIL_FORWARD_NOI) {
            r.decimal(keys::RETAIL_FORWARD_NOI)
        } else {
            // Single-stream commercial models report NOI under the plain key
            r.decimal(keys::FORWARD_NOI)
        };
        streams.push(StreamExitInput {
            stream: IncomeStream::Commercial,
            forward_noi,
            assumptions: ExitAssumptions {
                exit_month: r.whole(keys::RETAIL_EXIT_MONTH).unwrap_or(0),
                exit_cap_rate_percent: r.decimal(keys::RETAIL_EXIT_CAP_RATE),
                selling_costs_percent: r.decimal_or(keys::RETAIL_SELLING_COSTS, Decimal::ZERO),
            },
            units: None,
        });
    }

    streams
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate the whole model.
///
/// Order: recoveries, residential income, operating expenses, leasing
/// reserves, acquisition loan, loan-dependent expenses, refinance, exit.
/// Component warnings are collected into the envelope, prefixed with the
/// component name.
pub fn underwrite(input: &UnderwritingInput) -> ComputationOutput<UnderwritingOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    absorb(&mut warnings, "Fields", input.field_warnings.clone());

    // --- Recoverable income ---
    let recoveries = if input.tenants.is_empty() && input.recoverable_expenses.is_empty() {
        if input.property_type.has_commercial_income() {
            warnings.push("Recoveries: no tenants on the rent roll".into());
        }
        None
    } else {
        let out = allocate_recoveries(&RecoveryInput {
            tenants: input.tenants.clone(),
            expenses: input.recoverable_expenses.clone(),
            vacancy_percent: input.vacancy_percent,
        });
        absorb(&mut warnings, "Recoveries", out.warnings);
        Some(out.result)
    };
    let total_square_feet = recoveries
        .as_ref()
        .map(|r| r.total_square_feet)
        .unwrap_or(Decimal::ZERO);

    // --- Residential income ---
    let residential = match &input.residential {
        Some(rent_roll) if !rent_roll.is_empty() => {
            let out = calculate_residential_income(rent_roll);
            absorb(&mut warnings, "Residential income", out.warnings);
            Some(out.result)
        }
        _ => {
            if input.property_type.has_residential_income() {
                warnings.push("Residential income: no units on the rent roll".into());
            }
            None
        }
    };

    // --- Operating expenses, before the loan is known ---
    let purchase_price = input.acquisition.as_ref().and_then(|a| a.purchase_price);
    let mut expense_input = ExpenseScheduleInput {
        expenses: input.operating_expenses.clone(),
        purchase_price,
        acquisition_loan: None,
    };
    let needs_loan = input
        .operating_expenses
        .iter()
        .any(|e| e.factor.depends_on_loan());
    let mut operating_expenses = if needs_loan {
        // Evaluated again once the loan is bound
        None
    } else {
        let out = schedule_operating_expenses(&expense_input);
        absorb(&mut warnings, "Operating expenses", out.warnings);
        Some(out.result)
    };

    // --- Leasing reserves ---
    let leasing = input.leasing.as_ref().map(|assumptions| {
        let out = calculate_leasing_reserves(&LeasingReserveInput {
            total_square_feet,
            assumptions: assumptions.clone(),
        });
        absorb(&mut warnings, "Leasing", out.warnings);
        out.result
    });

    // --- Acquisition loan ---
    let acquisition = input.acquisition.as_ref().map(|aq| {
        let out = size_acquisition_loan(aq);
        absorb(&mut warnings, "Acquisition loan", out.warnings);
        out.result
    });
    let acquisition_loan = acquisition.as_ref().and_then(|a| a.max_loan);

    if operating_expenses.is_none() {
        tracing::debug!(loan = ?acquisition_loan, "scheduling loan-dependent operating expenses");
        expense_input.acquisition_loan = acquisition_loan;
        let out = schedule_operating_expenses(&expense_input);
        absorb(&mut warnings, "Operating expenses", out.warnings);
        operating_expenses = Some(out.result);
    }
    let operating_expenses = operating_expenses.unwrap_or_else(|| ExpenseScheduleOutput {
        expenses: Vec::new(),
        total_annual: Decimal::ZERO,
        total_monthly: Decimal::ZERO,
    });

    // --- Refinance ---
    let refinance = input.refinance.as_ref().map(|refi| {
        let mut refi = refi.clone();
        if refi.principal_outstanding.is_none() && refi.existing_loan.is_none() {
            refi.existing_loan = match (acquisition_loan, input.acquisition.as_ref()) {
                (Some(amount), Some(aq)) => Some(ExistingLoan {
                    amount,
                    terms: aq.terms.clone(),
                }),
                _ => None,
            };
        }
        let out = size_refinance(&refi);
        absorb(&mut warnings, "Refinance", out.warnings);
        out.result
    });

    // --- Exit ---
    let rent_roll_units = residential
        .as_ref()
        .filter(|r| r.unit_count > 0)
        .map(|r| Decimal::from(r.unit_count));
    let exit = if input.exit.is_empty() {
        None
    } else {
        let streams = input
            .exit
            .iter()
            .cloned()
            .map(|mut s| {
                if s.stream == IncomeStream::Residential && s.units.is_none() {
                    s.units = rent_roll_units;
                }
                s
            })
            .collect();
        let out = value_exit(&ExitValuationInput { streams });
        absorb(&mut warnings, "Exit", out.warnings);
        Some(out.result)
    };

    let mut output = UnderwritingOutput {
        property_type: input.property_type,
        recoveries,
        residential,
        operating_expenses,
        leasing,
        acquisition,
        refinance,
        exit,
        variables: Variables::new(),
    };
    output.variables = collect_variables(&output, input);

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Acquisition Underwriting (full model)",
        input,
        warnings,
        elapsed,
        output,
    )
}

fn absorb(warnings: &mut Vec<String>, component: &str, incoming: Vec<String>) {
    warnings.extend(incoming.into_iter().map(|w| format!("{component}: {w}")));
}

fn candidate(methods: &[LoanMethodResult], method: SizingMethod) -> Option<Decimal> {
    methods
        .iter()
        .find(|r| r.method == method)
        .and_then(|r| r.candidate_loan_amount)
}

/// Flatten a model output into the wizard's named metrics.
pub fn collect_variables(output: &UnderwritingOutput, input: &UnderwritingInput) -> Variables {
    let mut vars = Variables::new();

    if let Some(r) = &output.recoveries {
        vars.money(keys::BASE_ANNUAL_RENT, Some(r.base_annual_rent));
        vars.money(keys::RECOVERY_INCOME, Some(r.recovery_income));
        vars.money(keys::GPI_BEFORE_VACANCY, Some(r.gpi_before_vacancy));
        vars.ratio(keys::GPI_BEFORE_VACANCY_PER_SF, Some(r.gpi_before_vacancy_per_sf));
        vars.money(keys::VACANCY_DEDUCTION, Some(r.vacancy_deduction));
        vars.money(keys::GPI_AFTER_VACANCY, Some(r.gpi_after_vacancy));
        vars.ratio(keys::GPI_AFTER_VACANCY_PER_SF, Some(r.gpi_after_vacancy_per_sf));
    }

    if let Some(r) = &output.residential {
        vars.money(keys::RESIDENTIAL_UNIT_COUNT, Some(Decimal::from(r.unit_count)));
        vars.money(keys::RESIDENTIAL_SQUARE_FEET, Some(r.total_square_feet));
        vars.money(keys::TOTAL_CURRENT_RENT, Some(r.total_current_rent));
        vars.money(keys::TOTAL_PRO_FORMA_RENT, Some(r.total_pro_forma_rent));
        vars.money(keys::ANNUAL_PRO_FORMA_RENT, Some(r.annual_pro_forma_rent));
        vars.money(keys::AMENITY_INCOME_MONTHLY, Some(r.total_amenity_monthly));
        vars.money(keys::AMENITY_INCOME_ANNUAL, Some(r.total_amenity_annual));
    }

    vars.money(
        keys::TOTAL_OPERATING_EXPENSES,
        Some(output.operating_expenses.total_annual),
    );

    if let Some(l) = &output.leasing {
        vars.money(keys::LEASING_RESERVE, Some(l.weighted_annual_reserve));
        vars.ratio(keys::LEASING_RESERVE_PER_SF, Some(l.reserve_per_sf));
    }

    if let Some(aq) = &output.acquisition {
        let bound = aq.selection.bound();
        vars.money(keys::AQ_NOI, input.acquisition.as_ref().and_then(|a| a.noi));
        vars.money(keys::AQ_LOAN_LTC, candidate(&aq.methods, SizingMethod::Ltv));
        vars.money(keys::AQ_LOAN_DSCR, candidate(&aq.methods, SizingMethod::Dscr));
        if aq.methods.iter().any(|m| m.method == SizingMethod::DebtYield) {
            vars.money(keys::AQ_LOAN_DEBT_YIELD, candidate(&aq.methods, SizingMethod::DebtYield));
        }
        if aq.methods.iter().any(|m| m.method == SizingMethod::Fixed) {
            vars.money(keys::AQ_LOAN_FIXED, candidate(&aq.methods, SizingMethod::Fixed));
        }
        vars.money(keys::AQ_MAX_LOAN, aq.max_loan);
        vars.money(keys::AQ_ANNUAL_DEBT_SERVICE, bound.and_then(|b| b.annual_debt_service));
        vars.money(keys::AQ_MONTHLY_DEBT_SERVICE, bound.and_then(|b| b.monthly_debt_service));
        vars.ratio(keys::AQ_DSCR, bound.and_then(|b| b.dscr));
        vars.percent_of(keys::AQ_LTV, bound.and_then(|b| b.ltv));
        vars.money(keys::AQ_INTEREST_RESERVE, aq.interest_reserve);
    }

    if let Some(refi) = &output.refinance {
        let bound = refi.selection.bound();
        let refi_input = input.refinance.as_ref();
        vars.money(keys::REFI_NOI, refi_input.and_then(|r| r.projected_noi));
        vars.money(keys::REFI_VALUATION, refi.implied_valuation);
        vars.money(keys::REFI_LTV_CALC, candidate(&refi.methods, SizingMethod::Ltv));
        vars.money(keys::REFI_DSCR_CALC, candidate(&refi.methods, SizingMethod::Dscr));
        vars.money(keys::REFI_DEBT_YIELD_CALC, candidate(&refi.methods, SizingMethod::DebtYield));
        vars.money(keys::REFI_MAX_LOAN, refi.max_loan);
        vars.ratio(
            keys::REFI_LOAN_FACTOR,
            refi_input.and_then(|r| r.terms.loan_constant().ok()),
        );
        vars.money(keys::REFI_NET_PROCEEDS, refi.proceeds_net_of_fees);
        vars.money(keys::REFI_CASH_OUT, refi.cash_out);
        vars.money(keys::REFI_SPONSOR_CASH_OUT, refi.sponsor_share_of_cash_out);
        vars.money(keys::REFI_ANNUAL_DEBT_SERVICE, bound.and_then(|b| b.annual_debt_service));
        vars.money(keys::REFI_MONTHLY_DEBT_SERVICE, bound.and_then(|b| b.monthly_debt_service));
        vars.money(keys::AQ_BALANCE_OUTSTANDING, refi.principal_outstanding);
    }

    if let Some(exit) = &output.exit {
        for s in &exit.streams {
            let (noi_key, implied_key, selling_key, net_key) = match s.stream {
                IncomeStream::Residential => (
                    keys::FORWARD_NOI,
                    keys::MF_IMPLIED_VALUATION,
                    keys::MF_SELLING_COSTS_AMOUNT,
                    keys::MF_NET_REVERSION,
                ),
                IncomeStream::Commercial => (
                    keys::RETAIL_FORWARD_NOI,
                    keys::RETAIL_IMPLIED_VALUATION,
                    keys::RETAIL_SELLING_COSTS_AMOUNT,
                    keys::RETAIL_NET_REVERSION,
                ),
            };
            vars.money(noi_key, s.forward_noi);
            vars.money(implied_key, s.implied_valuation);
            vars.money(selling_key, s.selling_costs);
            vars.money(net_key, s.net_reversion_proceeds);
        }
        if exit.streams.len() > 1 {
            vars.money(keys::COMBINED_IMPLIED_VALUATION, exit.combined_implied_valuation);
            vars.ratio(keys::BLENDED_EXIT_CAP_RATE, exit.blended_cap_rate_percent);
        }
    }

    vars
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
