use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::UnderwritingError;
use crate::types::{Money, Month, Percent, Rate, MAX_FACTOR};
use crate::UnderwritingResult;

/// Longest amortization schedule accepted, in years.
pub const MAX_AMORTIZATION_YEARS: u32 = 100;

/// Interest-only treatment of a loan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestOnly {
    /// Fully amortizing from the first payment.
    #[default]
    None,
    /// Interest-only for the life of the loan.
    Full,
    /// Interest-only for `LoanTerms::interest_only_months`, then amortizing.
    Partial,
}

/// Rate and amortization shared by every sizing method for a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Annual interest rate, percent (6.75 = 6.75%)
    pub annual_rate_percent: Percent,
    /// Amortization period in years
    pub amortization_years: u32,
    #[serde(default)]
    pub io: InterestOnly,
    /// Interest-only months before amortization starts (`InterestOnly::Partial` only)
    #[serde(default)]
    pub interest_only_months: Month,
}

impl LoanTerms {
    /// Build fully-amortizing terms, rejecting a non-positive amortization
    /// or a negative rate.
    pub fn new(annual_rate_percent: Percent, amortization_years: u32) -> UnderwritingResult<Self> {
        let terms = LoanTerms {
            annual_rate_percent,
            amortization_years,
            io: InterestOnly::None,
            interest_only_months: 0,
        };
        terms.validate()?;
        Ok(terms)
    }

    pub fn validate(&self) -> UnderwritingResult<()> {
        amortization_months(self.annual_rate_percent, self.amortization_years).map(|_| ())
    }

    /// Amortizing annual loan constant for these terms.
    pub fn loan_constant(&self) -> UnderwritingResult<Rate> {
        loan_constant(self.annual_rate_percent, self.amortization_years)
    }
}

/// Annual debt service on a principal amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtService {
    /// Annual payment once the loan amortizes (interest only when `InterestOnly::Full`)
    pub annual: Money,
    /// `annual / 12`
    pub monthly: Money,
    /// Annual interest-only payment during an IO period
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_only_annual: Option<Money>,
}

/// Annual loan constant: debt service per unit of principal per year for a
/// fixed-rate, fully-amortizing, level-payment loan.
///
/// A zero rate falls back to straight-line repayment (`12 / n`).
pub fn loan_constant(annual_rate_percent: Percent, amortization_years: u32) -> UnderwritingResult<Rate> {
    let months = amortization_months(annual_rate_percent, amortization_years)?;
    let monthly_rate = annual_rate_percent / dec!(100) / dec!(12);

    if monthly_rate.is_zero() {
        return Ok(dec!(12) / Decimal::from(months));
    }

    let compound = compound_factor(monthly_rate, months)?;
    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(UnderwritingError::DivisionByZero {
            context: "loan constant denominator".into(),
        });
    }

    Ok(monthly_rate * compound / denominator * dec!(12))
}

/// Level monthly payment: P * r(1+r)^n / ((1+r)^n - 1)
pub fn monthly_payment(
    principal: Money,
    annual_rate_percent: Percent,
    amortization_years: u32,
) -> UnderwritingResult<Money> {
    let months = amortization_months(annual_rate_percent, amortization_years)?;
    let monthly_rate = annual_rate_percent / dec!(100) / dec!(12);

    if monthly_rate.is_zero() {
        // Interest-free: straight-line amortisation
        return Ok(principal / Decimal::from(months));
    }

    let annual = principal.checked_mul(loan_constant(annual_rate_percent, amortization_years)?);
    Ok(representable(annual)? / dec!(12))
}

/// Debt service on `principal` under `terms`, honouring interest-only periods.
pub fn debt_service(principal: Money, terms: &LoanTerms) -> UnderwritingResult<DebtService> {
    terms.validate()?;
    let interest_only = representable(principal.checked_mul(terms.annual_rate_percent))? / dec!(100);

    let service = match terms.io {
        InterestOnly::Full => DebtService {
            annual: interest_only,
            monthly: interest_only / dec!(12),
            interest_only_annual: Some(interest_only),
        },
        InterestOnly::None | InterestOnly::Partial => {
            let annual = representable(principal.checked_mul(terms.loan_constant()?))?;
            DebtService {
                annual,
                monthly: annual / dec!(12),
                interest_only_annual: (terms.io == InterestOnly::Partial
                    && terms.interest_only_months > 0)
                    .then_some(interest_only),
            }
        }
    };

    Ok(service)
}

/// Principal outstanding after `months_elapsed` scheduled payments.
pub fn balance_outstanding(
    principal: Money,
    terms: &LoanTerms,
    months_elapsed: Month,
) -> UnderwritingResult<Money> {
    terms.validate()?;

    let amortizing_months = match terms.io {
        InterestOnly::Full => return Ok(principal),
        InterestOnly::None => months_elapsed,
        InterestOnly::Partial => months_elapsed.saturating_sub(terms.interest_only_months),
    };
    if amortizing_months == 0 {
        return Ok(principal);
    }

    let total_months = amortization_months(terms.annual_rate_percent, terms.amortization_years)?;
    if amortizing_months >= total_months {
        return Ok(Decimal::ZERO);
    }

    let monthly_rate = terms.annual_rate_percent / dec!(100) / dec!(12);
    if monthly_rate.is_zero() {
        // Straight-line amortisation
        let paid = representable(principal.checked_mul(Decimal::from(amortizing_months)))?
            / Decimal::from(total_months);
        return Ok((principal - paid).max(Decimal::ZERO));
    }

    // B_k = P(1+r)^k - PMT * ((1+r)^k - 1) / r
    let payment = monthly_payment(principal, terms.annual_rate_percent, terms.amortization_years)?;
    let grown = compound_factor(monthly_rate, amortizing_months)?;
    let accrued = representable(principal.checked_mul(grown))?;
    let repaid = representable(payment.checked_mul(grown - Decimal::ONE))? / monthly_rate;
    let balance = accrued - repaid;

    Ok(balance.max(Decimal::ZERO))
}

fn amortization_months(annual_rate_percent: Percent, amortization_years: u32) -> UnderwritingResult<u32> {
    if amortization_years == 0 {
        return Err(UnderwritingError::InvalidInput {
            field: "amortization_years".into(),
            reason: "Amortization must be at least 1 year".into(),
        });
    }
    if amortization_years > MAX_AMORTIZATION_YEARS {
        return Err(UnderwritingError::InvalidInput {
            field: "amortization_years".into(),
            reason: format!("Amortization cannot exceed {MAX_AMORTIZATION_YEARS} years"),
        });
    }
    if annual_rate_percent < Decimal::ZERO {
        return Err(UnderwritingError::InvalidInput {
            field: "annual_rate_percent".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    if annual_rate_percent > MAX_FACTOR {
        return Err(UnderwritingError::InvalidInput {
            field: "annual_rate_percent".into(),
            reason: format!("Interest rate cannot exceed {MAX_FACTOR}%"),
        });
    }
    amortization_years
        .checked_mul(12)
        .ok_or_else(|| UnderwritingError::InvalidInput {
            field: "amortization_years".into(),
            reason: "Amortization term is too long".into(),
        })
}

fn representable(value: Option<Decimal>) -> UnderwritingResult<Decimal> {
    value.ok_or_else(|| UnderwritingError::InvalidInput {
        field: "principal".into(),
        reason: "Loan amount is too large to amortize".into(),
    })
}

/// (1 + r)^n, rejecting rates large enough to overflow 128-bit decimals.
fn compound_factor(monthly_rate: Rate, months: u32) -> UnderwritingResult<Decimal> {
    (Decimal::ONE + monthly_rate)
        .checked_powu(u64::from(months))
        .ok_or_else(|| UnderwritingError::InvalidInput {
            field: "annual_rate_percent".into(),
            reason: format!("Rate compounds beyond representable range over {months} months"),
        })
}
