use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Percentages as entered in the wizard (6.75 = 6.75%).
pub type Percent = Decimal;

/// Rates and ratios expressed as fractions (0.0675 = 6.75%).
pub type Rate = Decimal;

/// Multiples (e.g., 1.25x DSCR)
pub type Multiple = Decimal;

/// Rentable area in square feet
pub type SquareFeet = Decimal;

/// Model month index, 1-based from acquisition closing
pub type Month = u32;

/// Property type a model is built for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PropertyType {
    #[default]
    Multifamily,
    Industrial,
    Retail,
    MixedUse,
}

impl PropertyType {
    /// Whether the model carries a residential (unit-based) income stream.
    pub fn has_residential_income(&self) -> bool {
        matches!(self, PropertyType::Multifamily | PropertyType::MixedUse)
    }

    /// Whether the model carries a commercial (tenant roster) income stream.
    pub fn has_commercial_income(&self) -> bool {
        !matches!(self, PropertyType::Multifamily)
    }
}

impl std::str::FromStr for PropertyType {
    type Err = crate::error::UnderwritingError;

    /// Accepts the wizard's labels ("Mixed Use", "mixed-use", "Retail", ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "multifamily" => Ok(PropertyType::Multifamily),
            "industrial" => Ok(PropertyType::Industrial),
            "retail" => Ok(PropertyType::Retail),
            "mixeduse" => Ok(PropertyType::MixedUse),
            _ => Err(crate::error::UnderwritingError::InvalidInput {
                field: "property_type".into(),
                reason: format!("Unknown property type '{s}'"),
            }),
        }
    }
}

impl TryFrom<String> for PropertyType {
    type Error = crate::error::UnderwritingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Lowercase a form label and drop everything but letters and digits, so
/// "Per SF / Yr." and "PerSfYr" compare equal.
pub(crate) fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Divide, returning zero when the denominator is zero or the quotient overflows.
pub(crate) fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Divide, returning `None` when the denominator is zero or the quotient overflows.
pub(crate) fn checked_ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    numerator.checked_div(denominator)
}

/// Largest magnitude accepted for amounts, areas and counts.
pub const MAX_AMOUNT: Decimal = dec!(10_000_000_000);

/// Largest magnitude accepted for percentages, multiples, rates and terms.
pub const MAX_FACTOR: Decimal = dec!(1_000);

/// Non-zero inputs finer than this are treated as zero.
pub const MIN_MAGNITUDE: Decimal = dec!(0.000001);

/// Screen an input against `max`, returning `None` (with a warning) when it
/// is too large to compute with. Non-zero values below [`MIN_MAGNITUDE`]
/// collapse to zero so they take the usual zero-divisor paths.
pub(crate) fn bounded(
    value: Decimal,
    max: Decimal,
    label: &str,
    warnings: &mut Vec<String>,
) -> Option<Decimal> {
    screen(value, max, label, "N/A", warnings)
}

/// [`bounded`] for an optional input.
pub(crate) fn bounded_opt(
    value: Option<Decimal>,
    max: Decimal,
    label: &str,
    warnings: &mut Vec<String>,
) -> Option<Decimal> {
    value.and_then(|v| bounded(v, max, label, warnings))
}

/// [`bounded`] for a required input; out-of-range values become zero.
pub(crate) fn bounded_or_zero(
    value: Decimal,
    max: Decimal,
    label: &str,
    warnings: &mut Vec<String>,
) -> Decimal {
    screen(value, max, label, "treated as 0", warnings).unwrap_or(Decimal::ZERO)
}

fn screen(
    value: Decimal,
    max: Decimal,
    label: &str,
    fallback: &str,
    warnings: &mut Vec<String>,
) -> Option<Decimal> {
    let magnitude = value.abs();
    if magnitude > max {
        warnings.push(format!("{label} of {value} is out of range; {fallback}"));
        None
    } else if !value.is_zero() && magnitude < MIN_MAGNITUDE {
        warnings.push(format!("{label} of {value} is too small; treated as 0"));
        Some(Decimal::ZERO)
    } else {
        Some(value)
    }
}

/// Round to `dp` places with ties toward positive infinity, as the wizard's
/// `Math.round(x * 10^dp) / 10^dp` does.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    let strategy = if value.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    value.round_dp_with_strategy(dp, strategy)
}

/// Clamp a percentage input to [0, 100], noting any adjustment.
pub(crate) fn clamp_percent(value: Percent, label: &str, warnings: &mut Vec<String>) -> Percent {
    if value < Decimal::ZERO {
        warnings.push(format!("{label} of {value}% is negative; treated as 0%"));
        Decimal::ZERO
    } else if value > dec!(100) {
        warnings.push(format!("{label} of {value}% exceeds 100%; treated as 100%"));
        dec!(100)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_up_ties_toward_positive_infinity() {
        assert_eq!(round_half_up(dec!(1.005), 2), dec!(1.01));
        assert_eq!(round_half_up(dec!(-1.005), 2), dec!(-1.00));
        assert_eq!(round_half_up(dec!(-1.006), 2), dec!(-1.01));
        assert_eq!(round_half_up(dec!(2.5), 0), dec!(3));
        assert_eq!(round_half_up(dec!(-2.5), 0), dec!(-2));
    }

    #[test]
    fn test_bounded_rejects_out_of_range() {
        let mut warnings = Vec::new();
        assert_eq!(
            bounded(dec!(9999999999999999999999999999), MAX_AMOUNT, "Price", &mut warnings),
            None
        );
        assert_eq!(bounded(dec!(0.0000000001), MAX_FACTOR, "Cap rate", &mut warnings), Some(Decimal::ZERO));
        assert_eq!(bounded(dec!(-250), MAX_FACTOR, "Rate", &mut warnings), Some(dec!(-250)));
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("out of range"));
    }

    #[test]
    fn test_property_type_accepts_wizard_labels() {
        for label in ["\"Mixed Use\"", "\"mixed-use\"", "\"MixedUse\""] {
            let parsed: PropertyType = serde_json::from_str(label).unwrap();
            assert_eq!(parsed, PropertyType::MixedUse);
        }
        let retail: PropertyType = serde_json::from_str("\"RETAIL\"").unwrap();
        assert_eq!(retail, PropertyType::Retail);
        assert!(serde_json::from_str::<PropertyType>("\"Self Storage\"").is_err());
    }
}
