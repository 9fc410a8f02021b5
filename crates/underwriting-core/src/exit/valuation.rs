use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{
    bounded_opt, bounded_or_zero, checked_ratio, with_metadata, ComputationOutput, Money, Month,
    Percent, MAX_AMOUNT, MAX_FACTOR,
};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Income stream sold at exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncomeStream {
    /// Unit-based (multifamily) income
    Residential,
    /// Tenant-roster (retail / industrial) income
    Commercial,
}

impl IncomeStream {
    pub fn label(&self) -> &'static str {
        match self {
            IncomeStream::Residential => "Residential",
            IncomeStream::Commercial => "Commercial",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitAssumptions {
    pub exit_month: Month,
    /// Applied exit cap rate, percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_cap_rate_percent: Option<Percent>,
    /// Selling costs, percent of implied valuation
    #[serde(default)]
    pub selling_costs_percent: Percent,
}

/// One income stream to value at exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamExitInput {
    pub stream: IncomeStream,
    /// Forward (next-twelve-month) NOI at the exit month
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_noi: Option<Money>,
    pub assumptions: ExitAssumptions,
    /// Residential unit count, for per-unit value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitValuationInput {
    pub streams: Vec<StreamExitInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamExitValuation {
    pub stream: IncomeStream,
    pub exit_month: Month,
    pub forward_noi: Option<Money>,
    pub exit_cap_rate_percent: Option<Percent>,
    /// `None` ("N/A") when NOI or a positive cap rate is missing
    pub implied_valuation: Option<Money>,
    pub selling_costs: Option<Money>,
    pub net_reversion_proceeds: Option<Money>,
    pub value_per_unit: Option<Money>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitValuationOutput {
    pub streams: Vec<StreamExitValuation>,
    /// Sum of forward NOI across valued streams
    pub combined_forward_noi: Money,
    pub combined_implied_valuation: Option<Money>,
    pub combined_net_proceeds: Option<Money>,
    /// NOI-weighted exit cap rate, percent; `None` when combined NOI <= 0
    pub blended_cap_rate_percent: Option<Percent>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Direct-capitalisation value of one stream: `(implied, selling, net)`.
pub fn value_at_exit(
    forward_noi: Option<Money>,
    cap_rate_percent: Option<Percent>,
    selling_costs_percent: Percent,
) -> Option<(Money, Money, Money)> {
    let noi = forward_noi?;
    let cap = cap_rate_percent.filter(|c| *c > Decimal::ZERO)?;
    let implied = noi.checked_div(cap)?.checked_mul(dec!(100))?;
    let selling = implied.checked_mul(selling_costs_percent)? / dec!(100);
    Some((implied, selling, implied.checked_sub(selling)?))
}

/// `Σ cap_i × NOI_i / Σ NOI_i`; `None` when the NOI total is not positive.
pub fn blended_cap_rate(pairs: &[(Percent, Money)]) -> Option<Percent> {
    let total_noi: Money = pairs.iter().map(|(_, noi)| *noi).sum();
    if total_noi <= Decimal::ZERO {
        return None;
    }
    let weighted: Decimal = pairs.iter().map(|(cap, noi)| *cap * *noi).sum();
    Some(weighted / total_noi)
}

/// Value each income stream at its exit month and aggregate them.
pub fn value_exit(input: &ExitValuationInput) -> ComputationOutput<ExitValuationOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for (i, s) in input.streams.iter().enumerate() {
        if input.streams[..i].iter().any(|p| p.stream == s.stream) {
            warnings.push(format!(
                "{} stream listed more than once; each entry valued separately",
                s.stream.label()
            ));
        }
    }

    let streams: Vec<StreamExitValuation> = input
        .streams
        .iter()
        .map(|s| value_stream(s, &mut warnings))
        .collect();

    let valued: Vec<&StreamExitValuation> =
        streams.iter().filter(|s| s.implied_valuation.is_some()).collect();

    let combined_forward_noi: Money = valued.iter().filter_map(|s| s.forward_noi).sum();

    let combined_implied_valuation: Option<Money> = if valued.is_empty() {
        None
    } else {
        Some(valued.iter().filter_map(|s| s.implied_valuation).sum())
    };
    let combined_net_proceeds: Option<Money> = if valued.is_empty() {
        None
    } else {
        Some(valued.iter().filter_map(|s| s.net_reversion_proceeds).sum())
    };

    let pairs: Vec<(Percent, Money)> = valued
        .iter()
        .filter_map(|s| Some((s.exit_cap_rate_percent?, s.forward_noi?)))
        .collect();
    let blended_cap_rate_percent = blended_cap_rate(&pairs);
    if blended_cap_rate_percent.is_none() && !pairs.is_empty() {
        warnings.push("Combined forward NOI is not positive; blended cap rate is N/A".into());
    }

    let output = ExitValuationOutput {
        streams,
        combined_forward_noi,
        combined_implied_valuation,
        combined_net_proceeds,
        blended_cap_rate_percent,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    with_metadata(
        "Exit Valuation (direct capitalisation of forward NOI)",
        input,
        warnings,
        elapsed,
        output,
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn value_stream(input: &StreamExitInput, warnings: &mut Vec<String>) -> StreamExitValuation {
    let label = input.stream.label();
    let forward_noi = bounded_opt(
        input.forward_noi,
        MAX_AMOUNT,
        &format!("{label}: forward NOI"),
        warnings,
    );
    let units = bounded_opt(input.units, MAX_AMOUNT, &format!("{label}: unit count"), warnings);
    let a = &ExitAssumptions {
        exit_month: input.assumptions.exit_month,
        exit_cap_rate_percent: bounded_opt(
            input.assumptions.exit_cap_rate_percent,
            MAX_FACTOR,
            &format!("{label}: exit cap rate"),
            warnings,
        ),
        selling_costs_percent: bounded_or_zero(
            input.assumptions.selling_costs_percent,
            MAX_FACTOR,
            &format!("{label}: selling costs"),
            warnings,
        ),
    };

    if input.forward_noi.is_none() {
        warnings.push(format!("{label}: forward NOI not available; exit value is N/A"));
    }
    match a.exit_cap_rate_percent {
        Some(c) if c > Decimal::ZERO => {
            if c > dec!(12) {
                warnings.push(format!(
                    "{label}: exit cap rate {c}% exceeds 12%; unusually high"
                ));
            }
        }
        _ => warnings.push(format!(
            "{label}: exit cap rate must be positive; exit value is N/A"
        )),
    }

    let valuation = value_at_exit(forward_noi, a.exit_cap_rate_percent, a.selling_costs_percent);
    if let Some((implied, _, _)) = valuation {
        if implied < Decimal::ZERO {
            warnings.push(format!("{label}: negative forward NOI produces a negative exit value"));
        }
    }

    let value_per_unit = match (valuation, units) {
        (Some((implied, _, _)), Some(units)) if units > Decimal::ZERO => checked_ratio(implied, units),
        _ => None,
    };

    StreamExitValuation {
        stream: input.stream,
        exit_month: a.exit_month,
        forward_noi,
        exit_cap_rate_percent: a.exit_cap_rate_percent,
        implied_valuation: valuation.map(|v| v.0),
        selling_costs: valuation.map(|v| v.1),
        net_reversion_proceeds: valuation.map(|v| v.2),
        value_per_unit,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn stream(kind: IncomeStream, noi: Decimal, cap: Decimal, selling: Decimal) -> StreamExitInput {
        StreamExitInput {
            stream: kind,
            forward_noi: Some(noi),
            assumptions: ExitAssumptions {
                exit_month: 120,
                exit_cap_rate_percent: Some(cap),
                selling_costs_percent: selling,
            },
            units: None,
        }
    }

    #[test]
    fn test_single_stream_valuation() {
        let input = ExitValuationInput {
            streams: vec![stream(IncomeStream::Residential, dec!(600_000), dec!(6), dec!(2))],
        };
        let out = value_exit(&input).result;
        let s = &out.streams[0];
        assert_eq!(s.implied_valuation, Some(dec!(10_000_000)));
        assert_eq!(s.selling_costs, Some(dec!(200_000)));
        assert_eq!(s.net_reversion_proceeds, Some(dec!(9_800_000)));
        assert_eq!(out.blended_cap_rate_percent, Some(dec!(6)));
    }

    #[test]
    fn test_two_streams_blend() {
        let input = ExitValuationInput {
            streams: vec![
                stream(IncomeStream::Residential, dec!(600_000), dec!(5), dec!(2)),
                stream(IncomeStream::Commercial, dec!(200_000), dec!(7), dec!(3)),
            ],
        };
        let out = value_exit(&input).result;
        // (5 * 600k + 7 * 200k) / 800k = 5.5
        assert_eq!(out.blended_cap_rate_percent, Some(dec!(5.5)));
        assert_eq!(out.combined_forward_noi, dec!(800_000));
        let residential = dec!(12_000_000);
        let commercial = dec!(200_000) / dec!(7) * dec!(100);
        assert_eq!(out.combined_implied_valuation, Some(residential + commercial));
    }

    #[test]
    fn test_zero_cap_rate_is_na() {
        let input = ExitValuationInput {
            streams: vec![stream(IncomeStream::Commercial, dec!(200_000), Decimal::ZERO, dec!(3))],
        };
        let result = value_exit(&input);
        assert!(result.result.streams[0].implied_valuation.is_none());
        assert!(result.result.combined_implied_valuation.is_none());
        assert!(result.result.blended_cap_rate_percent.is_none());
        assert!(result.warnings.iter().any(|w| w.contains("N/A")));
    }

    #[test]
    fn test_blended_guards_zero_noi() {
        assert_eq!(
            blended_cap_rate(&[(dec!(5), dec!(100)), (dec!(7), dec!(-100))]),
            None
        );
        assert_eq!(blended_cap_rate(&[]), None);
    }

    #[test]
    fn test_value_per_unit() {
        let mut s = stream(IncomeStream::Residential, dec!(600_000), dec!(6), dec!(2));
        s.units = Some(dec!(50));
        let out = value_exit(&ExitValuationInput { streams: vec![s] }).result;
        assert_eq!(out.streams[0].value_per_unit, Some(dec!(200_000)));
    }

    #[test]
    fn test_unrepresentable_noi_is_na() {
        let input = ExitValuationInput {
            streams: vec![StreamExitInput {
                stream: IncomeStream::Commercial,
                forward_noi: Some(dec!(9999999999999999999999999999)),
                assumptions: ExitAssumptions {
                    exit_month: 60,
                    exit_cap_rate_percent: Some(dec!(0.0000001)),
                    selling_costs_percent: dec!(2),
                },
                units: None,
            }],
        };
        let result = value_exit(&input);
        let stream = &result.result.streams[0];
        assert!(stream.forward_noi.is_none());
        assert!(stream.implied_valuation.is_none());
        assert!(result.result.combined_implied_valuation.is_none());
    }
}
