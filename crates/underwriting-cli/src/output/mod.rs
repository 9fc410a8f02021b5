pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use clap::ValueEnum;
use serde_json::Value;

/// How a command's result envelope is written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// The whole envelope, pretty-printed
    Json,
    /// Fields as a two-column table, row collections as their own tables
    Table,
    /// `field,value` rows with nested paths flattened
    Csv,
    /// The headline figure only
    Minimal,
}

impl OutputFormat {
    pub fn print(self, envelope: &Value) {
        tracing::debug!(format = ?self, "writing result");
        match self {
            OutputFormat::Json => json::print_json(envelope),
            OutputFormat::Table => table::print_table(envelope),
            OutputFormat::Csv => csv_out::print_csv(envelope),
            OutputFormat::Minimal => minimal::print_minimal(envelope),
        }
    }
}

/// The `result` of a computation envelope; bare values pass through.
pub(crate) fn result_body(envelope: &Value) -> &Value {
    envelope
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_names_are_case_insensitive() {
        assert_eq!(OutputFormat::from_str("csv", true), Ok(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_str("Minimal", true), Ok(OutputFormat::Minimal));
        assert!(OutputFormat::from_str("xml", true).is_err());
    }

    #[test]
    fn test_result_body_unwraps_envelope() {
        let envelope = json!({
            "result": { "max_loan": "3575000" },
            "warnings": [],
            "methodology": "Acquisition Loan Sizing (minimum of enabled methods)",
        });
        assert_eq!(result_body(&envelope), &json!({ "max_loan": "3575000" }));

        let bare = json!({ "Total Units": "24" });
        assert_eq!(result_body(&bare), &bare);
    }
}
