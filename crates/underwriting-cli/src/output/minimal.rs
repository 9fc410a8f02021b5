use serde_json::Value;

/// Print only the headline figure: the bound loan, the reserve, the exit
/// value, etc. Falls back to the first field of the result.
pub fn print_minimal(value: &Value) {
    let result_obj = super::result_body(value);
    // Full model output: read the named variables
    let result_obj = result_obj.get("variables").unwrap_or(result_obj);

    // Headline figure of each command, then the model's bound loan
    let priority_keys = [
        "max_loan",
        "loan_constant",
        "gpi_after_vacancy",
        "total_pro_forma_rent",
        "total_annual",
        "weighted_annual_reserve",
        "combined_implied_valuation",
        "AQ: Max Acquisition Loan at Closing",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "N/A".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
