use serde_json::Value;
use std::io;

/// Write the result as `field,value` CSV. Nested values are flattened to
/// dotted paths, e.g. `methods.0.candidate_loan_amount`.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = super::result_body(value);

    let mut rows: Vec<(String, String)> = Vec::new();
    flatten("", body, &mut rows);

    let _ = wtr.write_record(["field", "value"]);
    for (field, val) in &rows {
        let _ = wtr.write_record([field.as_str(), val.as_str()]);
    }
    let _ = wtr.flush();
}

fn flatten(prefix: &str, value: &Value, rows: &mut Vec<(String, String)>) {
    let path = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        }
    };

    match value {
        Value::Object(map) => {
            for (key, val) in map {
                flatten(&path(key), val, rows);
            }
        }
        Value::Array(arr) => {
            for (i, val) in arr.iter().enumerate() {
                flatten(&path(&i.to_string()), val, rows);
            }
        }
        Value::String(s) => rows.push((prefix.to_string(), s.clone())),
        Value::Number(n) => rows.push((prefix.to_string(), n.to_string())),
        Value::Bool(b) => rows.push((prefix.to_string(), b.to_string())),
        Value::Null => rows.push((prefix.to_string(), "N/A".to_string())),
    }
}
