pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The part of a command's output worth showing: the envelope's `result`,
/// with an available assessment unwrapped to its data.
pub(crate) fn payload(value: &Value) -> &Value {
    unwrap_assessment(value.get("result").unwrap_or(value))
}

fn unwrap_assessment(value: &Value) -> &Value {
    match value.get("status").and_then(Value::as_str) {
        Some("available") => value.get("data").unwrap_or(value),
        _ => value,
    }
}

/// Scalar fields of a nested object keyed by dotted path, plus the arrays of
/// objects found on the way, which read better as their own tables.
#[derive(Default)]
pub(crate) struct Flattened<'a> {
    pub fields: Vec<(String, &'a Value)>,
    pub tables: Vec<(String, &'a [Value])>,
}

pub(crate) fn flatten(value: &Value) -> Flattened<'_> {
    let mut out = Flattened::default();
    flatten_into(String::new(), value, &mut out);
    out
}

fn flatten_into<'a>(prefix: String, value: &'a Value, out: &mut Flattened<'a>) {
    let value = unwrap_assessment(value);
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_into(path, child, out);
            }
        }
        Value::Array(items) if items.first().is_some_and(Value::is_object) => {
            out.tables.push((prefix, items.as_slice()));
        }
        _ => out.fields.push((prefix, value)),
    }
}

/// Follow a dotted path through nested objects.
pub(crate) fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |node, key| unwrap_assessment(node).get(key))
        .map(unwrap_assessment)
}

pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(format_scalar)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_unwraps_envelope_and_assessment() {
        let value = json!({
            "municipality": "59350",
            "result": { "status": "available", "data": { "score": 60 } }
        });
        assert_eq!(payload(&value), &json!({ "score": 60 }));

        let missing = json!({ "result": { "status": "insufficient_data" } });
        assert_eq!(payload(&missing), &json!({ "status": "insufficient_data" }));
    }

    #[test]
    fn test_flatten_collects_nested_tables() {
        let value = json!({
            "monthly_payment": "1167.17",
            "ratios": { "gross_yield": "0.039" },
            "trend": { "status": "available", "data": { "direction": "strong_decline" } },
            "projection": [{ "year": 1 }, { "year": 2 }],
            "warnings": ["a", "b"]
        });
        let flat = flatten(&value);
        let keys: Vec<&str> = flat.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["monthly_payment", "ratios.gross_yield", "trend.direction", "warnings"]
        );
        assert_eq!(flat.tables.len(), 1);
        assert_eq!(flat.tables[0].0, "projection");
        assert_eq!(flat.tables[0].1.len(), 2);
    }

    #[test]
    fn test_lookup_dotted_paths() {
        let value = json!({ "tax": { "total_tax": "1200" }, "comparison": {
            "status": "available", "data": { "positioning": "below_market" } } });
        assert_eq!(lookup(&value, "tax.total_tax"), Some(&json!("1200")));
        assert_eq!(lookup(&value, "comparison.positioning"), Some(&json!("below_market")));
        assert_eq!(lookup(&value, "tax.missing"), None);
    }
}
