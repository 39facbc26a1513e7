use serde_json::Value;
use std::io;

use super::{flatten, format_scalar, payload};

/// Write output as CSV to stdout. Row-shaped results (schedules, projections,
/// rankings) are written as records; anything else as field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    write_csv(&mut wtr, payload(value));
    let _ = wtr.flush();
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) {
    match value {
        Value::Array(arr) => write_array_csv(wtr, arr),
        Value::Object(_) => {
            let flat = flatten(value);
            if let Some((_, rows)) = flat.tables.first() {
                write_array_csv(wtr, rows);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in &flat.fields {
                    let _ = wtr.write_record([key.as_str(), &format_scalar(val)]);
                }
            }
        }
        other => {
            let _ = wtr.write_record([&format_scalar(other)]);
        }
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        for item in arr {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
        return;
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);
    for item in arr {
        if let Value::Object(map) = item {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(format_scalar).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_csv(&mut wtr, payload(value));
        String::from_utf8(wtr.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_schedule_is_written_as_records() {
        let value = json!({
            "result": {
                "monthly_payment": "100",
                "months": [],
                "years": [
                    { "year": 1, "closing_balance": "900" },
                    { "year": 2, "closing_balance": "0" }
                ]
            }
        });
        assert_eq!(render(&value), "closing_balance,year\n900,1\n0,2\n");
    }

    #[test]
    fn test_scalar_result_is_field_value() {
        let value = json!({ "tax": "685.30", "parts": "1" });
        assert_eq!(render(&value), "field,value\nparts,1\ntax,685.30\n");
    }
}
