use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{flatten, format_scalar, payload};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some(name) = value.get("name").and_then(Value::as_str) {
        match value.get("municipality").and_then(Value::as_str) {
            Some(code) if code != name => println!("{} ({})\n", name, code),
            _ => println!("{}\n", name),
        }
    }

    let result = payload(value);
    match result {
        Value::Array(arr) => print_array_table(arr),
        Value::Object(_) => print_object(result),
        other => println!("{}", format_scalar(other)),
    }

    // Warnings and methodology from a computation envelope
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_object(value: &Value) {
    let flat = flatten(value);
    if !flat.fields.is_empty() {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in &flat.fields {
            builder.push_record([key.as_str(), &format_scalar(val)]);
        }
        println!("{}", Table::from(builder));
    }

    for (title, rows) in flat.tables {
        println!("\n{}:", title);
        print_array_table(rows);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_scalar).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_scalar(item));
        }
    }
}
