use serde_json::Value;

use super::{format_scalar, lookup, payload};

/// Headline figure of each command, first match wins.
const PRIORITY_PATHS: [&str; 14] = [
    "tier",
    "score",
    "best",
    "monthly_cashflow",
    "monthly_payment",
    "tax.total_tax",
    "tax",
    "direction",
    "band",
    "positioning",
    "median_price_per_area",
    "mean_price_per_area",
    "applied_regime",
    "status",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(payload(value)));
}

fn headline(result: &Value) -> String {
    match result {
        Value::Object(map) => PRIORITY_PATHS
            .iter()
            .filter_map(|path| lookup(result, path))
            .find(|v| !v.is_null() && !v.is_object())
            .map(format_scalar)
            .or_else(|| {
                map.iter()
                    .next()
                    .map(|(key, val)| format!("{}: {}", key, format_scalar(val)))
            })
            .unwrap_or_default(),
        Value::Array(items) => format!("{} rows", items.len()),
        other => format_scalar(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tax_bill_prefers_total_tax() {
        let regime = json!({ "regime": "bare_rental_real", "tax": { "total_tax": "1200" } });
        assert_eq!(headline(&regime), "1200");

        let income = json!({ "tax": "685.30", "parts": "1" });
        assert_eq!(headline(&income), "685.30");
    }

    #[test]
    fn test_recommendation_headline_is_tier() {
        let value = json!({
            "result": { "status": "available", "data": { "score": 70, "tier": "recommended" } }
        });
        assert_eq!(headline(payload(&value)), "recommended");
    }

    #[test]
    fn test_fallback_to_first_field() {
        assert_eq!(headline(&json!({ "alpha": 1 })), "alpha: 1");
        assert_eq!(headline(&json!([1, 2, 3])), "3 rows");
    }
}
