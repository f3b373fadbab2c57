use serde_json::Value;

/// Fields that answer each command, in order of preference.
const PRIORITY_KEYS: [&str; 8] = [
    "payment",
    "penalty",
    "trigger_rate",
    "final_net_worth",
    "balance",
    "within_limit",
    "best_final_net_worth",
    "total_interest",
];

/// Print just the key answer value from the output.
///
/// Looks for a well-known field in the result, then in its `summary` and
/// `comparison` sections, then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result = value.get("result").unwrap_or(value);
    match answer(result) {
        Some(line) => println!("{}", line),
        None => println!("{}", format_minimal(result)),
    }
}

fn answer(result: &Value) -> Option<String> {
    let map = result.as_object()?;
    let sections = [Some(result), map.get("summary"), map.get("comparison")];
    for section in sections.into_iter().flatten() {
        for key in PRIORITY_KEYS {
            if let Some(val) = section.get(key).filter(|v| !v.is_null()) {
                return Some(format_minimal(val));
            }
        }
    }
    map.iter()
        .next()
        .map(|(key, val)| format!("{}: {}", key, format_minimal(val)))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
