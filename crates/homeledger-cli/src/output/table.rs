use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{cell, headers, row_cells, rows};

/// Format output as tables using the tabled crate.
///
/// Scalars of the result go into a Field/Value table. Nested sections
/// (a schedule summary, the payment ledger, the comparison rows) each get
/// a titled table of their own.
pub fn print_table(value: &Value) {
    if let Some(data) = rows(value) {
        print_rows(data);
    } else {
        match value {
            Value::Object(map) => match map.get("result") {
                Some(Value::Object(result)) => print_sections(result),
                _ => print_fields(map),
            },
            _ => println!("{}", cell(value)),
        }
    }

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

fn print_sections(result: &Map<String, Value>) {
    let scalars: Map<String, Value> = result
        .iter()
        .filter(|(_, v)| !is_section(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if !scalars.is_empty() {
        print_fields(&scalars);
    }

    for (key, val) in result.iter().filter(|(_, v)| is_section(v)) {
        println!("\n{}:", key);
        match val {
            Value::Array(data) => print_rows(data),
            Value::Object(map) => print_sections(map),
            _ => {}
        }
    }
}

fn is_section(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(arr) => matches!(arr.first(), Some(Value::Object(_))),
        _ => false,
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.clone(), cell(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(data: &[Value]) {
    let Some(hs) = headers(data) else {
        if data.is_empty() {
            println!("(empty)");
        }
        for item in data {
            println!("{}", cell(item));
        }
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(hs.clone());
    for row in data {
        builder.push_record(row_cells(row, &hs));
    }
    println!("{}", Table::from(builder));
}
