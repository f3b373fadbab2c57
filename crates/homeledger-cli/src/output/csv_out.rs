use serde_json::{Map, Value};
use std::io;

use super::{cell, headers, row_cells, rows};

/// Write output as CSV to stdout.
///
/// Row-shaped results (a ledger, a monthly or yearly projection) become one
/// record per row. Object results flatten into `field,value` pairs, with
/// nested keys joined by a dot.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(data) = rows(value) {
        write_rows(&mut wtr, data);
    } else if let Some(Value::Object(result)) = value.get("result") {
        let _ = wtr.write_record(["field", "value"]);
        for (field, val) in flatten("", result) {
            let _ = wtr.write_record([field, val]);
        }
    } else {
        let _ = wtr.write_record([cell(value)]);
    }

    let _ = wtr.flush();
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, data: &[Value]) {
    match headers(data) {
        Some(hs) => {
            let _ = wtr.write_record(&hs);
            for row in data {
                let _ = wtr.write_record(row_cells(row, &hs));
            }
        }
        None => {
            for item in data {
                let _ = wtr.write_record([cell(item)]);
            }
        }
    }
}

/// Flatten nested objects into dotted field names. Arrays stay as JSON text.
fn flatten(prefix: &str, map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (key, val) in map {
        let field = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => out.extend(flatten(&field, inner)),
            _ => out.push((field, cell(val))),
        }
    }
    out
}
