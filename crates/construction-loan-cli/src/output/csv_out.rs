use serde_json::{Map, Value};
use std::io;

/// Write output as CSV to stdout.
///
/// A list result (the draw schedule) becomes one row per record. An object
/// result becomes `field,value` rows with nested objects flattened to dotted
/// keys; lists of records inside it are left to `--output table` or
/// `cloan draws`.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match body {
        Value::Object(map) => {
            let _ = wtr.write_record(["field", "value"]);
            let mut rows = Vec::new();
            flatten("", map, &mut rows);
            for (key, val) in rows {
                let _ = wtr.write_record([key.as_str(), val.as_str()]);
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(body)]);
        }
    }

    let _ = wtr.flush();
}

fn flatten(prefix: &str, map: &Map<String, Value>, rows: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, rows),
            Value::Array(items) if items.iter().any(Value::is_object) => {
                rows.push((format!("{name}.count"), items.len().to_string()));
            }
            _ => rows.push((name, format_csv_value(val))),
        }
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(format_csv_value)
            .collect::<Vec<_>>()
            .join(";"),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
