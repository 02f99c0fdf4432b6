pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print JSON to stdout; the `result` of a fee computation is the
/// project metadata blob as stored.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

pub(crate) const FEE_ROW_HEADERS: [&str; 8] = [
    "section",
    "fee",
    "percentage",
    "amount",
    "contractPercentage",
    "contractAmount",
    "companyPercentage",
    "companyAmount",
];

const FEE_SECTIONS: [&str; 4] = ["services", "tiers", "products", "fees"];

fn fee_row(section: &str, name: &str, item: &Value) -> Vec<String> {
    let mut row = vec![section.to_string(), name.to_string()];
    for field in &FEE_ROW_HEADERS[2..] {
        row.push(match item.get(*field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        });
    }
    row
}

/// Flatten the schedule of a fee computation into one row per fee.
pub(crate) fn fee_rows(result: &Map<String, Value>) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let Some(schedule) = result.get("schedule") else {
        return rows;
    };

    if let Some(table) = schedule.get("table") {
        for section in FEE_SECTIONS {
            if let Some(Value::Object(items)) = table.get(section) {
                for (key, item) in items {
                    rows.push(fee_row(section, key, item));
                }
            }
        }
    }

    if let Some(Value::Array(custom)) = schedule.get("customFees") {
        for fee in custom {
            let label = fee.get("label").and_then(Value::as_str).unwrap_or_default();
            let fees_type = fee.get("feesType").and_then(Value::as_str).unwrap_or_default();
            rows.push(fee_row("custom", &format!("{label} ({fees_type})"), fee));
        }
    }

    rows
}
