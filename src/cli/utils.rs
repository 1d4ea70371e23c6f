use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "message": message });
            if let (Some(Value::Object(extra)), Some(map)) = (data, response.as_object_mut()) {
                map.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print presented records as a table of the given columns
pub fn output_table(rows: &[Value], columns: &[&str]) {
    let widths: Vec<usize> = columns
        .iter()
        .map(|col| {
            rows.iter()
                .map(|row| cell(row, col).len())
                .chain(std::iter::once(col.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(col, w)| format!("{:<w$}", col.to_uppercase(), w = w))
        .collect();
    println!("{}", header.join("  "));

    for row in rows {
        let line: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<w$}", cell(row, col), w = w))
            .collect();
        println!("{}", line.join("  "));
    }
}

fn cell(row: &Value, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_render_strings_bare() {
        let row = json!({ "email": "a@b.co", "isEmailVerified": false });
        assert_eq!(cell(&row, "email"), "a@b.co");
        assert_eq!(cell(&row, "isEmailVerified"), "false");
        assert_eq!(cell(&row, "teamCode"), "-");
    }
}
