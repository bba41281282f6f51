//! Result rendering: an aligned text table or one JSON object per line.

use std::fmt::Write;

use crate::record::{FieldValue, Record};
use crate::schema::Schema;

pub const EMPTY_MESSAGE: &str = "No records match the current filters";

const COLUMN_GAP: &str = "  ";

/// `matched` out of `total`, then a header row and one row per record.
pub fn render_table(matched: &[&Record], total: usize, schema: &Schema, date_format: &str) -> String {
    let mut out = format!("{} of {} records\n", matched.len(), total);

    if matched.is_empty() {
        out.push_str(EMPTY_MESSAGE);
        out.push('\n');
        return out;
    }

    let headers: Vec<&str> = schema.fields().iter().map(|f| f.label()).collect();
    let rows: Vec<Vec<String>> = matched
        .iter()
        .map(|record| {
            schema
                .fields()
                .iter()
                .map(|f| format_cell(record.get(&f.name), date_format))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|row| row[i].chars().count())
                .chain([h.chars().count()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    push_line(&mut out, headers.iter().copied(), &widths);
    for row in &rows {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

pub fn render_json_lines(matched: &[&Record]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for record in matched {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    out.push_str(line.trim_end());
    out.push('\n');
}

fn format_cell(value: &FieldValue, date_format: &str) -> String {
    match value {
        FieldValue::Date(ts) => {
            let mut cell = String::new();
            if write!(cell, "{}", ts.format(date_format)).is_err() {
                cell = ts.date().to_string();
            }
            cell
        }
        FieldValue::Number(n) if n.is_nan() => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::decode_document;
    use crate::schema::{FieldDef, FieldKind};
    use serde_yaml::from_str;

    fn records() -> Vec<Record> {
        decode_document(
            &from_str(
                r#"
- { id: u1, name: Ada, employees: 50, created: "2024-06-03T09:15:00" }
- { id: u2, name: Grace Hopper, employees: 120, created: "2024-12-25" }
"#,
            )
            .unwrap(),
            &Schema::users(),
        )
        .unwrap()
    }

    fn small_schema() -> Schema {
        Schema::new(vec![
            FieldDef::new("name", "Name", FieldKind::String),
            FieldDef::new("employees", "Employees", FieldKind::Number),
            FieldDef::new("created", "Created", FieldKind::Date),
        ])
    }

    #[test]
    fn test_table_layout() {
        let data = records();
        let refs: Vec<&Record> = data.iter().collect();
        let table = render_table(&refs, 5, &small_schema(), "%b %-d, %Y");

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "2 of 5 records");
        assert_eq!(lines[1], "Name          Employees  Created");
        assert_eq!(lines[2], "Ada           50         Jun 3, 2024");
        assert_eq!(lines[3], "Grace Hopper  120        Dec 25, 2024");
    }

    #[test]
    fn test_empty_result() {
        let table = render_table(&[], 2, &small_schema(), "%Y");
        assert_eq!(table, format!("0 of 2 records\n{EMPTY_MESSAGE}\n"));
    }

    #[test]
    fn test_json_lines() {
        let data = records();
        let refs: Vec<&Record> = data.iter().take(1).collect();
        let out = render_json_lines(&refs).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(parsed["id"], "u1");
        assert_eq!(parsed["created"], "2024-06-03T09:15:00");
    }
}
