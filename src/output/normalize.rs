use serde_json::{Map, Number, Value};

use crate::api::types::{Cell, Table};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One normalized row: column name to JSON scalar, in column order
pub type Record = Map<String, Value>;

/// Convert a tabular result into JSON records.
///
/// - `None` or a table without rows gives an empty vector.
/// - Missing cells (null, NaN, or absent at the end of a short row) become `""`.
/// - Date and date-time cells are rendered as `YYYY-MM-DD`.
/// - Column and row order are kept as-is.
pub fn normalize(table: Option<&Table>) -> Vec<Record> {
    let Some(table) = table else {
        return Vec::new();
    };

    table
        .rows()
        .iter()
        .map(|row| {
            table
                .columns()
                .iter()
                .enumerate()
                .map(|(i, column)| (column.clone(), cell_to_json(row.get(i))))
                .collect()
        })
        .collect()
}

fn cell_to_json(cell: Option<&Cell>) -> Value {
    let Some(cell) = cell else {
        return empty();
    };
    if cell.is_missing() {
        return empty();
    }

    match cell {
        Cell::Text(s) => Value::String(s.clone()),
        Cell::Int(n) => Value::Number((*n).into()),
        Cell::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or_else(empty),
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        Cell::DateTime(dt) => Value::String(dt.format(DATE_FORMAT).to_string()),
        Cell::Null => empty(),
    }
}

fn empty() -> Value {
    Value::String(String::new())
}
