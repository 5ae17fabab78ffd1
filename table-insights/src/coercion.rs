//! Numeric coercion heuristic.
//!
//! Data pulled from Tableau (CSV) or sent by the extension (formatted
//! values) arrives as text. Columns that are "mostly numeric" are upgraded
//! to numbers so the model sees correct types and aggregation works.
//!
//! Per non-numeric column:
//! 1. strip every `,` (thousands separator, textual only)
//! 2. parse each value; failures become `null`
//! 3. `fraction = successes / row_count` (nulls count in the denominator)
//! 4. replace the column only when `fraction > NUMERIC_COERCION_THRESHOLD`
//! 5. if any replaced value is fractional, every number in it becomes a float
//!
//! A column that cannot be processed is left untouched and the next column
//! is tried; the entry point never fails.

use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, trace};

use crate::table::{ColumnKind, Table};

/// Share of parseable values a text column needs (strictly more than this)
/// before it is treated as numeric.
pub const NUMERIC_COERCION_THRESHOLD: f64 = 0.6;

#[derive(Debug, Error)]
enum CoercionError {
    #[error("column `{column}` holds a nested {kind} value")]
    UnsupportedCell { column: String, kind: &'static str },
}

/// Upgrades mostly-numeric text columns in place.
///
/// Returns the names of the columns that were coerced.
pub fn coerce_numeric_columns(table: &mut Table) -> Vec<String> {
    let mut coerced = Vec::new();
    let columns = table.columns().to_vec();

    for column in columns {
        if table.column_kind(&column) == ColumnKind::Numeric {
            continue;
        }

        match parse_column(table, &column) {
            Ok(Some(values)) => {
                table.replace_column(&column, values);
                coerced.push(column);
            }
            Ok(None) => trace!(column = %column, "column stays text"),
            Err(err) => debug!(error = %err, "column left unchanged"),
        }
    }

    if !coerced.is_empty() {
        debug!(columns = ?coerced, "coerced text columns to numeric");
    }
    coerced
}

/// Parses every value of `column`; `Some(values)` when the column qualifies.
fn parse_column(table: &Table, column: &str) -> Result<Option<Vec<Value>>, CoercionError> {
    let total = table.len();
    if total == 0 {
        return Ok(None);
    }

    let mut values = Vec::with_capacity(total);
    let mut successes = 0usize;

    for row in table.rows() {
        let parsed = match row.get(column) {
            None | Some(Value::Null) | Some(Value::Bool(_)) => None,
            Some(Value::Number(n)) => Some(Value::Number(n.clone())),
            Some(Value::String(s)) => parse_number(s),
            Some(Value::Array(_)) => {
                return Err(CoercionError::UnsupportedCell {
                    column: column.to_string(),
                    kind: "array",
                });
            }
            Some(Value::Object(_)) => {
                return Err(CoercionError::UnsupportedCell {
                    column: column.to_string(),
                    kind: "object",
                });
            }
        };

        if parsed.is_some() {
            successes += 1;
        }
        values.push(parsed.unwrap_or(Value::Null));
    }

    let fraction = successes as f64 / total as f64;
    if fraction <= NUMERIC_COERCION_THRESHOLD {
        return Ok(None);
    }

    widen_to_floats(&mut values);
    Ok(Some(values))
}

/// A column holding any fractional value is emitted as floats throughout.
fn widen_to_floats(values: &mut [Value]) {
    let any_float = values
        .iter()
        .any(|v| matches!(v, Value::Number(n) if n.is_f64()));
    if !any_float {
        return;
    }

    for value in values.iter_mut() {
        if let Value::Number(n) = value {
            if !n.is_f64() {
                if let Some(f) = n.as_f64().and_then(Number::from_f64) {
                    *n = f;
                }
            }
        }
    }
}

/// Parses a textual number after removing thousands separators.
///
/// Integral text becomes a JSON integer, anything else a float. Blank text
/// and non-finite values (`NaN`, `inf`) are failures.
pub fn parse_number(raw: &str) -> Option<Value> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(i) = cleaned.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }

    let f = cleaned.parse::<f64>().ok().filter(|f| f.is_finite())?;
    Number::from_f64(f).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;
    use serde_json::json;

    fn table_with(column: &str, values: Vec<Value>) -> Table {
        let rows = values
            .into_iter()
            .map(|v| {
                let mut r = Row::new();
                r.insert(column.to_string(), v);
                r
            })
            .collect();
        Table::from_rows(rows)
    }

    fn strings(parseable: usize, junk: usize) -> Vec<Value> {
        let mut v: Vec<Value> = (0..parseable).map(|i| json!(format!("{}", i + 1))).collect();
        v.extend((0..junk).map(|_| json!("n/a")));
        v
    }

    #[test]
    fn exactly_sixty_percent_is_not_coerced() {
        let mut t = table_with("v", strings(6, 4));
        let before = t.clone();
        assert!(coerce_numeric_columns(&mut t).is_empty());
        assert_eq!(t, before);
    }

    #[test]
    fn seven_of_eleven_is_coerced() {
        let mut t = table_with("v", strings(7, 4));
        assert_eq!(coerce_numeric_columns(&mut t), vec!["v".to_string()]);
        assert_eq!(t.column_kind("v"), ColumnKind::Numeric);
        assert_eq!(t.rows()[0]["v"], json!(1));
        assert_eq!(t.rows()[10]["v"], Value::Null);
    }

    #[test]
    fn commas_are_thousands_separators() {
        let mut t = table_with("v", vec![json!("1,234"), json!("1234"), json!("7")]);
        coerce_numeric_columns(&mut t);
        assert_eq!(t.rows()[0]["v"], t.rows()[1]["v"]);
        assert_eq!(t.rows()[0]["v"], json!(1234));
    }

    #[test]
    fn fractional_value_makes_whole_column_float() {
        let mut t = table_with(
            "v",
            vec![json!("1,234.0"), json!("1234"), json!(12), json!("0.5")],
        );
        coerce_numeric_columns(&mut t);

        for row in t.rows() {
            assert!(row["v"].is_f64(), "{:?} should be a float", row["v"]);
        }
        assert_eq!(t.rows()[0]["v"], t.rows()[1]["v"]);
        assert_eq!(t.rows()[1]["v"], json!(1234.0));
        assert_eq!(t.rows()[2]["v"], json!(12.0));
    }

    #[test]
    fn nulls_count_in_denominator() {
        // 3 parseable of 5 rows = 0.6 -> stays text
        let mut t = table_with(
            "v",
            vec![json!("1"), json!("2"), json!("3"), Value::Null, Value::Null],
        );
        assert!(coerce_numeric_columns(&mut t).is_empty());
        assert_eq!(t.rows()[0]["v"], json!("1"));
    }

    #[test]
    fn coercion_is_idempotent() {
        let mut t = Table::from_rows(vec![
            json!({"a": "1,000", "b": "x", "c": 3}).as_object().cloned().unwrap(),
            json!({"a": "2", "b": "y", "c": 4}).as_object().cloned().unwrap(),
            json!({"a": "3", "b": "5", "c": null}).as_object().cloned().unwrap(),
        ]);
        coerce_numeric_columns(&mut t);
        let once = t.clone();
        coerce_numeric_columns(&mut t);
        assert_eq!(t, once);
        assert_eq!(once.rows()[0]["a"], json!(1000));
        assert_eq!(once.rows()[2]["b"], json!("5"));
    }

    #[test]
    fn empty_table_is_left_alone() {
        let mut t = Table::new(vec!["v".into()], Vec::new());
        assert!(coerce_numeric_columns(&mut t).is_empty());
        assert!(t.is_empty());
    }

    #[test]
    fn all_null_column_stays_text() {
        let mut t = table_with("v", vec![Value::Null, Value::Null]);
        assert!(coerce_numeric_columns(&mut t).is_empty());
        assert_eq!(t.column_kind("v"), ColumnKind::Text);
    }

    #[test]
    fn unsupported_column_does_not_stop_others() {
        let mut t = Table::from_rows(vec![
            json!({"bad": [1], "good": "10"}).as_object().cloned().unwrap(),
            json!({"bad": "2", "good": "20"}).as_object().cloned().unwrap(),
        ]);
        assert_eq!(coerce_numeric_columns(&mut t), vec!["good".to_string()]);
        assert_eq!(t.rows()[0]["bad"], json!([1]));
        assert_eq!(t.rows()[1]["good"], json!(20));
    }

    #[test]
    fn non_finite_text_is_not_a_number() {
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("  "), None);
        assert_eq!(parse_number(" -4,500.25 "), Some(json!(-4500.25)));
    }
}
