//! Schema-driven type coercion.
//!
//! Each declared column present in the dataset is converted to its target
//! semantic type. Coercion never fails: a cell that cannot be parsed under
//! its declared type becomes null, and one bad cell never affects any other
//! cell or column. Re-casting already-cast data is a no-op.

use crate::catalog::{ColumnType, TableSpec};
use crate::dataset::Dataset;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Datetime input shapes accepted before degrading to null. Covers fetcher
/// output, RFC 3339-ish source text, and this module's own output so a
/// second cast pass parses what the first one emitted.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Cast every declared column of `dataset` in place.
///
/// Declared columns missing from the dataset are skipped; dataset columns
/// missing from the schema are left as fetched.
pub fn cast(dataset: &mut Dataset, spec: &TableSpec) {
    for schema in &spec.columns {
        let Some(idx) = dataset.column_index(&schema.name) else {
            continue;
        };
        for row in &mut dataset.rows {
            let cell = std::mem::replace(&mut row[idx], Value::Null);
            row[idx] = cast_cell(cell, schema.column_type);
        }
    }
}

fn cast_cell(value: Value, column_type: ColumnType) -> Value {
    match column_type {
        // bigint and int share one coercion rule; no range or overflow
        // distinction is made between the two tags.
        ColumnType::Bigint | ColumnType::Int => cast_integer(value),
        ColumnType::Double => cast_double(value),
        ColumnType::Date => cast_temporal(value, DATE_FORMAT),
        ColumnType::Timestamp => cast_temporal(value, TIMESTAMP_FORMAT),
        ColumnType::String => cast_string(value),
    }
}

fn cast_integer(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Value::Number(n),
        Value::Number(n) => n.as_f64().and_then(float_to_integer).unwrap_or(Value::Null),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                Value::from(i)
            } else {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(float_to_integer)
                    .unwrap_or(Value::Null)
            }
        }
        _ => Value::Null,
    }
}

fn float_to_integer(f: f64) -> Option<Value> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(Value::from(f as i64))
    } else {
        None
    }
}

fn cast_double(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(n),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn cast_temporal(value: Value, format: &str) -> Value {
    match value {
        Value::String(s) => parse_datetime(&s)
            .map(|dt| Value::String(dt.format(format).to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Force a cell to its textual representation. Genuine nulls stay null.
fn cast_string(value: Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(s),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        other => Value::String(other.to_string()),
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ColumnSchema;
    use serde_json::json;

    fn spec(columns: Vec<(&str, ColumnType)>) -> TableSpec {
        TableSpec {
            table: "t".to_string(),
            destination_prefix: "t/".to_string(),
            columns: columns
                .into_iter()
                .map(|(name, ty)| ColumnSchema::new(name, ty))
                .collect(),
        }
    }

    fn single_column(column_type: ColumnType, cells: Vec<Value>) -> Dataset {
        let mut dataset = Dataset::new(vec!["v".to_string()]);
        for cell in cells {
            dataset.push_row(vec![cell]);
        }
        let spec = spec(vec![("v", column_type)]);
        cast(&mut dataset, &spec);
        dataset
    }

    #[test]
    fn test_integer_from_string() {
        let d = single_column(
            ColumnType::Bigint,
            vec![json!("123"), json!(" 7 "), json!("12.0"), json!("abc")],
        );
        assert_eq!(d.rows[0][0], json!(123));
        assert_eq!(d.rows[1][0], json!(7));
        assert_eq!(d.rows[2][0], json!(12));
        assert_eq!(d.rows[3][0], Value::Null);
    }

    #[test]
    fn test_integer_from_numbers() {
        let d = single_column(
            ColumnType::Int,
            vec![json!(10), json!(3.0), json!(3.5), Value::Null, json!(true)],
        );
        assert_eq!(d.rows[0][0], json!(10));
        assert_eq!(d.rows[1][0], json!(3));
        assert_eq!(d.rows[2][0], Value::Null);
        assert_eq!(d.rows[3][0], Value::Null);
        assert_eq!(d.rows[4][0], Value::Null);
    }

    #[test]
    fn test_double_coercion() {
        let d = single_column(
            ColumnType::Double,
            vec![json!("1.5"), json!(2), json!("abc"), json!("NaN")],
        );
        assert_eq!(d.rows[0][0], json!(1.5));
        assert_eq!(d.rows[1][0], json!(2));
        assert_eq!(d.rows[2][0], Value::Null);
        // NaN has no JSON representation, so it degrades to null too.
        assert_eq!(d.rows[3][0], Value::Null);
    }

    #[test]
    fn test_date_coercion() {
        let d = single_column(
            ColumnType::Date,
            vec![
                json!("2023-01-05T10:00:00"),
                json!("2024-01-01"),
                json!("bad"),
                Value::Null,
            ],
        );
        assert_eq!(d.rows[0][0], json!("2023-01-05"));
        assert_eq!(d.rows[1][0], json!("2024-01-01"));
        assert_eq!(d.rows[2][0], Value::Null);
        assert_eq!(d.rows[3][0], Value::Null);
    }

    #[test]
    fn test_timestamp_coercion() {
        let d = single_column(
            ColumnType::Timestamp,
            vec![
                json!("2023-01-05T10:00:00"),
                json!("2023-01-05T10:00:00.123456"),
                json!("2024-06-01"),
                json!("not a time"),
            ],
        );
        assert_eq!(d.rows[0][0], json!("2023-01-05 10:00:00"));
        assert_eq!(d.rows[1][0], json!("2023-01-05 10:00:00"));
        assert_eq!(d.rows[2][0], json!("2024-06-01 00:00:00"));
        assert_eq!(d.rows[3][0], Value::Null);
    }

    #[test]
    fn test_string_coercion() {
        let d = single_column(
            ColumnType::String,
            vec![json!(42), json!(true), json!("kept"), Value::Null],
        );
        assert_eq!(d.rows[0][0], json!("42"));
        assert_eq!(d.rows[1][0], json!("true"));
        assert_eq!(d.rows[2][0], json!("kept"));
        assert_eq!(d.rows[3][0], Value::Null);
    }

    /// Columns the schema does not declare keep their fetched values.
    #[test]
    fn test_undeclared_column_untouched() {
        let mut dataset = Dataset::new(vec!["id".to_string(), "extra".to_string()]);
        dataset.push_row(vec![json!("1"), json!("raw\u{1F600}")]);
        cast(&mut dataset, &spec(vec![("id", ColumnType::Bigint)]));
        assert_eq!(dataset.rows[0][0], json!(1));
        assert_eq!(dataset.rows[0][1], json!("raw\u{1F600}"));
    }

    /// Declared columns the fetch did not return are skipped, not an error.
    #[test]
    fn test_missing_declared_column_skipped() {
        let mut dataset = Dataset::new(vec!["id".to_string()]);
        dataset.push_row(vec![json!("1")]);
        cast(
            &mut dataset,
            &spec(vec![("id", ColumnType::Bigint), ("ghost", ColumnType::Date)]),
        );
        assert_eq!(dataset.rows[0][0], json!(1));
    }

    /// A parse failure in one cell never affects its neighbors.
    #[test]
    fn test_cast_is_cell_local() {
        let spec = spec(vec![
            ("id", ColumnType::Bigint),
            ("views", ColumnType::Int),
            ("date_posted", ColumnType::Date),
        ]);
        let mut dataset = Dataset::new(vec![
            "id".to_string(),
            "views".to_string(),
            "date_posted".to_string(),
        ]);
        dataset.push_row(vec![json!("1"), json!("10"), json!("2024-01-01")]);
        dataset.push_row(vec![json!("x"), json!("20"), json!("bad")]);
        cast(&mut dataset, &spec);
        assert_eq!(
            dataset.rows[0],
            vec![json!(1), json!(10), json!("2024-01-01")]
        );
        assert_eq!(dataset.rows[1], vec![Value::Null, json!(20), Value::Null]);
    }

    /// cast(cast(d, s), s) == cast(d, s) for every column type.
    #[test]
    fn test_idempotent() {
        let spec = spec(vec![
            ("a", ColumnType::Bigint),
            ("b", ColumnType::Double),
            ("c", ColumnType::Date),
            ("d", ColumnType::Timestamp),
            ("e", ColumnType::String),
        ]);
        let mut dataset = Dataset::new(
            ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect(),
        );
        dataset.push_row(vec![
            json!("9"),
            json!("2.5"),
            json!("2023-01-05T10:00:00"),
            json!("2023-01-05T10:00:00"),
            json!(17),
        ]);
        dataset.push_row(vec![
            json!("x"),
            json!("x"),
            json!("x"),
            json!("x"),
            Value::Null,
        ]);
        cast(&mut dataset, &spec);
        let once = dataset.clone();
        cast(&mut dataset, &spec);
        assert_eq!(dataset, once);
    }
}
