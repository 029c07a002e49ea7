//! Newline-delimited JSON serialization.
//!
//! One JSON object per row, keys in dataset column order, rows separated by a
//! single `\n`. Not a JSON array: each line is an independent document, which
//! is what Athena and most log shippers expect. Rows are rendered one at a
//! time so peak memory stays bounded for large tables.

use crate::dataset::Dataset;
use anyhow::Result;
use serde_json::{Map, Value};
use std::io::Write;

/// Write `dataset` as NDJSON to `out`. An empty dataset writes nothing.
///
/// Non-ASCII characters are emitted literally (UTF-8), not `\u`-escaped.
pub fn write_ndjson<W: Write>(dataset: &Dataset, mut out: W) -> Result<()> {
    for row in &dataset.rows {
        let mut record = Map::with_capacity(dataset.columns.len());
        for (name, value) in dataset.columns.iter().zip(row) {
            record.insert(name.clone(), value.clone());
        }
        serde_json::to_writer(&mut out, &Value::Object(record))?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
