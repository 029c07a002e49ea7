//! Character-level cleanup of textual and boolean cells.
//!
//! Downstream consumers (Athena over the published NDJSON) choke on control
//! characters and exotic code points, so string and bool cells are reduced to
//! printable ASCII plus a small set of accented Latin letters before casting.

use crate::dataset::Dataset;
use serde_json::Value;

/// Normalize every string and bool cell in place.
///
/// Carriage returns, line feeds, and tabs become a single space each; any
/// remaining character outside the whitelist is dropped. Bool cells are
/// stringified first. Numbers, already-formatted dates, and nulls pass
/// through untouched. Idempotent.
pub fn sanitize(dataset: &mut Dataset) {
    for row in &mut dataset.rows {
        for cell in row {
            match cell {
                Value::String(s) => {
                    if !s.chars().all(is_allowed) {
                        *s = clean(s);
                    }
                }
                Value::Bool(b) => {
                    *cell = Value::String(b.to_string());
                }
                _ => {}
            }
        }
    }
}

fn clean(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            '\r' | '\n' | '\t' => ' ',
            other => other,
        })
        .filter(|c| is_allowed(*c))
        .collect()
}

/// Printable ASCII plus the accented letters the original whitelist allowed.
fn is_allowed(c: char) -> bool {
    matches!(c, ' '..='~') || matches!(c, 'á' | 'é' | 'í' | 'ó' | 'ú' | 'ñ')
}
