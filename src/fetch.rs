//! Full-table fetching from PostgreSQL.
//!
//! The fetcher runs one `SELECT *` per table and converts each row into JSON
//! scalar cells, in the column order the source returned. Temporal columns
//! are re-emitted as ISO strings so the caster's declared formats apply
//! uniformly regardless of the source column type.

use crate::dataset::Dataset;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use tokio_postgres::{Client, NoTls, Row};
use tracing::warn;

/// Executes a full-table query and returns the result as a [`Dataset`].
#[async_trait]
pub trait TableFetcher: Send + Sync {
    async fn fetch(&self, db_schema: &str, table: &str) -> Result<Dataset>;
}

/// [`TableFetcher`] backed by a live PostgreSQL connection.
pub struct PostgresFetcher {
    client: Client,
}

impl PostgresFetcher {
    /// Connect and spawn the connection task.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
            .await
            .context("failed to connect to PostgreSQL")?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                eprintln!("PostgreSQL connection error: {e}");
            }
        });

        Ok(Self { client })
    }
}

#[async_trait]
impl TableFetcher for PostgresFetcher {
    async fn fetch(&self, db_schema: &str, table: &str) -> Result<Dataset> {
        let query = format!("SELECT * FROM \"{db_schema}\".\"{table}\"");
        let rows = self
            .client
            .query(&query, &[])
            .await
            .with_context(|| format!("failed to query table {db_schema}.{table}"))?;

        let columns: Vec<String> = match rows.first() {
            Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
            None => return Ok(Dataset::new(Vec::new())),
        };

        let mut dataset = Dataset::new(columns);
        for row in &rows {
            let mut cells = Vec::with_capacity(dataset.columns.len());
            for i in 0..row.columns().len() {
                cells.push(convert_cell(row, i)?);
            }
            dataset.push_row(cells);
        }
        Ok(dataset)
    }
}

/// Convert one PostgreSQL cell to a JSON scalar.
fn convert_cell(row: &Row, index: usize) -> Result<Value> {
    use tokio_postgres::types::Type;

    let column = &row.columns()[index];
    let pg_type = column.type_();

    match *pg_type {
        Type::BOOL => Ok(row
            .try_get::<_, Option<bool>>(index)?
            .map(Value::Bool)
            .unwrap_or(Value::Null)),
        Type::INT2 => Ok(row
            .try_get::<_, Option<i16>>(index)?
            .map(|i| Value::from(i as i64))
            .unwrap_or(Value::Null)),
        Type::INT4 => Ok(row
            .try_get::<_, Option<i32>>(index)?
            .map(|i| Value::from(i as i64))
            .unwrap_or(Value::Null)),
        Type::INT8 => Ok(row
            .try_get::<_, Option<i64>>(index)?
            .map(Value::from)
            .unwrap_or(Value::Null)),
        Type::FLOAT4 => Ok(row
            .try_get::<_, Option<f32>>(index)?
            .and_then(|f| serde_json::Number::from_f64(f as f64))
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        Type::FLOAT8 => Ok(row
            .try_get::<_, Option<f64>>(index)?
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        Type::NUMERIC => match row.try_get::<_, Option<Decimal>>(index)? {
            Some(decimal) => Ok(decimal
                .to_f64()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                // Out-of-range NUMERIC falls back to its textual form.
                .unwrap_or_else(|| Value::String(decimal.to_string()))),
            None => Ok(Value::Null),
        },
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => Ok(row
            .try_get::<_, Option<String>>(index)?
            .map(Value::String)
            .unwrap_or(Value::Null)),
        Type::TIMESTAMP => Ok(row
            .try_get::<_, Option<NaiveDateTime>>(index)?
            .map(|ts| Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null)),
        Type::TIMESTAMPTZ => Ok(row
            .try_get::<_, Option<DateTime<Utc>>>(index)?
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::Null)),
        Type::DATE => Ok(row
            .try_get::<_, Option<NaiveDate>>(index)?
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null)),
        Type::TIME => Ok(row
            .try_get::<_, Option<NaiveTime>>(index)?
            .map(|t| Value::String(t.to_string()))
            .unwrap_or(Value::Null)),
        Type::UUID => Ok(row
            .try_get::<_, Option<uuid::Uuid>>(index)?
            .map(|u| Value::String(u.to_string()))
            .unwrap_or(Value::Null)),
        Type::JSON | Type::JSONB => Ok(row
            .try_get::<_, Option<serde_json::Value>>(index)?
            .unwrap_or(Value::Null)),
        _ => {
            // Unknown types: take the textual representation if the driver
            // offers one, otherwise degrade to null rather than failing the
            // whole table.
            if let Ok(val) = row.try_get::<_, Option<String>>(index) {
                Ok(val.map(Value::String).unwrap_or(Value::Null))
            } else {
                warn!(
                    "Unsupported PostgreSQL type {pg_type:?} in column '{}', emitting null",
                    column.name()
                );
                Ok(Value::Null)
            }
        }
    }
}
