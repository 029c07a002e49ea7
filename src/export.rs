//! Per-table export orchestration.
//!
//! The run clears the bucket once, then pushes every cataloged table through
//! fetch, sanitize, cast, serialize, and publish, strictly sequentially and
//! in catalog order. Failures are contained at the table boundary: no
//! failure in one table's pipeline may block or skip any other table.

use crate::cast::cast;
use crate::catalog::{SchemaCatalog, TableSpec};
use crate::dataset::Dataset;
use crate::fetch::TableFetcher;
use crate::ndjson::write_ndjson;
use crate::sanitize::sanitize;
use crate::storage::{clear_artifacts, publish, ArtifactStore};
use anyhow::{Context, Result};
use std::fmt;
use std::io::{BufWriter, Write};
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

/// Pipeline stage at which a table failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Serialize,
    Upload,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "fetch"),
            Stage::Serialize => write!(f, "serialize"),
            Stage::Upload => write!(f, "upload"),
        }
    }
}

/// Outcome of one table's pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    Uploaded { key: String, rows: usize },
    SkippedEmpty,
    Failed { stage: Stage, error: String },
}

/// Ordered per-table outcomes plus the bucket-clear status for one run.
#[derive(Debug)]
pub struct RunSummary {
    pub bucket_cleared: bool,
    pub tables: Vec<(String, TableOutcome)>,
}

impl RunSummary {
    pub fn failed_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|(_, outcome)| matches!(outcome, TableOutcome::Failed { .. }))
            .map(|(table, _)| table.as_str())
            .collect()
    }
}

/// Run one full export: clear the bucket, then process every cataloged table.
pub async fn run_export(
    fetcher: &dyn TableFetcher,
    store: &dyn ArtifactStore,
    catalog: &SchemaCatalog,
    db_schema: &str,
) -> RunSummary {
    info!("Clearing previously published artifacts");
    let bucket_cleared = match clear_artifacts(store).await {
        Ok(0) => {
            info!("No previous artifacts in the bucket");
            true
        }
        Ok(removed) => {
            info!("Removed {removed} previous artifacts");
            true
        }
        Err(e) => {
            warn!("Bucket clear failed, continuing: {e:#}");
            false
        }
    };

    let mut tables = Vec::with_capacity(catalog.tables().len());
    for spec in catalog.tables() {
        info!("Exporting table: {}", spec.table);
        let outcome = export_table(fetcher, store, spec, db_schema).await;
        match &outcome {
            TableOutcome::Uploaded { key, rows } => {
                info!("Table {}: {rows} rows uploaded to {key}", spec.table)
            }
            TableOutcome::SkippedEmpty => info!("Table {} is empty, skipping", spec.table),
            TableOutcome::Failed { stage, error } => {
                error!("Table {} failed at {stage}: {error}", spec.table)
            }
        }
        tables.push((spec.table.clone(), outcome));
    }

    RunSummary {
        bucket_cleared,
        tables,
    }
}

async fn export_table(
    fetcher: &dyn TableFetcher,
    store: &dyn ArtifactStore,
    spec: &TableSpec,
    db_schema: &str,
) -> TableOutcome {
    let mut dataset = match fetcher.fetch(db_schema, &spec.table).await {
        Ok(dataset) => dataset,
        Err(e) => {
            return TableOutcome::Failed {
                stage: Stage::Fetch,
                error: format!("{e:#}"),
            }
        }
    };

    if dataset.is_empty() {
        return TableOutcome::SkippedEmpty;
    }

    sanitize(&mut dataset);
    cast(&mut dataset, spec);
    let rows = dataset.len();

    // The temp file is removed on drop, so cleanup happens on the success
    // path and on every failure path below.
    let file = match write_artifact(&dataset) {
        Ok(file) => file,
        Err(e) => {
            return TableOutcome::Failed {
                stage: Stage::Serialize,
                error: format!("{e:#}"),
            }
        }
    };

    match publish(store, file.path(), spec).await {
        Ok(key) => TableOutcome::Uploaded { key, rows },
        Err(e) => TableOutcome::Failed {
            stage: Stage::Upload,
            error: format!("{e:#}"),
        },
    }
}

fn write_artifact(dataset: &Dataset) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("failed to create temporary file")?;
    let mut writer = BufWriter::new(file.as_file_mut());
    write_ndjson(dataset, &mut writer)?;
    writer.flush().context("failed to flush temporary file")?;
    drop(writer);
    Ok(file)
}
