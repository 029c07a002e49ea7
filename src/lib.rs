//! pg-s3-export Library
//!
//! Exports PostgreSQL tables to an S3 bucket as newline-delimited JSON.
//!
//! Each run clears previously published `.json` artifacts from the bucket,
//! then processes every table in the schema catalog, in order: fetch the
//! full table, sanitize textual values, cast columns to their declared
//! types, serialize to NDJSON, and upload under a timestamped key. A failure
//! in one table never blocks the others.
//!
//! # CLI Usage
//!
//! ```bash
//! pg-s3-export \
//!   --db-host localhost --db-user app --db-password secret --db-name app \
//!   --bucket my-export-bucket --region us-east-1
//! ```
//!
//! Every connection option can also come from the environment (`DB_HOST`,
//! `DB_USER`, `DB_PASS`, `DB_NAME`, `S3_BUCKET`, `AWS_REGION`), including
//! via a local `.env` file.

pub mod cast;
pub mod catalog;
pub mod dataset;
pub mod export;
pub mod fetch;
pub mod ndjson;
pub mod sanitize;
pub mod storage;

pub use catalog::{ColumnSchema, ColumnType, SchemaCatalog, TableSpec};
pub use dataset::Dataset;
pub use export::{run_export, RunSummary, Stage, TableOutcome};
pub use fetch::{PostgresFetcher, TableFetcher};
pub use storage::{ArtifactStore, S3ArtifactStore};
