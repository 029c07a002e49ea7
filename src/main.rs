//! Command-line interface for pg-s3-export
//!
//! # Usage Examples
//!
//! ```bash
//! # Everything on the command line
//! pg-s3-export \
//!   --db-host db.internal --db-user exporter --db-password secret \
//!   --db-name analytics --bucket analytics-exports --region eu-west-1
//!
//! # Or from the environment / a .env file
//! DB_HOST=db.internal DB_USER=exporter DB_PASS=secret DB_NAME=analytics \
//!   S3_BUCKET=analytics-exports pg-s3-export
//! ```

use anyhow::Result;
use clap::Parser;
use pg_s3_export::{run_export, PostgresFetcher, S3ArtifactStore, SchemaCatalog};

#[derive(Parser)]
#[command(name = "pg-s3-export")]
#[command(about = "Export PostgreSQL tables to S3 as newline-delimited JSON")]
#[command(long_about = None)]
struct Cli {
    /// PostgreSQL host
    #[arg(long, env = "DB_HOST")]
    db_host: String,

    /// PostgreSQL port
    #[arg(long, default_value = "5432", env = "DB_PORT")]
    db_port: u16,

    /// PostgreSQL user
    #[arg(long, env = "DB_USER")]
    db_user: String,

    /// PostgreSQL password
    #[arg(long, env = "DB_PASS")]
    db_password: String,

    /// PostgreSQL database name
    #[arg(long, env = "DB_NAME")]
    db_name: String,

    /// PostgreSQL schema holding the exported tables
    #[arg(long, default_value = "public")]
    db_schema: String,

    /// Destination S3 bucket
    #[arg(long, env = "S3_BUCKET")]
    bucket: String,

    /// AWS region of the destination bucket
    #[arg(long, default_value = "us-east-1", env = "AWS_REGION")]
    region: String,
}

impl Cli {
    fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.db_user, self.db_password, self.db_host, self.db_port, self.db_name
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    // A local .env file may supply any of the required variables.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Missing required settings are fatal here, before any table is touched.
    let cli = Cli::parse();

    tracing::info!(
        "Starting export of schema '{}' to bucket '{}'",
        cli.db_schema,
        cli.bucket
    );

    let fetcher = PostgresFetcher::connect(&cli.connection_string()).await?;
    let store = S3ArtifactStore::new(&cli.region, &cli.bucket).await;
    let catalog = SchemaCatalog::builtin();

    let summary = run_export(&fetcher, &store, &catalog, &cli.db_schema).await;

    let failed = summary.failed_tables();
    if failed.is_empty() {
        tracing::info!("Export completed successfully");
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "export finished with failed tables: {}",
            failed.join(", ")
        ))
    }
}
