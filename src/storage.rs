//! Object-storage access: bucket refresh and artifact publishing.

use crate::catalog::TableSpec;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{info, warn};

/// Suffix identifying published artifacts in the bucket.
pub const ARTIFACT_SUFFIX: &str = ".json";

/// Minimal surface the orchestrator needs from the object store.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn list_keys(&self) -> Result<Vec<String>>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn upload_file(&self, path: &Path, key: &str) -> Result<()>;
}

/// [`ArtifactStore`] bound to one S3 bucket.
pub struct S3ArtifactStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ArtifactStore {
    pub async fn new(region: &str, bucket: &str) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn list_keys(&self) -> Result<Vec<String>> {
        // One listing page only, no continuation tokens: a bucket holding
        // more objects than a single page returns is not fully enumerated.
        // Known limitation carried over from the original exporter.
        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .send()
            .await
            .with_context(|| format!("failed to list bucket {}", self.bucket))?;

        Ok(response
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| object.key)
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("failed to delete s3://{}/{key}", self.bucket))?;
        Ok(())
    }

    async fn upload_file(&self, path: &Path, key: &str) -> Result<()> {
        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type("application/json")
            .send()
            .await
            .with_context(|| format!("failed to upload to s3://{}/{key}", self.bucket))?;
        Ok(())
    }
}

/// Delete every previously published artifact in the bucket.
///
/// Returns the number of objects removed. An empty bucket is a no-op, and a
/// failed deletion is logged and skipped rather than aborting the refresh.
pub async fn clear_artifacts(store: &dyn ArtifactStore) -> Result<usize> {
    let keys = store.list_keys().await?;
    let mut removed = 0;
    for key in keys.iter().filter(|k| k.ends_with(ARTIFACT_SUFFIX)) {
        match store.delete(key).await {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to delete previous artifact {key}: {e:#}"),
        }
    }
    Ok(removed)
}

/// Destination key for one table's export at a given instant:
/// `<prefix><table>_<YYYYMMDD_HHMMSS>.json`.
pub fn artifact_key(spec: &TableSpec, at: NaiveDateTime) -> String {
    format!(
        "{}{}_{}{ARTIFACT_SUFFIX}",
        spec.destination_prefix,
        spec.table,
        at.format("%Y%m%d_%H%M%S")
    )
}

/// Upload a serialized table file under its timestamped key.
pub async fn publish(store: &dyn ArtifactStore, path: &Path, spec: &TableSpec) -> Result<String> {
    let key = artifact_key(spec, chrono::Local::now().naive_local());
    store.upload_file(path, &key).await?;
    info!("Uploaded artifact: {key}");
    Ok(key)
}
