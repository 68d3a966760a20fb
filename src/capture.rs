//! Leaf executor: activate a leaf item and capture an artifact.
//!
//! Failure to reach the network-settled state is not fatal — a partially
//! settled page is still informative, so capture is attempted regardless.
//! Only a hard activation error aborts the visit, and it is reported to the
//! orchestrator, never retried here.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::menu::discover::DiscoveredItem;
use crate::model::LeafPath;
use crate::page::PageHandle;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Persists captured artifacts. The engine only supplies the relative path
/// and the bytes; storage layout and filesystem-encoding concerns belong to
/// the writer.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    async fn write(&self, rel_path: &str, bytes: &[u8]) -> Result<()>;
}

/// Writes artifacts under a root directory, creating it on demand.
pub struct FsArtifactWriter {
    root: PathBuf,
}

impl FsArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ArtifactWriter for FsArtifactWriter {
    async fn write(&self, rel_path: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(rel_path), bytes).await?;
        Ok(())
    }
}

/// Deterministic relative artifact path for a leaf. Text segments are passed
/// through verbatim, non-ASCII included.
pub fn artifact_path(path: &LeafPath) -> String {
    match &path.second_level {
        Some(second) => format!(
            "{}_{}_{}_{}.png",
            path.entry, path.category, path.first_level, second
        ),
        None => format!("{}_{}_{}.png", path.entry, path.category, path.first_level),
    }
}

/// Activate a leaf and capture its artifact.
///
/// Returns the artifact's relative path, or `None` when the page was visited
/// but capture failed. A hard activation error surfaces as
/// [`Error::Execution`].
pub async fn visit(
    page: &dyn PageHandle,
    writer: &dyn ArtifactWriter,
    item: &DiscoveredItem,
    path: &LeafPath,
    cfg: &Config,
) -> Result<Option<String>> {
    item.el
        .click()
        .await
        .map_err(|e| Error::Execution(format!("'{}': {e}", item.data.text)))?;

    match page
        .wait_for_load_idle(Duration::from_millis(cfg.delays.load_idle_ms))
        .await
    {
        Ok(true) => {}
        Ok(false) => tracing::warn!(leaf = %item.data.text, "page never settled, capturing anyway"),
        Err(e) => tracing::warn!(leaf = %item.data.text, error = %e, "load-idle wait failed"),
    }
    tokio::time::sleep(Duration::from_millis(cfg.delays.capture_settle_ms)).await;

    let rel = artifact_path(path);
    let captured = match page.screenshot().await {
        Ok(bytes) => writer.write(&rel, &bytes).await,
        Err(e) => Err(e),
    };
    match captured {
        Ok(()) => {
            tracing::info!(artifact = %rel, "captured");
            Ok(Some(rel))
        }
        Err(e) => {
            tracing::warn!(artifact = %rel, error = %e, "capture failed, leaf still visited");
            Ok(None)
        }
    }
}
