//! Structured output sink: flush the finished tree and result set.
//!
//! Written once, whole-file, after every entry has reached a terminal state.
//! Partially-completed runs flush whatever was gathered; there is no
//! incremental or partial write.

use crate::error::Result;
use crate::model::{NavigationTree, Summary, TraversalResult};
use crate::traverse::RunOutput;
use serde::Serialize;
use std::path::Path;

/// The serialized report: the nested tree, the per-leaf results, and
/// aggregate counts.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated_at: String,
    pub summary: Summary,
    pub tree: &'a NavigationTree,
    pub results: &'a [TraversalResult],
}

impl<'a> Report<'a> {
    pub fn new(output: &'a RunOutput) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            summary: Summary::compute(&output.tree, &output.results),
            tree: &output.tree,
            results: &output.results,
        }
    }
}

/// Serialize the run output to `path` and return the computed summary.
pub fn write_report(path: &Path, output: &RunOutput) -> Result<Summary> {
    let report = Report::new(output);
    std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    tracing::info!(
        path = %path.display(),
        leaves = report.summary.leaves_visited,
        "report flushed"
    );
    Ok(report.summary)
}
