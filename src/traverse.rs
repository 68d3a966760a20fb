//! Traversal orchestrator: walk the discovered tree depth-first.
//!
//! The orchestrator exclusively owns the in-progress tree and result set for
//! one run. Failures are caught at the smallest enclosing scope — a leaf
//! failure is recorded and traversal continues, a category failure never
//! aborts its entry, and a locator timeout closes only its own entry. The
//! run always terminates with a best-effort tree and result set.

use crate::capture::{self, ArtifactWriter};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::menu::discover::{self, DiscoveredCategory, DiscoveredItem};
use crate::menu::locator;
use crate::model::{Category, LeafPath, NavigationTree, TopLevelEntry, TraversalResult};
use crate::page::PageHandle;
use std::time::Duration;

/// Per-entry lifecycle. Entries move strictly forward; a failure at any
/// stage jumps to `Closed` without touching siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Pending,
    MenuOpened,
    CategoriesDiscovered,
    Closed,
}

/// The finished tree and the append-only result set for one run.
#[derive(Debug)]
pub struct RunOutput {
    pub tree: NavigationTree,
    pub results: Vec<TraversalResult>,
}

/// One traversal run over a borrowed page handle.
pub struct Traversal<'a> {
    page: &'a dyn PageHandle,
    writer: &'a dyn ArtifactWriter,
    cfg: &'a Config,
    tree: NavigationTree,
    results: Vec<TraversalResult>,
}

impl<'a> Traversal<'a> {
    pub fn new(page: &'a dyn PageHandle, writer: &'a dyn ArtifactWriter, cfg: &'a Config) -> Self {
        Self {
            page,
            writer,
            cfg,
            tree: NavigationTree::default(),
            results: Vec::new(),
        }
    }

    /// Walk every discoverable entry and return the aggregated output.
    pub async fn run(mut self) -> RunOutput {
        if self.cfg.initial_screenshot {
            self.capture_initial().await;
        }

        let entries = match locator::discover_entries(self.page, self.cfg).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "entry discovery failed, flushing empty tree");
                Vec::new()
            }
        };

        let total = entries.len();
        for (idx, entry) in entries.into_iter().enumerate() {
            tracing::info!(entry = %entry.text, n = idx + 1, of = total, "processing entry");
            self.run_entry(entry).await;
        }

        RunOutput {
            tree: self.tree,
            results: self.results,
        }
    }

    async fn capture_initial(&self) {
        match self.page.screenshot().await {
            Ok(bytes) => {
                if let Err(e) = self.writer.write("initial_page.png", &bytes).await {
                    tracing::warn!(error = %e, "initial screenshot not persisted");
                }
            }
            Err(e) => tracing::warn!(error = %e, "initial screenshot failed"),
        }
    }

    async fn run_entry(&mut self, mut entry: TopLevelEntry) {
        let mut state = EntryState::Pending;

        let panel = match locator::open_entry(self.page, self.cfg, &entry.text).await {
            Ok(panel) => {
                state = EntryState::MenuOpened;
                panel
            }
            Err(e) => {
                tracing::warn!(entry = %entry.text, error = %e, "panel never opened, entry closed");
                self.close_entry(entry, EntryState::Pending).await;
                return;
            }
        };

        let categories = match discover::discover_categories(panel.as_ref(), self.cfg).await {
            Ok(categories) => {
                state = EntryState::CategoriesDiscovered;
                categories
            }
            Err(e) => {
                tracing::warn!(entry = %entry.text, error = %e, "category discovery failed");
                self.close_entry(entry, state).await;
                return;
            }
        };
        if categories.is_empty() {
            tracing::info!(entry = %entry.text, "no categories under entry");
        }

        for cat in categories {
            if self.denylisted(&entry.text, &cat.title) {
                tracing::info!(entry = %entry.text, category = %cat.title, "denylisted, skipped");
                continue;
            }
            let category = self.run_category(&entry.text, cat).await;
            entry.children.push(category);
        }

        self.close_entry(entry, state).await;
    }

    /// Dismiss the panel and append the entry. Dismissal runs regardless of
    /// how far the entry got, so no residual panel state leaks into the next
    /// entry's discovery.
    async fn close_entry(&mut self, entry: TopLevelEntry, reached: EntryState) {
        if reached != EntryState::Pending {
            if let Err(e) = self.page.press_escape().await {
                tracing::warn!(error = %e, "panel dismissal failed");
            }
            tokio::time::sleep(Duration::from_millis(self.cfg.delays.dismiss_settle_ms)).await;
        }
        tracing::debug!(entry = %entry.text, ?reached, "entry closed");
        if !self.tree.push_entry(entry) {
            tracing::warn!("duplicate entry text, dropped");
        }
    }

    fn denylisted(&self, entry: &str, category: &str) -> bool {
        self.cfg
            .denylist
            .iter()
            .any(|(e, c)| e == entry && c == category)
    }

    /// Reveal and visit everything under one category. All failures are
    /// caught here; the returned record holds whatever was reached.
    async fn run_category(&mut self, entry_text: &str, cat: DiscoveredCategory) -> Category {
        tracing::info!(category = %cat.title, items = cat.items.len(), "traversing category");
        let mut record = Category {
            title: cat.title.clone(),
            first_level: cat.items.iter().map(|i| i.data.clone()).collect(),
            second_level: Vec::new(),
        };

        for item in &cat.items {
            let revealed = match discover::reveal(self.page, item, &cat, self.cfg).await {
                Ok(revealed) => revealed,
                Err(e) => {
                    tracing::warn!(
                        category = %cat.title,
                        item = %item.data.text,
                        error = %e,
                        "reveal failed, item recorded as failed"
                    );
                    let path = LeafPath::new(entry_text, &cat.title, &item.data.text, None);
                    self.record_failure(path, &e);
                    continue;
                }
            };

            if revealed.is_empty() {
                let path = LeafPath::new(entry_text, &cat.title, &item.data.text, None);
                self.visit_and_record(item, path).await;
            } else {
                for sub in &revealed {
                    record.second_level.push(sub.data.clone());
                    let path = LeafPath::new(
                        entry_text,
                        &cat.title,
                        &item.data.text,
                        Some(sub.data.text.clone()),
                    );
                    self.visit_and_record(sub, path).await;
                }
            }
        }

        record
    }

    async fn visit_and_record(&mut self, item: &DiscoveredItem, path: LeafPath) {
        match capture::visit(self.page, self.writer, item, &path, self.cfg).await {
            Ok(artifact) => self.results.push(TraversalResult {
                path,
                ok: true,
                artifact,
                error: None,
            }),
            Err(e) => {
                tracing::warn!(leaf = %path.first_level, error = %e, "leaf visit failed");
                self.record_failure(path, &e);
            }
        }
    }

    fn record_failure(&mut self, path: LeafPath, error: &Error) {
        self.results.push(TraversalResult {
            path,
            ok: false,
            artifact: None,
            error: Some(error.to_string()),
        });
    }
}

/// Drive a single named path and capture one artifact.
///
/// Used by the `probe` command to exercise one known-good path without a
/// full traversal. The denylist does not apply to explicit probes.
pub async fn probe_path(
    page: &dyn PageHandle,
    writer: &dyn ArtifactWriter,
    cfg: &Config,
    entry: &str,
    category: &str,
    first: &str,
    second: Option<&str>,
) -> Result<TraversalResult> {
    let panel = locator::open_entry(page, cfg, entry).await?;
    let categories = discover::discover_categories(panel.as_ref(), cfg).await?;
    let cat = categories
        .into_iter()
        .find(|c| c.title == category)
        .ok_or_else(|| Error::Page(format!("category '{category}' not found under '{entry}'")))?;
    let item = cat
        .items
        .iter()
        .find(|i| i.data.text == first)
        .ok_or_else(|| Error::Page(format!("item '{first}' not found under '{category}'")))?;

    match second {
        None => {
            let path = LeafPath::new(entry, category, first, None);
            let artifact = capture::visit(page, writer, item, &path, cfg).await?;
            Ok(TraversalResult {
                path,
                ok: true,
                artifact,
                error: None,
            })
        }
        Some(second_text) => {
            let revealed = discover::reveal(page, item, &cat, cfg).await?;
            let sub = revealed
                .into_iter()
                .find(|i| i.data.text == second_text)
                .ok_or_else(|| {
                    Error::Page(format!("item '{second_text}' not revealed under '{first}'"))
                })?;
            let path = LeafPath::new(entry, category, first, Some(second_text.to_string()));
            let artifact = capture::visit(page, writer, &sub, &path, cfg).await?;
            Ok(TraversalResult {
                path,
                ok: true,
                artifact,
                error: None,
            })
        }
    }
}
