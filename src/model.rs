//! Canonical data model for the discovered navigation structure.
//!
//! The tree and result set are owned exclusively by the orchestrator for the
//! duration of one run and flushed once at the end. Entries are immutable
//! once appended; traversal results are append-only.

use serde::{Deserialize, Serialize};

/// Root collection of discovered top-level entries.
///
/// Entries are unique by display text. Order matches the caller-supplied
/// canonical ordering when one is provided, else DOM encounter order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationTree {
    pub entries: Vec<TopLevelEntry>,
}

impl NavigationTree {
    /// Append an entry, enforcing uniqueness by display text. Returns false
    /// (and drops the entry) when the text is already present.
    pub fn push_entry(&mut self, entry: TopLevelEntry) -> bool {
        if self.entries.iter().any(|e| e.text == entry.text) {
            return false;
        }
        self.entries.push(entry);
        true
    }
}

/// One top-level navigation entry and the categories discovered beneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopLevelEntry {
    pub text: String,
    pub stable_id: Option<String>,
    pub type_tag: Option<String>,
    pub is_active: bool,
    pub children: Vec<Category>,
}

/// A first-level category inside a disclosure panel.
///
/// `second_level` is populated lazily, only after a triggering interaction on
/// one of the `first_level` items reveals a detail sub-panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub title: String,
    pub first_level: Vec<MenuItem>,
    pub second_level: Vec<MenuItem>,
}

/// A single menu item. Whether it is a leaf is discovered, not declared:
/// an item with no revealable children is a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub text: String,
    pub is_active: bool,
    pub has_dismiss_affordance: bool,
}

/// Classification verdict for a container's resolved title. The same
/// structural class is reused for category and detail containers; the title
/// text is the single disambiguation signal, re-evaluated per panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    /// A sibling category at the current level.
    Category,
    /// A detail sub-panel contributing second-level items.
    Detail,
}

/// Full path to one visited leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafPath {
    pub entry: String,
    pub category: String,
    pub first_level: String,
    pub second_level: Option<String>,
}

impl LeafPath {
    pub fn new(
        entry: impl Into<String>,
        category: impl Into<String>,
        first_level: impl Into<String>,
        second_level: Option<String>,
    ) -> Self {
        Self {
            entry: entry.into(),
            category: category.into(),
            first_level: first_level.into(),
            second_level,
        }
    }
}

/// Outcome of visiting one leaf. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalResult {
    pub path: LeafPath,
    pub ok: bool,
    /// Relative path of the captured artifact, absent when capture failed.
    pub artifact: Option<String>,
    pub error: Option<String>,
}

/// Aggregate counts reported alongside the tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub entries: usize,
    pub categories: usize,
    pub first_level_items: usize,
    pub second_level_items: usize,
    pub leaves_visited: usize,
    pub captures_ok: usize,
    pub captures_failed: usize,
}

impl Summary {
    pub fn compute(tree: &NavigationTree, results: &[TraversalResult]) -> Self {
        let mut s = Summary {
            entries: tree.entries.len(),
            ..Default::default()
        };
        for entry in &tree.entries {
            s.categories += entry.children.len();
            for cat in &entry.children {
                s.first_level_items += cat.first_level.len();
                s.second_level_items += cat.second_level.len();
            }
        }
        s.leaves_visited = results.len();
        s.captures_ok = results.iter().filter(|r| r.artifact.is_some()).count();
        s.captures_failed = results.len() - s.captures_ok;
        s
    }
}
