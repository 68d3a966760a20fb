//! Run configuration: endpoints, selectors, delays, ordering and exclusions.
//!
//! Every tunable the engine consults lives here, with defaults matching the
//! menu family this crate is built for. A JSON file can override any subset
//! of fields via [`Config::load`].

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration for one traversal run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Candidate CDP debug ports, probed in order. The embedded browser's
    /// endpoint number is not stable across launches; this list encodes the
    /// known historical values.
    pub cdp_ports: Vec<u16>,
    /// Number of full sweeps over the candidate list before giving up.
    pub connection_retries: u32,
    /// Fixed backoff between sweeps, in milliseconds.
    pub backoff_ms: u64,
    /// Per-probe HTTP timeout against the version endpoint, in milliseconds.
    pub probe_timeout_ms: u64,

    pub selectors: Selectors,
    pub delays: Delays,

    /// Canonical ordering for top-level entries. When non-empty, discovered
    /// entries are emitted in this order and entries not named here are
    /// dropped; when empty, DOM encounter order is kept.
    pub entry_order: Vec<String>,
    /// `(entry text, category title)` pairs whose sub-content is never
    /// visited, regardless of what discovery finds.
    pub denylist: Vec<(String, String)>,

    /// Directory for captured screenshots.
    pub screenshot_dir: String,
    /// Output file for the discovered tree and traversal results.
    pub output_file: String,
    /// Capture a full-page screenshot before traversal begins.
    pub initial_screenshot: bool,
}

/// CSS selectors and marker strings for the menu markup. The markup reuses
/// the same container class at different depths; the `detail_marker` substring
/// in a container's title is the only signal that it holds second-level
/// content rather than a sibling category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub nav_list: String,
    pub nav_item: String,
    pub nav_text: String,
    pub panel: String,
    pub category_container: String,
    pub category_title: String,
    pub item: String,
    pub item_text: String,
    pub dismiss: String,
    /// Class substring marking an item or entry as currently active.
    pub active_class: String,
    /// Title substring identifying a detail (second-level) panel.
    pub detail_marker: String,
    /// Attribute carrying a stable drag-and-drop id on nav items.
    pub stable_id_attr: String,
    /// Attribute carrying the entry's type tag on its text element.
    pub type_attr: String,
}

/// Bounded waits and settle delays, in milliseconds. Every wait site in the
/// engine is bounded; a timeout is a recoverable outcome at its local scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Delays {
    /// Waiting for the top navigation list to appear.
    pub nav_wait_ms: u64,
    /// Strategy 1/2 bounded wait for the disclosure panel.
    pub panel_wait_ms: u64,
    /// Fixed settle before the strategy-3 visibility scan.
    pub panel_settle_ms: u64,
    /// Settle after activating a first-level item, before recounting
    /// containers.
    pub reveal_settle_ms: u64,
    /// Bounded wait for the page's load-idle signal after a leaf activation.
    pub load_idle_ms: u64,
    /// Additional fixed settle before capture.
    pub capture_settle_ms: u64,
    /// Settle after dismissing a panel between entries.
    pub dismiss_settle_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cdp_ports: vec![9222, 9333, 9444, 9555],
            connection_retries: 3,
            backoff_ms: 3_000,
            probe_timeout_ms: 3_000,
            selectors: Selectors::default(),
            delays: Delays::default(),
            entry_order: vec![
                "3D模型".into(),
                "SU模型".into(),
                "材质".into(),
                "贴图".into(),
                "CAD".into(),
                "灯光".into(),
                "光域网".into(),
                "PS免抠".into(),
            ],
            denylist: vec![("贴图".into(), "免抠素材".into())],
            screenshot_dir: "screenshots".into(),
            output_file: "navigation.json".into(),
            initial_screenshot: true,
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            nav_list: "ul[data-rfd-droppable-id='nav-list']".into(),
            nav_item: "li".into(),
            nav_text: "p".into(),
            panel: "div.mantine-HoverCard-dropdown[role='dialog']".into(),
            category_container: "div[class*='maxClassList_max_children_class__']".into(),
            category_title: "span[class*='maxClassList_max_title__']".into(),
            item: "ul li".into(),
            item_text: "span".into(),
            dismiss: "span[class*='maxClassList_close__']".into(),
            active_class: "maxClassList_active__9kpsY".into(),
            detail_marker: "细分".into(),
            stable_id_attr: "data-rfd-draggable-id".into(),
            type_attr: "datatype".into(),
        }
    }
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            nav_wait_ms: 10_000,
            panel_wait_ms: 5_000,
            panel_settle_ms: 2_000,
            reveal_settle_ms: 2_000,
            load_idle_ms: 15_000,
            capture_settle_ms: 2_000,
            dismiss_settle_ms: 1_000,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, with defaults for absent fields.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_known_endpoints() {
        let cfg = Config::default();
        assert_eq!(cfg.cdp_ports, vec![9222, 9333, 9444, 9555]);
        assert_eq!(cfg.connection_retries, 3);
        assert!(cfg.denylist.contains(&("贴图".into(), "免抠素材".into())));
    }

    #[test]
    fn partial_json_overrides_keep_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{"cdp_ports": [9000], "connection_retries": 1}"#).unwrap();
        assert_eq!(cfg.cdp_ports, vec![9000]);
        assert_eq!(cfg.connection_retries, 1);
        // Untouched fields fall back to defaults.
        assert_eq!(cfg.selectors.detail_marker, "细分");
        assert_eq!(cfg.delays.panel_wait_ms, 5_000);
    }
}
