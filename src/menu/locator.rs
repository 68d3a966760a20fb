//! Menu locator: enumerate top-level entries and open disclosure panels.
//!
//! The panel's visibility signal is inconsistently exposed — sometimes via
//! DOM presence plus attribute, sometimes via a delayed style mutation — so a
//! single detection strategy is unreliable in isolation. Detection runs an
//! ordered chain, cheapest and most specific first, short-circuiting on the
//! first success.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::TopLevelEntry;
use crate::page::{style_hidden, ElementHandle, PageHandle};
use std::time::Duration;

/// One panel detection strategy, tried in declaration order.
#[derive(Debug, Clone, Copy)]
enum PanelStrategy {
    /// Bounded wait on the canonical panel selector, then a visibility check.
    WaitVisible,
    /// Bounded wait on the style-attribute variant of the same selector.
    WaitStyleVariant,
    /// Fixed settle delay, then scan all matches for a non-hidden one.
    SettleAndScan,
}

const PANEL_STRATEGIES: [PanelStrategy; 3] = [
    PanelStrategy::WaitVisible,
    PanelStrategy::WaitStyleVariant,
    PanelStrategy::SettleAndScan,
];

/// Enumerate the top-level navigation entries.
///
/// When `cfg.entry_order` is non-empty, entries are returned in that
/// canonical order and unlisted entries are dropped; otherwise DOM encounter
/// order is kept. Entries are unique by display text. A missing navigation
/// list yields an empty set, not an error — the run still flushes a
/// best-effort tree.
pub async fn discover_entries(page: &dyn PageHandle, cfg: &Config) -> Result<Vec<TopLevelEntry>> {
    let sel = &cfg.selectors;
    let nav = match page
        .wait_for_selector(&sel.nav_list, Duration::from_millis(cfg.delays.nav_wait_ms))
        .await?
    {
        Some(nav) => nav,
        None => {
            tracing::warn!(selector = %sel.nav_list, "navigation list never appeared");
            return Ok(Vec::new());
        }
    };

    let mut found: Vec<TopLevelEntry> = Vec::new();
    for item in nav.query_all(&sel.nav_item).await? {
        let Some(text_el) = item.query(&sel.nav_text).await? else {
            continue;
        };
        let text = text_el.text().await?;
        if text.is_empty() || found.iter().any(|e| e.text == text) {
            continue;
        }
        let class = item.attribute("class").await?.unwrap_or_default();
        found.push(TopLevelEntry {
            stable_id: item.attribute(&sel.stable_id_attr).await?,
            type_tag: text_el.attribute(&sel.type_attr).await?,
            is_active: class.contains(&sel.active_class),
            text,
            children: Vec::new(),
        });
    }

    if cfg.entry_order.is_empty() {
        tracing::info!(count = found.len(), "discovered entries in DOM order");
        return Ok(found);
    }

    let mut ordered = Vec::new();
    for target in &cfg.entry_order {
        match found.iter().position(|e| &e.text == target) {
            Some(idx) => ordered.push(found.swap_remove(idx)),
            None => tracing::warn!(entry = %target, "canonical entry not present in menu"),
        }
    }
    tracing::info!(count = ordered.len(), "discovered entries in canonical order");
    Ok(ordered)
}

/// Activate a top-level entry and return its visible disclosure panel.
///
/// The entry element is re-located by text on every call; handles are never
/// cached across entries.
pub async fn open_entry(
    page: &dyn PageHandle,
    cfg: &Config,
    entry_text: &str,
) -> Result<Box<dyn ElementHandle>> {
    let sel = &cfg.selectors;
    let nav = page
        .query(&sel.nav_list)
        .await?
        .ok_or_else(|| Error::Page("navigation list disappeared".into()))?;

    let mut clicked = false;
    for item in nav.query_all(&sel.nav_item).await? {
        let Some(text_el) = item.query(&sel.nav_text).await? else {
            continue;
        };
        if text_el.text().await? == entry_text {
            text_el.click().await?;
            clicked = true;
            break;
        }
    }
    if !clicked {
        return Err(Error::Page(format!(
            "entry '{entry_text}' not found in navigation list"
        )));
    }

    for strategy in PANEL_STRATEGIES {
        if let Some(panel) = try_strategy(page, cfg, strategy).await? {
            tracing::debug!(?strategy, entry = %entry_text, "disclosure panel detected");
            return Ok(panel);
        }
        tracing::debug!(?strategy, entry = %entry_text, "strategy missed, falling through");
    }

    Err(Error::LocatorTimeout {
        entry: entry_text.to_string(),
    })
}

async fn try_strategy(
    page: &dyn PageHandle,
    cfg: &Config,
    strategy: PanelStrategy,
) -> Result<Option<Box<dyn ElementHandle>>> {
    let sel = &cfg.selectors;
    let wait = Duration::from_millis(cfg.delays.panel_wait_ms);
    match strategy {
        PanelStrategy::WaitVisible => {
            let Some(panel) = page.wait_for_selector(&sel.panel, wait).await? else {
                return Ok(None);
            };
            let style = panel.attribute("style").await?;
            if style_hidden(style.as_deref()) {
                return Ok(None);
            }
            Ok(Some(panel))
        }
        PanelStrategy::WaitStyleVariant => {
            let variant = visible_variant(&sel.panel);
            page.wait_for_selector(&variant, wait).await
        }
        PanelStrategy::SettleAndScan => {
            tokio::time::sleep(Duration::from_millis(cfg.delays.panel_settle_ms)).await;
            for panel in page.query_all(&sel.panel).await? {
                let style = panel.attribute("style").await?;
                if !style_hidden(style.as_deref()) {
                    return Ok(Some(panel));
                }
            }
            Ok(None)
        }
    }
}

/// The `:not()` style-attribute variant of the panel selector.
pub fn visible_variant(panel_selector: &str) -> String {
    format!("{panel_selector}:not([style*='display: none'])")
}
