//! Tree discoverer: enumerate categories and reveal second-level items.
//!
//! The menu reuses one structural container class at every depth; a "detail"
//! sub-panel is indistinguishable from a sibling category except by its title
//! text. Classification is therefore a pure function of the extracted title,
//! applied fresh at every discovery step and never cached across categories.

use crate::config::Config;
use crate::error::Result;
use crate::model::{MenuItem, PanelKind};
use crate::page::{ElementHandle, PageHandle};
use std::time::Duration;

/// Classify a container's resolved title. Pure and idempotent: the verdict
/// depends on nothing but the two strings.
pub fn classify_title(title: &str, detail_marker: &str) -> PanelKind {
    if title.contains(detail_marker) {
        PanelKind::Detail
    } else {
        PanelKind::Category
    }
}

/// A menu item together with its live element.
pub struct DiscoveredItem {
    pub data: MenuItem,
    pub el: Box<dyn ElementHandle>,
}

/// A first-level category, its container element, and its items.
pub struct DiscoveredCategory {
    pub title: String,
    pub container: Box<dyn ElementHandle>,
    pub items: Vec<DiscoveredItem>,
}

/// Ordered title-extraction fallback chain.
#[derive(Debug, Clone, Copy)]
enum TitleSource {
    /// The dedicated title-class selector.
    TitleClass,
    /// The first text element inside the container.
    FirstText,
    /// First non-empty, non-detail text among all descendants.
    ScanDescendants,
}

const TITLE_SOURCES: [TitleSource; 3] = [
    TitleSource::TitleClass,
    TitleSource::FirstText,
    TitleSource::ScanDescendants,
];

/// Resolve a container's title through the fallback chain.
pub async fn extract_title(
    container: &dyn ElementHandle,
    cfg: &Config,
) -> Result<Option<String>> {
    let sel = &cfg.selectors;
    for source in TITLE_SOURCES {
        let title = match source {
            TitleSource::TitleClass => match container.query(&sel.category_title).await? {
                Some(el) => el.text().await?,
                None => continue,
            },
            TitleSource::FirstText => match container.query(&sel.item_text).await? {
                Some(el) => el.text().await?,
                None => continue,
            },
            TitleSource::ScanDescendants => {
                let mut found = String::new();
                for el in container.query_all(&sel.item_text).await? {
                    let text = el.text().await?;
                    if !text.is_empty()
                        && classify_title(&text, &sel.detail_marker) == PanelKind::Category
                    {
                        found = text;
                        break;
                    }
                }
                found
            }
        };
        if !title.is_empty() {
            return Ok(Some(title));
        }
    }
    Ok(None)
}

/// Enumerate the first-level categories inside an open disclosure panel.
///
/// Containers whose resolved title classifies as detail are not new
/// categories — they are orphaned detail panels belonging to a category not
/// yet associated, and are ignored at this level.
pub async fn discover_categories(
    panel: &dyn ElementHandle,
    cfg: &Config,
) -> Result<Vec<DiscoveredCategory>> {
    let sel = &cfg.selectors;
    let mut categories = Vec::new();
    for (idx, container) in panel
        .query_all(&sel.category_container)
        .await?
        .into_iter()
        .enumerate()
    {
        let Some(title) = extract_title(container.as_ref(), cfg).await? else {
            tracing::warn!(container = idx, "container has no resolvable title");
            continue;
        };
        match classify_title(&title, &sel.detail_marker) {
            PanelKind::Detail => {
                tracing::debug!(%title, "skipping detail container at category level");
                continue;
            }
            PanelKind::Category => {}
        }
        let items = collect_items(container.as_ref(), cfg).await?;
        tracing::debug!(%title, items = items.len(), "discovered category");
        categories.push(DiscoveredCategory {
            title,
            container,
            items,
        });
    }
    Ok(categories)
}

/// Collect the menu items directly inside a container.
pub async fn collect_items(
    container: &dyn ElementHandle,
    cfg: &Config,
) -> Result<Vec<DiscoveredItem>> {
    let sel = &cfg.selectors;
    let mut items = Vec::new();
    for el in container.query_all(&sel.item).await? {
        let Some(text_el) = el.query(&sel.item_text).await? else {
            continue;
        };
        let text = text_el.text().await?;
        if text.is_empty() {
            continue;
        }
        let class = el.attribute("class").await?.unwrap_or_default();
        let has_dismiss = el.query(&sel.dismiss).await?.is_some();
        items.push(DiscoveredItem {
            data: MenuItem {
                text,
                is_active: class.contains(&sel.active_class),
                has_dismiss_affordance: has_dismiss,
            },
            el,
        });
    }
    Ok(items)
}

/// Activate a first-level item and return the second-level items it reveals.
///
/// The UI sometimes injects a sibling detail container and sometimes rewrites
/// the acting container in place; the two cannot be distinguished ahead of
/// time, so both paths are tried in order:
///
/// 1. Count containers page-wide, click, settle, recount. When new containers
///    appeared, scan the ones past the old count for a detail-titled one and
///    take its items.
/// 2. Otherwise re-scan the acting container. When its item texts differ from
///    what discovery recorded, the content was rewritten in place: everything
///    past the leading "show all" item is a revealed detail item. Unchanged
///    content means nothing was revealed — a leaf-only item, not an error.
///
/// The count heuristic is racy when unrelated DOM mutations land between the
/// two counts; a false positive can select an unrelated new container. Known
/// limitation, inherited from the menu's rendering behavior.
pub async fn reveal(
    page: &dyn PageHandle,
    item: &DiscoveredItem,
    category: &DiscoveredCategory,
    cfg: &Config,
) -> Result<Vec<DiscoveredItem>> {
    let sel = &cfg.selectors;
    let before = page.query_all(&sel.category_container).await?.len();

    item.el.click().await?;
    tokio::time::sleep(Duration::from_millis(cfg.delays.reveal_settle_ms)).await;

    let after = page.query_all(&sel.category_container).await?;
    tracing::debug!(
        category = %category.title,
        item = %item.data.text,
        before,
        after = after.len(),
        "container recount after activation"
    );

    if after.len() > before {
        for container in &after[before..] {
            let Some(title) = extract_title(container.as_ref(), cfg).await? else {
                continue;
            };
            if classify_title(&title, &sel.detail_marker) == PanelKind::Detail {
                let items = collect_items(container.as_ref(), cfg).await?;
                tracing::debug!(%title, items = items.len(), "detail container revealed");
                return Ok(items);
            }
        }
        tracing::debug!("new containers appeared but none is detail-titled");
    }

    // In-place path: the panel may have rewritten the acting container.
    let fresh = collect_items(category.container.as_ref(), cfg).await?;
    let fresh_texts: Vec<&str> = fresh.iter().map(|i| i.data.text.as_str()).collect();
    let known_texts: Vec<&str> = category.items.iter().map(|i| i.data.text.as_str()).collect();
    if fresh_texts == known_texts {
        tracing::debug!(item = %item.data.text, "no reveal — leaf-only item");
        return Ok(Vec::new());
    }
    Ok(fresh.into_iter().skip(1).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::scripted::{ClickEffect, NodeId, NodeSpec, ROOT, ScriptedPage};

    fn test_config() -> Config {
        let mut cfg = Config::default();
        cfg.selectors.category_container = "container".into();
        cfg.selectors.category_title = "title".into();
        cfg.selectors.item = "item".into();
        cfg.selectors.item_text = "span".into();
        cfg.selectors.dismiss = "close".into();
        cfg.delays.reveal_settle_ms = 1;
        cfg
    }

    /// Container spec: a title span, then a list node holding items.
    fn container_spec(title: &str, items: &[&str]) -> NodeSpec {
        let mut list = NodeSpec::new(["list"]);
        for text in items {
            list = list.child(NodeSpec::new(["item"]).child(NodeSpec::new(["span"]).text(*text)));
        }
        NodeSpec::new(["container"])
            .child(NodeSpec::new(["title", "span"]).text(title))
            .child(list)
    }

    async fn category_of(
        page: &ScriptedPage,
        panel: NodeId,
        cfg: &Config,
        title: &str,
    ) -> DiscoveredCategory {
        let panel_el = page.handle(panel);
        discover_categories(panel_el.as_ref(), cfg)
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.title == title)
            .expect("category not discovered")
    }

    #[test]
    fn classification_is_pure_and_idempotent() {
        for _ in 0..3 {
            assert_eq!(classify_title("细分：沙发", "细分"), PanelKind::Detail);
            assert_eq!(classify_title("沙发", "细分"), PanelKind::Category);
            assert_eq!(classify_title("", "细分"), PanelKind::Category);
        }
    }

    #[tokio::test]
    async fn detail_titled_containers_are_not_categories() {
        let page = ScriptedPage::new();
        let panel = page.add(ROOT, NodeSpec::new(["panel"]));
        page.add(panel, container_spec("沙发", &["全部"]));
        page.add(panel, container_spec("细分：A", &["单人"]));
        let cfg = test_config();

        let panel_el = page.handle(panel);
        let cats = discover_categories(panel_el.as_ref(), &cfg).await.unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].title, "沙发");
        assert_eq!(cats[0].items.len(), 1);
    }

    #[tokio::test]
    async fn title_falls_back_to_first_text_element() {
        let page = ScriptedPage::new();
        let panel = page.add(ROOT, NodeSpec::new(["panel"]));
        // No title-class node at all; the first span carries the name.
        page.add(
            panel,
            NodeSpec::new(["container"])
                .child(NodeSpec::new(["span"]).text("材质"))
                .child(NodeSpec::new(["item"]).child(NodeSpec::new(["span"]).text("全部"))),
        );
        let cfg = test_config();

        let panel_el = page.handle(panel);
        let cats = discover_categories(panel_el.as_ref(), &cfg).await.unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].title, "材质");
    }

    #[tokio::test]
    async fn title_scan_skips_empty_and_detail_text() {
        let page = ScriptedPage::new();
        let panel = page.add(ROOT, NodeSpec::new(["panel"]));
        // No title-class node and an empty first span, so the first two
        // sources yield nothing; the descendant scan must pass over the
        // detail-marked span and settle on the first plain text.
        page.add(
            panel,
            NodeSpec::new(["container"])
                .child(NodeSpec::new(["span"]))
                .child(NodeSpec::new(["span"]).text("细分：旧"))
                .child(NodeSpec::new(["span"]).text("CAD"))
                .child(NodeSpec::new(["item"]).child(NodeSpec::new(["span"]).text("全部"))),
        );
        let cfg = test_config();

        let panel_el = page.handle(panel);
        let cats = discover_categories(panel_el.as_ref(), &cfg).await.unwrap();
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].title, "CAD");
    }

    #[tokio::test]
    async fn item_flags_come_from_markup() {
        let page = ScriptedPage::new();
        let panel = page.add(ROOT, NodeSpec::new(["panel"]));
        let mut cfg = test_config();
        cfg.selectors.active_class = "active".into();
        page.add(
            panel,
            NodeSpec::new(["container"])
                .child(NodeSpec::new(["title", "span"]).text("灯光"))
                .child(
                    NodeSpec::new(["item"])
                        .attr("class", "item active")
                        .child(NodeSpec::new(["span"]).text("全部"))
                        .child(NodeSpec::new(["close"])),
                ),
        );

        let cat = category_of(&page, panel, &cfg, "灯光").await;
        assert!(cat.items[0].data.is_active);
        assert!(cat.items[0].data.has_dismiss_affordance);
    }

    #[tokio::test]
    async fn reveal_takes_items_from_new_detail_container() {
        let page = ScriptedPage::new();
        let panel = page.add(ROOT, NodeSpec::new(["panel"]));
        let sofa = page.add(panel, container_spec("沙发", &["全部", "沙发"]));
        page.add(panel, container_spec("椅凳", &["全部"]));
        page.add(panel, container_spec("柜类", &["全部"]));
        let cfg = test_config();

        let cat = category_of(&page, panel, &cfg, "沙发").await;
        // Clicking item "沙发" injects a fourth, detail-titled sibling
        // container: 3 before, 4 after.
        let trigger_id = page.find_all(sofa, "item")[1];
        page.on_click(
            trigger_id,
            vec![ClickEffect::Append {
                parent: panel,
                spec: container_spec("细分：沙发", &["单人", "双人"]),
            }],
        );

        let revealed = reveal(&page, &cat.items[1], &cat, &cfg).await.unwrap();
        let texts: Vec<_> = revealed.iter().map(|i| i.data.text.as_str()).collect();
        assert_eq!(texts, ["单人", "双人"]);
    }

    #[tokio::test]
    async fn reveal_falls_back_to_in_place_rescan() {
        let page = ScriptedPage::new();
        let panel = page.add(ROOT, NodeSpec::new(["panel"]));
        let sofa = page.add(panel, container_spec("沙发", &["全部", "沙发"]));
        page.add(panel, container_spec("椅凳", &["全部"]));
        page.add(panel, container_spec("柜类", &["全部"]));
        let cfg = test_config();

        let cat = category_of(&page, panel, &cfg, "沙发").await;
        // Clicking rewrites the acting container in place: same container
        // count (3 before, 3 after), different items.
        let list = page.find(sofa, "list").unwrap();
        let trigger_id = page.find_all(sofa, "item")[1];
        page.on_click(
            trigger_id,
            vec![ClickEffect::ReplaceChildren {
                parent: list,
                specs: vec![
                    NodeSpec::new(["item"]).child(NodeSpec::new(["span"]).text("全部")),
                    NodeSpec::new(["item"]).child(NodeSpec::new(["span"]).text("单人床")),
                    NodeSpec::new(["item"]).child(NodeSpec::new(["span"]).text("双人床")),
                ],
            }],
        );

        let revealed = reveal(&page, &cat.items[1], &cat, &cfg).await.unwrap();
        let texts: Vec<_> = revealed.iter().map(|i| i.data.text.as_str()).collect();
        // Everything past the leading "show all" item.
        assert_eq!(texts, ["单人床", "双人床"]);
    }

    #[tokio::test]
    async fn unchanged_container_means_leaf_only() {
        let page = ScriptedPage::new();
        let panel = page.add(ROOT, NodeSpec::new(["panel"]));
        page.add(panel, container_spec("材质", &["全部", "木纹"]));
        let cfg = test_config();

        let cat = category_of(&page, panel, &cfg, "材质").await;
        let revealed = reveal(&page, &cat.items[0], &cat, &cfg).await.unwrap();
        assert!(revealed.is_empty());
    }
}
