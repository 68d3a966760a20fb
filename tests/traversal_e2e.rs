//! Full traversal runs against a scripted menu.

use navatlas::capture::FsArtifactWriter;
use navatlas::config::Config;
use navatlas::page::scripted::{ClickEffect, NodeId, NodeSpec, ROOT, ScriptedPage};
use navatlas::traverse::Traversal;

fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.selectors.nav_list = "nav".into();
    cfg.selectors.nav_item = "li".into();
    cfg.selectors.nav_text = "p".into();
    cfg.selectors.panel = "panel".into();
    cfg.selectors.category_container = "container".into();
    cfg.selectors.category_title = "title".into();
    cfg.selectors.item = "item".into();
    cfg.selectors.item_text = "span".into();
    cfg.selectors.dismiss = "close".into();
    cfg.entry_order = Vec::new();
    cfg.denylist = Vec::new();
    cfg.initial_screenshot = false;
    cfg.delays.nav_wait_ms = 10;
    cfg.delays.panel_wait_ms = 10;
    cfg.delays.panel_settle_ms = 1;
    cfg.delays.reveal_settle_ms = 1;
    cfg.delays.load_idle_ms = 5;
    cfg.delays.capture_settle_ms = 1;
    cfg.delays.dismiss_settle_ms = 1;
    cfg
}

fn container_spec(title: &str, items: &[&str]) -> NodeSpec {
    let mut list = NodeSpec::new(["list"]);
    for text in items {
        list = list.child(NodeSpec::new(["item"]).child(NodeSpec::new(["span"]).text(*text)));
    }
    NodeSpec::new(["container"])
        .child(NodeSpec::new(["title", "span"]).text(title))
        .child(list)
}

/// Nav with the given entries, plus an initially-empty visible panel.
/// Returns the panel id and the entry text-node ids.
fn menu_skeleton(page: &ScriptedPage, entries: &[&str]) -> (NodeId, Vec<NodeId>) {
    let nav = page.add(ROOT, NodeSpec::new(["nav"]));
    let mut text_ids = Vec::new();
    for text in entries {
        let li = page.add(nav, NodeSpec::new(["li"]));
        text_ids.push(page.add(li, NodeSpec::new(["p"]).text(*text)));
    }
    let panel = page.add(ROOT, NodeSpec::new(["panel"]));
    (panel, text_ids)
}

#[tokio::test]
async fn end_to_end_scenario_visits_exactly_the_expected_paths() {
    let page = ScriptedPage::new();
    let (panel, entry_texts) = menu_skeleton(&page, &["A", "B"]);

    // Entry A shows category X; entry B replaces the panel content with Y.
    let x = page.add(panel, container_spec("X", &["全部", "沙发"]));
    page.on_click(
        entry_texts[1],
        vec![ClickEffect::ReplaceChildren {
            parent: panel,
            specs: vec![container_spec("Y", &["全部"])],
        }],
    );
    // Clicking X's "沙发" injects a detail container with two items.
    let sofa_item = page.find_all(x, "item")[1];
    page.on_click(
        sofa_item,
        vec![ClickEffect::Append {
            parent: panel,
            spec: container_spec("细分：沙发", &["单人", "双人"]),
        }],
    );

    let cfg = test_config();
    let dir = tempfile::tempdir().unwrap();
    let writer = FsArtifactWriter::new(dir.path());
    let output = Traversal::new(&page, &writer, &cfg).run().await;

    let paths: Vec<(String, Option<String>)> = output
        .results
        .iter()
        .map(|r| {
            (
                format!("{}/{}/{}", r.path.entry, r.path.category, r.path.first_level),
                r.path.second_level.clone(),
            )
        })
        .collect();
    assert_eq!(
        paths,
        vec![
            ("A/X/全部".to_string(), None),
            ("A/X/沙发".to_string(), Some("单人".to_string())),
            ("A/X/沙发".to_string(), Some("双人".to_string())),
            ("B/Y/全部".to_string(), None),
        ]
    );
    assert!(output.results.iter().all(|r| r.ok));

    // Artifacts land at the deterministic verbatim paths.
    assert!(dir.path().join("A_X_全部.png").exists());
    assert!(dir.path().join("A_X_沙发_单人.png").exists());
    assert!(dir.path().join("A_X_沙发_双人.png").exists());
    assert!(dir.path().join("B_Y_全部.png").exists());

    // The tree mirrors what was discovered and revealed.
    assert_eq!(output.tree.entries.len(), 2);
    let a = &output.tree.entries[0];
    assert_eq!(a.children[0].title, "X");
    assert_eq!(a.children[0].first_level.len(), 2);
    let second: Vec<_> = a.children[0]
        .second_level
        .iter()
        .map(|i| i.text.as_str())
        .collect();
    assert_eq!(second, ["单人", "双人"]);
    assert!(output.tree.entries[1].children[0].second_level.is_empty());

    // The panel is dismissed between entries.
    let escapes = page.log().iter().filter(|l| *l == "escape").count();
    assert_eq!(escapes, 2);
}

#[tokio::test]
async fn denylisted_category_is_never_visited() {
    let page = ScriptedPage::new();
    let (panel, _) = menu_skeleton(&page, &["贴图"]);
    page.add(panel, container_spec("免抠素材", &["全部", "人物"]));
    page.add(panel, container_spec("材质", &["全部"]));

    let mut cfg = test_config();
    cfg.denylist = vec![("贴图".into(), "免抠素材".into())];
    let dir = tempfile::tempdir().unwrap();
    let writer = FsArtifactWriter::new(dir.path());
    let output = Traversal::new(&page, &writer, &cfg).run().await;

    assert!(output
        .results
        .iter()
        .all(|r| r.path.category != "免抠素材"));
    // The sibling category is still traversed.
    assert_eq!(output.results.len(), 1);
    assert_eq!(output.results[0].path.category, "材质");
    // The denied category never reaches the tree either.
    let titles: Vec<_> = output.tree.entries[0]
        .children
        .iter()
        .map(|c| c.title.as_str())
        .collect();
    assert_eq!(titles, ["材质"]);
    // One entry click plus reveal+visit on the single allowed leaf; nothing
    // under the denied category was ever activated.
    let clicks = page.log().iter().filter(|l| l.starts_with("click:")).count();
    assert_eq!(clicks, 3);
}

#[tokio::test]
async fn one_failing_leaf_does_not_stop_the_run() {
    let page = ScriptedPage::new();
    let (panel, _) = menu_skeleton(&page, &["A"]);
    let x = page.add(panel, container_spec("X", &["全部", "坏", "好"]));
    page.add(panel, container_spec("Z", &["全部"]));
    let broken = page.find_all(x, "item")[1];
    page.on_click(broken, vec![ClickEffect::Fail("activation raised".into())]);

    let cfg = test_config();
    let dir = tempfile::tempdir().unwrap();
    let writer = FsArtifactWriter::new(dir.path());
    let output = Traversal::new(&page, &writer, &cfg).run().await;

    // Every discovered leaf has a result; exactly one is marked failed.
    assert_eq!(output.results.len(), 4);
    let failed: Vec<_> = output.results.iter().filter(|r| !r.ok).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].path.first_level, "坏");
    assert!(failed[0].error.as_deref().is_some_and(|e| e.contains("activation raised")));

    // Later leaves in the same category and later categories still ran.
    assert!(output
        .results
        .iter()
        .any(|r| r.ok && r.path.first_level == "好"));
    assert!(output.results.iter().any(|r| r.path.category == "Z"));
}

#[tokio::test]
async fn locator_timeout_skips_only_that_entry() {
    let page = ScriptedPage::new();
    let nav = page.add(ROOT, NodeSpec::new(["nav"]));
    for text in ["幽灵", "B"] {
        let li = page.add(nav, NodeSpec::new(["li"]));
        page.add(li, NodeSpec::new(["p"]).text(text));
    }
    // The panel only exists once entry B is activated.
    let b_text = page.find_all(ROOT, "p")[1];
    page.on_click(
        b_text,
        vec![ClickEffect::Append {
            parent: ROOT,
            spec: NodeSpec::new(["panel"]).child(container_spec("Y", &["全部"])),
        }],
    );

    let cfg = test_config();
    let dir = tempfile::tempdir().unwrap();
    let writer = FsArtifactWriter::new(dir.path());
    let output = Traversal::new(&page, &writer, &cfg).run().await;

    // The first entry closed without results; the second ran normally.
    assert_eq!(output.tree.entries.len(), 2);
    assert!(output.tree.entries[0].children.is_empty());
    assert_eq!(output.results.len(), 1);
    assert_eq!(output.results[0].path.entry, "B");
}
