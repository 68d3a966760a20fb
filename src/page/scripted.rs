//! Scripted in-memory page handle.
//!
//! A deterministic stand-in for the CDP-backed page: a small node tree whose
//! nodes answer to literal selector strings, with click effects that mutate
//! the tree the way the live menu does (inject a sibling container, rewrite a
//! container in place, or fail outright). Used by the test suite and by dry
//! runs where no embedded browser is available.

use super::{ElementHandle, PageHandle};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub type NodeId = usize;

/// Root node id. The root matches no selector and holds top-level nodes.
pub const ROOT: NodeId = 0;

/// Template for building a node (and its subtree) in the scripted DOM.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    matches: Vec<String>,
    text: String,
    attrs: HashMap<String, String>,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// A node answering to the given literal selector strings.
    pub fn new<S: Into<String>>(matches: impl IntoIterator<Item = S>) -> Self {
        Self {
            matches: matches.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// A scripted mutation applied when a node is clicked.
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// Append a new subtree under an existing node.
    Append { parent: NodeId, spec: NodeSpec },
    /// Replace all children of an existing node; the old subtree goes stale.
    ReplaceChildren { parent: NodeId, specs: Vec<NodeSpec> },
    /// Set an attribute on an existing node.
    SetAttr {
        node: NodeId,
        name: String,
        value: String,
    },
    /// Make the click itself fail.
    Fail(String),
}

#[derive(Debug, Default)]
struct Node {
    matches: Vec<String>,
    text: String,
    attrs: HashMap<String, String>,
    children: Vec<NodeId>,
    on_click: Vec<ClickEffect>,
    detached: bool,
}

#[derive(Default)]
struct Dom {
    nodes: Vec<Node>,
    log: Vec<String>,
    load_idle: bool,
    screenshot_fails: bool,
}

impl Dom {
    fn instantiate(&mut self, parent: NodeId, spec: &NodeSpec) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            matches: spec.matches.clone(),
            text: spec.text.clone(),
            attrs: spec.attrs.clone(),
            ..Default::default()
        });
        self.nodes[parent].children.push(id);
        for child in &spec.children {
            self.instantiate(id, child);
        }
        id
    }

    fn detach_subtree(&mut self, id: NodeId) {
        self.nodes[id].detached = true;
        let children = self.nodes[id].children.clone();
        for child in children {
            self.detach_subtree(child);
        }
    }

    /// Descendants of `id` matching `selector`, in pre-order.
    fn select(&self, id: NodeId, selector: &str, out: &mut Vec<NodeId>) {
        for &child in &self.nodes[id].children {
            if self.nodes[child].matches.iter().any(|m| m == selector) {
                out.push(child);
            }
            self.select(child, selector, out);
        }
    }

    fn apply(&mut self, effect: &ClickEffect) -> Result<()> {
        match effect {
            ClickEffect::Append { parent, spec } => {
                self.instantiate(*parent, spec);
            }
            ClickEffect::ReplaceChildren { parent, specs } => {
                let old = std::mem::take(&mut self.nodes[*parent].children);
                for id in old {
                    self.detach_subtree(id);
                }
                for spec in specs {
                    self.instantiate(*parent, spec);
                }
            }
            ClickEffect::SetAttr { node, name, value } => {
                self.nodes[*node].attrs.insert(name.clone(), value.clone());
            }
            ClickEffect::Fail(msg) => return Err(Error::Page(msg.clone())),
        }
        Ok(())
    }
}

/// Shared handle to a scripted DOM. Cloning shares the same tree.
#[derive(Clone)]
pub struct ScriptedPage {
    dom: Arc<Mutex<Dom>>,
}

impl Default for ScriptedPage {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedPage {
    pub fn new() -> Self {
        let mut dom = Dom {
            load_idle: true,
            ..Default::default()
        };
        dom.nodes.push(Node::default()); // ROOT
        Self {
            dom: Arc::new(Mutex::new(dom)),
        }
    }

    fn dom(&self) -> MutexGuard<'_, Dom> {
        self.dom.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Build a subtree under `parent` and return the new node's id.
    pub fn add(&self, parent: NodeId, spec: NodeSpec) -> NodeId {
        self.dom().instantiate(parent, &spec)
    }

    /// Attach click effects to an existing node.
    pub fn on_click(&self, node: NodeId, effects: Vec<ClickEffect>) {
        self.dom().nodes[node].on_click = effects;
    }

    /// Whether `wait_for_load_idle` reports a settled page.
    pub fn set_load_idle(&self, settled: bool) {
        self.dom().load_idle = settled;
    }

    /// Make subsequent screenshot captures fail.
    pub fn set_screenshot_fails(&self, fails: bool) {
        self.dom().screenshot_fails = fails;
    }

    /// The recorded call log, for asserting strategy order and short-circuit.
    pub fn log(&self) -> Vec<String> {
        self.dom().log.clone()
    }

    /// An element handle for a known node id.
    pub fn handle(&self, id: NodeId) -> Box<dyn ElementHandle> {
        self.element(id)
    }

    /// First descendant of `parent` matching `selector`, by id.
    pub fn find(&self, parent: NodeId, selector: &str) -> Option<NodeId> {
        self.find_all(parent, selector).first().copied()
    }

    /// All descendants of `parent` matching `selector`, by id, in pre-order.
    pub fn find_all(&self, parent: NodeId, selector: &str) -> Vec<NodeId> {
        let dom = self.dom();
        let mut out = Vec::new();
        dom.select(parent, selector, &mut out);
        out
    }

    fn element(&self, id: NodeId) -> Box<dyn ElementHandle> {
        Box::new(ScriptedElement {
            dom: Arc::clone(&self.dom),
            id,
        })
    }
}

#[async_trait]
impl PageHandle for ScriptedPage {
    async fn query(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>> {
        let id = {
            let mut dom = self.dom();
            dom.log.push(format!("query:{selector}"));
            let mut out = Vec::new();
            dom.select(ROOT, selector, &mut out);
            out.first().copied()
        };
        Ok(id.map(|id| self.element(id)))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
        let ids = {
            let mut dom = self.dom();
            dom.log.push(format!("query_all:{selector}"));
            let mut out = Vec::new();
            dom.select(ROOT, selector, &mut out);
            out
        };
        Ok(ids.into_iter().map(|id| self.element(id)).collect())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
    ) -> Result<Option<Box<dyn ElementHandle>>> {
        let id = {
            let mut dom = self.dom();
            dom.log.push(format!("wait_for_selector:{selector}"));
            let mut out = Vec::new();
            dom.select(ROOT, selector, &mut out);
            out.first().copied()
        };
        Ok(id.map(|id| self.element(id)))
    }

    async fn wait_for_load_idle(&self, _timeout: Duration) -> Result<bool> {
        let mut dom = self.dom();
        dom.log.push("wait_for_load_idle".into());
        Ok(dom.load_idle)
    }

    async fn press_escape(&self) -> Result<()> {
        self.dom().log.push("escape".into());
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let mut dom = self.dom();
        dom.log.push("screenshot".into());
        if dom.screenshot_fails {
            return Err(Error::Capture("scripted capture failure".into()));
        }
        Ok(b"\x89PNG scripted".to_vec())
    }
}

struct ScriptedElement {
    dom: Arc<Mutex<Dom>>,
    id: NodeId,
}

impl ScriptedElement {
    fn dom(&self) -> MutexGuard<'_, Dom> {
        self.dom.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn ensure_attached(dom: &Dom, id: NodeId) -> Result<()> {
        if dom.nodes[id].detached {
            return Err(Error::Page("stale element".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ElementHandle for ScriptedElement {
    async fn text(&self) -> Result<String> {
        let dom = self.dom();
        Self::ensure_attached(&dom, self.id)?;
        Ok(dom.nodes[self.id].text.trim().to_string())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        let dom = self.dom();
        Self::ensure_attached(&dom, self.id)?;
        Ok(dom.nodes[self.id].attrs.get(name).cloned())
    }

    async fn click(&self) -> Result<()> {
        let mut dom = self.dom();
        Self::ensure_attached(&dom, self.id)?;
        let entry = format!("click:{}", dom.nodes[self.id].text);
        dom.log.push(entry);
        let effects = dom.nodes[self.id].on_click.clone();
        for effect in &effects {
            dom.apply(effect)?;
        }
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>> {
        let dom = self.dom();
        Self::ensure_attached(&dom, self.id)?;
        let mut out = Vec::new();
        dom.select(self.id, selector, &mut out);
        Ok(out.first().map(|&id| {
            Box::new(ScriptedElement {
                dom: Arc::clone(&self.dom),
                id,
            }) as Box<dyn ElementHandle>
        }))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
        let dom = self.dom();
        Self::ensure_attached(&dom, self.id)?;
        let mut out = Vec::new();
        dom.select(self.id, selector, &mut out);
        Ok(out
            .into_iter()
            .map(|id| {
                Box::new(ScriptedElement {
                    dom: Arc::clone(&self.dom),
                    id,
                }) as Box<dyn ElementHandle>
            })
            .collect())
    }
}
