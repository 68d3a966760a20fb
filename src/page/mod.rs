//! Page handle abstraction over the embedded browser.
//!
//! Defines the `PageHandle` and `ElementHandle` traits that abstract over the
//! scriptable document surface. The production implementation attaches over
//! CDP (see [`cdp`]); [`scripted`] provides a deterministic in-memory page
//! for tests and dry runs.

pub mod cdp;
pub mod scripted;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// A live element inside the page. Handles may go stale when the underlying
/// DOM is rewritten; stale operations surface as `Error::Page` and are caught
/// at the enclosing category boundary.
#[async_trait]
pub trait ElementHandle: Send + Sync {
    /// The element's visible text content, trimmed.
    async fn text(&self) -> Result<String>;
    /// An attribute value, or `None` when absent.
    async fn attribute(&self, name: &str) -> Result<Option<String>>;
    /// Simulate a click on this element.
    async fn click(&self) -> Result<()>;
    /// First matching descendant, or `None`.
    async fn query(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>>;
    /// All matching descendants, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>>;
}

/// The scriptable page/document surface the engine borrows for one run.
///
/// All waits are bounded; `wait_for_selector` and `wait_for_load_idle` report
/// a timeout as a non-error outcome so callers can fall through to the next
/// detection strategy.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// First element matching `selector`, or `None`.
    async fn query(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>>;
    /// All elements matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>>;
    /// Poll for `selector` until it matches or `timeout` elapses.
    /// `Ok(None)` means the wait timed out.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<Box<dyn ElementHandle>>>;
    /// Wait for the page's network-activity-settled signal. `Ok(false)` means
    /// the page never settled within `timeout` — informative, not fatal.
    async fn wait_for_load_idle(&self, timeout: Duration) -> Result<bool>;
    /// Send an Escape key press to dismiss any open transient surface.
    async fn press_escape(&self) -> Result<()>;
    /// Capture a full-page screenshot as PNG bytes.
    async fn screenshot(&self) -> Result<Vec<u8>>;
}

/// True when an inline `style` attribute marks the element hidden.
pub fn style_hidden(style: Option<&str>) -> bool {
    style.is_some_and(|s| s.replace(' ', "").contains("display:none"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_hidden_matches_inline_variants() {
        assert!(style_hidden(Some("display: none;")));
        assert!(style_hidden(Some("position:fixed;display:none")));
        assert!(!style_hidden(Some("display: block;")));
        assert!(!style_hidden(None));
    }
}
