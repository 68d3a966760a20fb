//! CDP-backed page handle using chromiumoxide.
//!
//! The engine never launches a browser of its own; it attaches to the host
//! application's embedded Chromium through its remote debugging endpoint.

use super::{ElementHandle, PageHandle};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Poll interval for bounded selector waits.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// A page attached over CDP. Keeps the browser connection alive for as long
/// as the handle lives; the handler task drains protocol events in the
/// background.
pub struct CdpPage {
    _browser: Browser,
    page: Page,
}

/// Probe one debug port and attach to its first page.
///
/// The version endpoint is fetched over HTTP to obtain the websocket debugger
/// URL; a failure at either step is reported to the caller, which treats it
/// as one failed candidate in the sweep.
pub async fn connect_port(port: u16, probe_timeout: Duration) -> Result<CdpPage> {
    let client = reqwest::Client::builder()
        .timeout(probe_timeout)
        .build()
        .map_err(|e| Error::Page(e.to_string()))?;

    let version_url = format!("http://127.0.0.1:{port}/json/version");
    let info: VersionInfo = client
        .get(&version_url)
        .send()
        .await
        .map_err(|e| Error::Page(format!("version probe {version_url}: {e}")))?
        .json()
        .await
        .map_err(|e| Error::Page(format!("version probe {version_url}: {e}")))?;

    let (browser, mut handler) = Browser::connect(info.web_socket_debugger_url).await?;

    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            let _ = event;
        }
    });

    let page = match browser.pages().await?.into_iter().next() {
        Some(page) => page,
        None => browser.new_page("about:blank").await?,
    };

    tracing::info!(port, "attached to embedded browser");
    Ok(CdpPage {
        _browser: browser,
        page,
    })
}

#[async_trait]
impl PageHandle for CdpPage {
    async fn query(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>> {
        match self.page.find_element(selector).await {
            Ok(el) => Ok(Some(Box::new(CdpElement { el }))),
            Err(_) => Ok(None),
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
        let els = self.page.find_elements(selector).await.unwrap_or_default();
        Ok(els
            .into_iter()
            .map(|el| Box::new(CdpElement { el }) as Box<dyn ElementHandle>)
            .collect())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<Box<dyn ElementHandle>>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(el) = self.page.find_element(selector).await {
                return Ok(Some(Box::new(CdpElement { el })));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_load_idle(&self, timeout: Duration) -> Result<bool> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => Err(Error::Page(format!("wait for navigation: {e}"))),
            Err(_) => Ok(false),
        }
    }

    async fn press_escape(&self) -> Result<()> {
        for kind in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let params = DispatchKeyEventParams::builder()
                .r#type(kind)
                .key("Escape")
                .code("Escape")
                .windows_virtual_key_code(27)
                .build()
                .map_err(Error::Page)?;
            self.page.execute(params).await?;
        }
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        let bytes = self
            .page
            .screenshot(params)
            .await
            .map_err(|e| Error::Capture(e.to_string()))?;
        Ok(bytes)
    }
}

struct CdpElement {
    el: Element,
}

#[async_trait]
impl ElementHandle for CdpElement {
    async fn text(&self) -> Result<String> {
        let text = self.el.inner_text().await?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.el.attribute(name).await?)
    }

    async fn click(&self) -> Result<()> {
        self.el
            .click()
            .await
            .map_err(|e| Error::Page(format!("click: {e}")))?;
        Ok(())
    }

    async fn query(&self, selector: &str) -> Result<Option<Box<dyn ElementHandle>>> {
        match self.el.find_element(selector).await {
            Ok(el) => Ok(Some(Box::new(CdpElement { el }))),
            Err(_) => Ok(None),
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn ElementHandle>>> {
        let els = self.el.find_elements(selector).await.unwrap_or_default();
        Ok(els
            .into_iter()
            .map(|el| Box::new(CdpElement { el }) as Box<dyn ElementHandle>)
            .collect())
    }
}
