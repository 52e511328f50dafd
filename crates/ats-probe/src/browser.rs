//! Chromium over CDP.
//!
//! [`ChromiumDriver`] implements [`BrowserDriver`] with chromiumoxide. Remote
//! elements are kept in a registry keyed by the handle id given out to callers;
//! handles from one driver mean nothing to another.

use crate::driver::{BrowserDriver, DriverConfig, ElementHandle, SessionLauncher};
use crate::query::{ElementQuery, SelectorKind};
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const IS_DISPLAYED_FN: &str = "function () { var r = this.getBoundingClientRect(); var s = window.getComputedStyle(this); return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; }";
const IS_ENABLED_FN: &str = "function () { return !this.disabled; }";
const VALUE_FN: &str = "function () { return this.value === undefined || this.value === null ? '' : String(this.value); }";
const CLEAR_FN: &str = "function () { if ('value' in this) { this.value = ''; } else { this.textContent = ''; } this.dispatchEvent(new Event('input', { bubbles: true })); this.dispatchEvent(new Event('change', { bubbles: true })); return true; }";
const SCRIPT_CLICK_FN: &str = "function () { this.click(); return true; }";
const TAG_NAME_FN: &str = "function () { return this.tagName ? this.tagName.toLowerCase() : ''; }";
const MARK_PARENT_FN: &str = "function () { var p = this.parentElement; if (!p) { return null; } var id = 'ats-' + Date.now().toString(36) + Math.random().toString(36).slice(2); p.setAttribute('data-ats-ref', id); return id; }";

fn cdp_error(e: impl fmt::Display) -> ProbeError {
    ProbeError::driver(e.to_string())
}

/// Browser driver backed by a real Chromium
pub struct ChromiumDriver {
    browser: CdpBrowser,
    page: CdpPage,
    handler: tokio::task::JoinHandle<()>,
    elements: Mutex<HashMap<String, Arc<Element>>>,
    next_id: AtomicU64,
    navigation_timeout: Duration,
}

impl fmt::Debug for ChromiumDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChromiumDriver")
            .field("navigation_timeout", &self.navigation_timeout)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank page
    pub async fn launch(config: &DriverConfig) -> ProbeResult<Self> {
        let mut builder = CdpConfig::builder()
            .window_size(config.window_width, config.window_height)
            .args(config.launch_args())
            .request_timeout(config.navigation_timeout);

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = config.executable_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(|message| ProbeError::BrowserLaunch { message })?;
        let (browser, mut handler) = CdpBrowser::launch(cdp_config)
            .await
            .map_err(|e| ProbeError::BrowserLaunch { message: e.to_string() })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ProbeError::BrowserLaunch { message: e.to_string() })?;

        Ok(Self {
            browser,
            page,
            handler,
            elements: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            navigation_timeout: config.navigation_timeout,
        })
    }

    async fn register(&self, element: Element) -> ProbeResult<ElementHandle> {
        let tag = element
            .call_js_fn(TAG_NAME_FN, false)
            .await
            .ok()
            .and_then(|r| r.result.value)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let id = format!("e{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let _ = self.elements.lock().await.insert(id.clone(), Arc::new(element));
        Ok(ElementHandle::new(id, tag))
    }

    async fn register_all(&self, found: Vec<Element>) -> ProbeResult<Vec<ElementHandle>> {
        let mut handles = Vec::with_capacity(found.len());
        for element in found {
            handles.push(self.register(element).await?);
        }
        Ok(handles)
    }

    async fn element(&self, handle: &ElementHandle) -> ProbeResult<Arc<Element>> {
        self.elements
            .lock()
            .await
            .get(&handle.id)
            .cloned()
            .ok_or_else(|| ProbeError::driver(format!("stale element reference: {}", handle.id)))
    }

    async fn call(&self, handle: &ElementHandle, function: &str) -> ProbeResult<serde_json::Value> {
        let element = self.element(handle).await?;
        let returns = element.call_js_fn(function, false).await.map_err(cdp_error)?;
        Ok(returns.result.value.unwrap_or(serde_json::Value::Null))
    }

    async fn forget_elements(&self) {
        self.elements.lock().await.clear();
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        self.forget_elements().await;
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(cdp_error(e)),
            Err(_) => Err(ProbeError::driver(format!(
                "navigation to {url} timed out after {}s",
                self.navigation_timeout.as_secs()
            ))),
        }
    }

    async fn current_url(&self) -> ProbeResult<String> {
        Ok(self.page.url().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn title(&self) -> ProbeResult<String> {
        Ok(self.page.get_title().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn reload(&self) -> ProbeResult<()> {
        self.forget_elements().await;
        let _ = self.page.reload().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn go_back(&self) -> ProbeResult<()> {
        self.forget_elements().await;
        let _ = self.execute_script("history.back(); true").await?;
        Ok(())
    }

    async fn go_forward(&self) -> ProbeResult<()> {
        self.forget_elements().await;
        let _ = self.execute_script("history.forward(); true").await?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> ProbeResult<serde_json::Value> {
        let result = self.page.evaluate(script).await.map_err(cdp_error)?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn find_all(&self, query: &ElementQuery) -> ProbeResult<Vec<ElementHandle>> {
        let found = match query.kind() {
            SelectorKind::XPath => self.page.find_xpaths(query.selector()).await,
            SelectorKind::Id | SelectorKind::Css => {
                let css = query.to_css().unwrap_or_default();
                self.page.find_elements(css).await
            }
        };
        // CDP reports "no node found" as an error; treat it as an empty result.
        match found {
            Ok(elements) => self.register_all(elements).await,
            Err(e) if e.to_string().contains("Could not find node") => Ok(Vec::new()),
            Err(e) => Err(cdp_error(e)),
        }
    }

    async fn find_within(&self, parent: &ElementHandle, query: &ElementQuery) -> ProbeResult<Vec<ElementHandle>> {
        let Some(css) = query.to_css() else {
            return Err(ProbeError::driver(format!("scoped XPath lookups are not supported: {query}")));
        };
        let parent = self.element(parent).await?;
        match parent.find_elements(css).await {
            Ok(elements) => self.register_all(elements).await,
            Err(e) if e.to_string().contains("Could not find node") => Ok(Vec::new()),
            Err(e) => Err(cdp_error(e)),
        }
    }

    async fn parent_of(&self, element: &ElementHandle) -> ProbeResult<Option<ElementHandle>> {
        let marker = match self.call(element, MARK_PARENT_FN).await? {
            serde_json::Value::String(marker) => marker,
            _ => return Ok(None),
        };
        let parent = self
            .page
            .find_element(format!("[data-ats-ref=\"{marker}\"]"))
            .await
            .map_err(cdp_error)?;
        self.register(parent).await.map(Some)
    }

    async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.call(element, IS_DISPLAYED_FN).await?.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.call(element, IS_ENABLED_FN).await?.as_bool().unwrap_or(true))
    }

    async fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        let element = self.element(element).await?;
        Ok(element.inner_text().await.map_err(cdp_error)?.unwrap_or_default())
    }

    async fn attribute(&self, element: &ElementHandle, name: &str) -> ProbeResult<Option<String>> {
        let element = self.element(element).await?;
        element.attribute(name).await.map_err(cdp_error)
    }

    async fn value(&self, element: &ElementHandle) -> ProbeResult<String> {
        Ok(self
            .call(element, VALUE_FN)
            .await?
            .as_str()
            .map(str::to_string)
            .unwrap_or_default())
    }

    async fn native_click(&self, element: &ElementHandle) -> ProbeResult<()> {
        let element = self.element(element).await?;
        let _ = element.click().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn script_click(&self, element: &ElementHandle) -> ProbeResult<()> {
        let _ = self.call(element, SCRIPT_CLICK_FN).await?;
        Ok(())
    }

    async fn pointer_click(&self, element: &ElementHandle) -> ProbeResult<()> {
        let element = self.element(element).await?;
        let _ = element.scroll_into_view().await.map_err(cdp_error)?;
        let point = element.clickable_point().await.map_err(cdp_error)?;
        let _ = self.page.move_mouse(point).await.map_err(cdp_error)?;
        let _ = self.page.click(point).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn move_pointer(&self, element: &ElementHandle) -> ProbeResult<()> {
        let element = self.element(element).await?;
        let _ = element.scroll_into_view().await.map_err(cdp_error)?;
        let point = element.clickable_point().await.map_err(cdp_error)?;
        let _ = self.page.move_mouse(point).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> ProbeResult<()> {
        let _ = self.call(element, CLEAR_FN).await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        let element = self.element(element).await?;
        let _ = element.focus().await.map_err(cdp_error)?;
        let _ = element.type_str(text).await.map_err(cdp_error)?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> ProbeResult<()> {
        let element = self.element(element).await?;
        let _ = element.scroll_into_view().await.map_err(cdp_error)?;
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        use base64::Engine;

        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.page.execute(params).await.map_err(cdp_error)?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(cdp_error)
    }

    async fn clear_cookies(&self) -> ProbeResult<()> {
        let _ = self
            .page
            .execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(cdp_error)?;
        Ok(())
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.forget_elements().await;
        let closed = self.browser.close().await.map_err(cdp_error);
        let _ = self.browser.wait().await;
        self.handler.abort();
        closed.map(|_| ())
    }
}

/// Launches a fresh Chromium per session
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self, config: &DriverConfig) -> ProbeResult<Box<dyn BrowserDriver>> {
        let driver = ChromiumDriver::launch(config).await?;
        Ok(Box::new(driver))
    }
}
