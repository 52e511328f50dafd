//! Scroll helpers.
//!
//! Long ATS lists render lazily, so "find" often means "scroll until it shows
//! up". [`scroll_to_find`] separates the two non-success cases: `Ok(None)` when
//! the element never appeared, `Err` when the driver itself failed.

use crate::driver::{BrowserDriver, ElementHandle};
use crate::query::ElementQuery;
use crate::result::ProbeResult;
use std::time::Duration;

/// Distance of one scroll step, in pixels
pub const SCROLL_STEP_PX: i64 = 300;

/// Which way [`scroll_to_find`] scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    /// Scan towards the bottom
    #[default]
    Down,
    /// Scan towards the top
    Up,
    /// Scan down, then back up
    Both,
}

/// Scroll the window vertically by `dy` pixels
pub async fn scroll_by(driver: &dyn BrowserDriver, dy: i64) -> ProbeResult<()> {
    let _ = driver
        .execute_script(&format!("window.scrollBy(0, {dy}); true"))
        .await?;
    Ok(())
}

/// Scroll one step down
pub async fn scroll_down(driver: &dyn BrowserDriver) -> ProbeResult<()> {
    scroll_by(driver, SCROLL_STEP_PX).await
}

/// Scroll one step up
pub async fn scroll_up(driver: &dyn BrowserDriver) -> ProbeResult<()> {
    scroll_by(driver, -SCROLL_STEP_PX).await
}

/// Jump to the top of the page
pub async fn scroll_to_top(driver: &dyn BrowserDriver) -> ProbeResult<()> {
    let _ = driver.execute_script("window.scrollTo(0, 0); true").await?;
    Ok(())
}

/// Jump to the bottom of the page
pub async fn scroll_to_bottom(driver: &dyn BrowserDriver) -> ProbeResult<()> {
    let _ = driver
        .execute_script("window.scrollTo(0, document.body.scrollHeight); true")
        .await?;
    Ok(())
}

/// Bring `element` into the viewport
pub async fn scroll_to_element(driver: &dyn BrowserDriver, element: &ElementHandle) -> ProbeResult<()> {
    driver.scroll_into_view(element).await
}

async fn first_displayed(
    driver: &dyn BrowserDriver,
    query: &ElementQuery,
) -> ProbeResult<Option<ElementHandle>> {
    for element in driver.find_all(query).await? {
        // A match that went stale between lookup and check is just not there.
        if driver.is_displayed(&element).await.unwrap_or(false) {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

async fn scan(
    driver: &dyn BrowserDriver,
    query: &ElementQuery,
    max_scrolls: u32,
    dy: i64,
    settle: Duration,
) -> ProbeResult<Option<ElementHandle>> {
    if let Some(found) = first_displayed(driver, query).await? {
        return Ok(Some(found));
    }
    for step in 1..=max_scrolls {
        scroll_by(driver, dy).await?;
        tokio::time::sleep(settle).await;
        if let Some(found) = first_displayed(driver, query).await? {
            tracing::debug!(%query, step, "found after scrolling");
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Scroll in `direction` until a displayed match of `query` appears
///
/// Probes before every step and waits `settle` after each one. At most
/// `max_scrolls` steps are taken per direction.
pub async fn scroll_to_find(
    driver: &dyn BrowserDriver,
    query: &ElementQuery,
    max_scrolls: u32,
    direction: ScrollDirection,
    settle: Duration,
) -> ProbeResult<Option<ElementHandle>> {
    let found = match direction {
        ScrollDirection::Down => scan(driver, query, max_scrolls, SCROLL_STEP_PX, settle).await?,
        ScrollDirection::Up => scan(driver, query, max_scrolls, -SCROLL_STEP_PX, settle).await?,
        ScrollDirection::Both => match scan(driver, query, max_scrolls, SCROLL_STEP_PX, settle).await? {
            Some(found) => Some(found),
            None => scan(driver, query, max_scrolls, -SCROLL_STEP_PX, settle).await?,
        },
    };
    if found.is_none() {
        tracing::info!(status = "info", %query, max_scrolls, ?direction, "element not found by scrolling");
    }
    Ok(found)
}
