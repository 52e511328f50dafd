//! Polling waits.
//!
//! Every wait polls at a fixed interval until its condition holds or its
//! timeout elapses. The last sleep is clipped to the remaining time and a
//! probe still running at `timeout + one poll` is abandoned, so a wait always
//! returns within that bound.
//!
//! Driver errors seen while polling do not end the wait; the last one is
//! carried in the resulting [`ProbeError::ElementNotReady`]. A closed session
//! ends it immediately.

use crate::driver::{BrowserDriver, ElementHandle};
use crate::query::ElementQuery;
use crate::result::{ProbeError, ProbeResult};
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default polling interval (1 second)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Checks that must all hold before a page counts as loaded
pub const PAGE_READY_CHECKS: [(&str, &str); 3] = [
    ("document ready", "document.readyState === 'complete'"),
    (
        "jQuery idle",
        "(typeof jQuery === 'undefined') || jQuery.active === 0",
    ),
    (
        "load event",
        "(function () { var t = window.performance && window.performance.timing; return !t || t.loadEventEnd > 0; })()",
    ),
];

// =============================================================================
// CONDITIONS AND OPTIONS
// =============================================================================

/// What to poll for before acting on an element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WaitCondition {
    /// At least one match in the DOM
    Present,
    /// At least one displayed match
    Visible,
    /// At least one displayed and enabled match
    Clickable,
    /// A displayed match whose trimmed text equals the given text
    TextEquals(String),
    /// At least `n` matches in the DOM
    CountAtLeast(usize),
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => f.write_str("present"),
            Self::Visible => f.write_str("visible"),
            Self::Clickable => f.write_str("clickable"),
            Self::TextEquals(text) => write!(f, "showing text '{text}'"),
            Self::CountAtLeast(n) => write!(f, "matched at least {n} times"),
        }
    }
}

/// Timeout and polling interval of a wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Give up after this long
    pub timeout: Duration,
    /// Sleep between probes
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::seconds(15)
    }
}

impl WaitOptions {
    /// Wait up to `timeout`, polling every second
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Wait up to `secs` seconds, polling every second
    #[must_use]
    pub const fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// =============================================================================
// POLL LOOP
// =============================================================================

/// A poll that ran out of time
#[derive(Debug, Clone)]
pub(crate) struct PollTimeout {
    pub(crate) waited: Duration,
    pub(crate) last_error: Option<String>,
}

impl PollTimeout {
    fn not_ready(self, query: &ElementQuery, condition: impl fmt::Display) -> ProbeError {
        ProbeError::ElementNotReady {
            query: query.to_string(),
            condition: condition.to_string(),
            waited_ms: self.waited.as_millis() as u64,
            last_error: self.last_error,
        }
    }
}

pub(crate) async fn poll<T, F, Fut>(options: WaitOptions, mut probe: F) -> ProbeResult<Result<T, PollTimeout>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<Option<T>>>,
{
    let start = Instant::now();
    let hard_stop = start + options.timeout + options.poll_interval;
    let mut last_error = None;
    loop {
        match timeout_at(hard_stop, probe()).await {
            Ok(Ok(Some(value))) => return Ok(Ok(value)),
            Ok(Ok(None)) => {}
            Ok(Err(ProbeError::SessionClosed)) => return Err(ProbeError::SessionClosed),
            Ok(Err(e)) => last_error = Some(e.to_string()),
            Err(_) => {
                return Ok(Err(PollTimeout {
                    waited: start.elapsed(),
                    last_error,
                }));
            }
        }
        let elapsed = start.elapsed();
        if elapsed >= options.timeout {
            return Ok(Err(PollTimeout {
                waited: elapsed,
                last_error,
            }));
        }
        sleep(options.poll_interval.min(options.timeout - elapsed)).await;
    }
}

async fn displayed(
    driver: &dyn BrowserDriver,
    found: Vec<ElementHandle>,
) -> ProbeResult<Vec<ElementHandle>> {
    let mut shown = Vec::with_capacity(found.len());
    for element in found {
        if driver.is_displayed(&element).await? {
            shown.push(element);
        }
    }
    Ok(shown)
}

/// Evaluate `condition` once; `None` when it does not hold yet
pub async fn check_condition(
    driver: &dyn BrowserDriver,
    query: &ElementQuery,
    condition: &WaitCondition,
) -> ProbeResult<Option<Vec<ElementHandle>>> {
    let found = driver.find_all(query).await?;
    let selected = match condition {
        WaitCondition::Present => found,
        WaitCondition::CountAtLeast(n) => {
            return Ok((found.len() >= *n).then_some(found));
        }
        WaitCondition::Visible => displayed(driver, found).await?,
        WaitCondition::Clickable => {
            let mut ready = Vec::new();
            for element in displayed(driver, found).await? {
                if driver.is_enabled(&element).await? {
                    ready.push(element);
                }
            }
            ready
        }
        WaitCondition::TextEquals(expected) => {
            let mut matching = Vec::new();
            for element in displayed(driver, found).await? {
                if driver.text(&element).await?.trim() == expected.trim() {
                    matching.push(element);
                }
            }
            matching
        }
    };
    Ok((!selected.is_empty()).then_some(selected))
}

// =============================================================================
// ELEMENT WAITS
// =============================================================================

/// Wait until `condition` holds for `query`; returns the satisfying elements
pub async fn wait_for(
    driver: &dyn BrowserDriver,
    query: &ElementQuery,
    condition: &WaitCondition,
    options: WaitOptions,
) -> ProbeResult<Vec<ElementHandle>> {
    match poll(options, move || check_condition(driver, query, condition)).await? {
        Ok(elements) => {
            tracing::debug!(%query, %condition, count = elements.len(), "wait satisfied");
            Ok(elements)
        }
        Err(timeout) => Err(timeout.not_ready(query, condition)),
    }
}

/// Wait until no match of `query` is displayed
pub async fn wait_for_invisible(
    driver: &dyn BrowserDriver,
    query: &ElementQuery,
    options: WaitOptions,
) -> ProbeResult<()> {
    let outcome = poll(options, move || async move {
        let found = driver.find_all(query).await?;
        Ok(displayed(driver, found).await?.is_empty().then_some(()))
    })
    .await?;
    outcome.map_err(|timeout| timeout.not_ready(query, "invisible"))
}

/// Wait for a displayed match of `query` whose text contains `text`
pub async fn wait_for_text_present(
    driver: &dyn BrowserDriver,
    query: &ElementQuery,
    text: &str,
    options: WaitOptions,
) -> ProbeResult<ElementHandle> {
    let outcome = poll(options, move || async move {
        let found = driver.find_all(query).await?;
        for element in displayed(driver, found).await? {
            if driver.text(&element).await?.contains(text) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    })
    .await?;
    outcome.map_err(|timeout| timeout.not_ready(query, format!("containing text '{text}'")))
}

// =============================================================================
// PAGE WAITS
// =============================================================================

/// Wait for the document, jQuery and the load event to settle
///
/// Times out softly: a warning is logged and `Ok(false)` returned so the
/// flow can carry on against a page that is usable but never went idle.
pub async fn wait_for_page_load(
    driver: &dyn BrowserDriver,
    options: WaitOptions,
) -> ProbeResult<bool> {
    let outcome = poll(options, move || async move {
        for (name, script) in PAGE_READY_CHECKS {
            if driver.execute_script(script).await? != serde_json::Value::Bool(true) {
                tracing::trace!(check = name, "page not ready");
                return Ok(None);
            }
        }
        Ok(Some(()))
    })
    .await?;
    match outcome {
        Ok(()) => {
            tracing::debug!("page loaded");
            Ok(true)
        }
        Err(timeout) => {
            tracing::warn!(
                status = "warning",
                waited_ms = timeout.waited.as_millis() as u64,
                "page did not finish loading, continuing"
            );
            Ok(false)
        }
    }
}

fn lock(seen: &Mutex<String>) -> MutexGuard<'_, String> {
    seen.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Last value observed before a poll gave up
fn take(seen: &Mutex<String>) -> String {
    std::mem::take(&mut *lock(seen))
}

pub(crate) async fn wait_for_url(
    driver: &dyn BrowserDriver,
    expected: String,
    options: WaitOptions,
    accept: impl Fn(&str) -> bool,
) -> ProbeResult<String> {
    let accept = &accept;
    let seen = &Mutex::new(String::new());
    let outcome = poll(options, move || async move {
        let url = driver.current_url().await?;
        if accept(&url) {
            return Ok(Some(url));
        }
        *lock(seen) = url;
        Ok(None)
    })
    .await?;
    outcome.map_err(|_| ProbeError::navigation(expected, take(seen)))
}

/// Wait until the URL contains `fragment`; returns the URL
pub async fn wait_for_url_contains(
    driver: &dyn BrowserDriver,
    fragment: &str,
    options: WaitOptions,
) -> ProbeResult<String> {
    wait_for_url(
        driver,
        format!("URL containing '{fragment}'"),
        options,
        |url| url.contains(fragment),
    )
    .await
}

/// Wait until the URL differs from `previous`; returns the new URL
pub async fn wait_for_url_change(
    driver: &dyn BrowserDriver,
    previous: &str,
    options: WaitOptions,
) -> ProbeResult<String> {
    wait_for_url(
        driver,
        format!("URL different from {previous}"),
        options,
        |url| url != previous,
    )
    .await
}

/// Wait until the title differs from `previous`; returns the new title
pub async fn wait_for_title_change(
    driver: &dyn BrowserDriver,
    previous: &str,
    options: WaitOptions,
) -> ProbeResult<String> {
    let seen = &Mutex::new(String::new());
    let outcome = poll(options, move || async move {
        let title = driver.title().await?;
        if title != previous {
            return Ok(Some(title));
        }
        *lock(seen) = title;
        Ok(None)
    })
    .await?;
    outcome.map_err(|_| ProbeError::navigation(format!("title different from '{previous}'"), take(seen)))
}
