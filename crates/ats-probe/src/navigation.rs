//! Menu and sub-menu discovery.
//!
//! A top-level entry is looked up by a prioritized list of [`MenuStrategy`]
//! variants. Each strategy turns the menu name into one query; the first
//! strategy that yields a displayed element whose trimmed text contains the
//! name wins. The order lives in [`MenuConfig::strategies`] so it can be read,
//! tested and reconfigured.

use crate::config::Timeouts;
use crate::driver::{BrowserDriver, ElementHandle};
use crate::interaction::Interactor;
use crate::query::{xpath_literal, ElementQuery};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{poll, wait_for, wait_for_page_load, wait_for_url, WaitCondition};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// STRATEGIES
// =============================================================================

/// How a top-level menu entry is located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MenuStrategy {
    /// Element id containing the slugged menu name
    ById,
    /// Elements with the menu-item role
    ByRole,
    /// Links whose normalized text contains the name
    ByText,
}

impl MenuStrategy {
    /// Default precedence
    pub const DEFAULT_ORDER: [Self; 3] = [Self::ById, Self::ByRole, Self::ByText];

    /// Candidate query for `name`
    #[must_use]
    pub fn query(self, config: &MenuConfig, name: &str) -> ElementQuery {
        match self {
            Self::ById => ElementQuery::css(format!("{} [id*={:?}]", config.main_menu, slug(name))),
            Self::ByRole => ElementQuery::css(format!("{} {}", config.main_menu, config.role_selector)),
            Self::ByText => ElementQuery::xpath(format!(
                "//a[contains(normalize-space(.), {})]",
                xpath_literal(name.trim())
            )),
        }
    }
}

impl fmt::Display for MenuStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ById => "by-id",
            Self::ByRole => "by-role",
            Self::ByText => "by-text",
        })
    }
}

/// Lowercased, whitespace collapsed to `-`
#[must_use]
pub fn slug(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

// =============================================================================
// CONFIG
// =============================================================================

/// Where menus live on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Strategies in precedence order
    pub strategies: Vec<MenuStrategy>,
    /// Main navigation container
    pub main_menu: String,
    /// Selector of menu items under the main menu, for `by-role`
    pub role_selector: String,
    /// Sub-menu entries of the expanded menu
    pub sub_menu_items: String,
    /// Scrollable container of the sub-menu
    pub sub_menu_container: String,
    /// Scroll steps allowed while looking for a sub-menu index
    pub max_scroll_attempts: u32,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            strategies: MenuStrategy::DEFAULT_ORDER.to_vec(),
            main_menu: ".main-menu".to_string(),
            role_selector: "[role='menuitem']".to_string(),
            sub_menu_items: "ul.menu-content li a".to_string(),
            sub_menu_container: ".main-menu-content".to_string(),
            max_scroll_attempts: 5,
        }
    }
}

impl MenuConfig {
    /// Query for sub-menu entries
    #[must_use]
    pub fn sub_menu_query(&self) -> ElementQuery {
        ElementQuery::css(self.sub_menu_items.clone())
    }
}

// =============================================================================
// NAVIGATOR
// =============================================================================

/// The sub-menu entry that was clicked, kept for page verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubMenuSelection {
    /// Index in the sub-menu list
    pub index: usize,
    /// Trimmed entry text
    pub text: String,
    /// Link target, if the entry has one
    pub href: Option<String>,
    /// URL before the click
    pub previous_url: String,
}

impl SubMenuSelection {
    /// Path part of `href`, when it points somewhere
    #[must_use]
    pub fn href_path(&self) -> Option<&str> {
        let href = self.href.as_deref()?.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }
        let path = match href.find("://") {
            Some(scheme_end) => {
                let rest = &href[scheme_end + 3..];
                rest.find('/').map_or("", |i| &rest[i..])
            }
            None => href,
        };
        (!path.is_empty() && path != "/").then_some(path)
    }
}

/// Menu navigation over one driver session
#[derive(Debug, Clone, Copy)]
pub struct MenuNavigator<'a> {
    interactor: Interactor<'a>,
    config: &'a MenuConfig,
    timeouts: Timeouts,
}

impl<'a> MenuNavigator<'a> {
    /// Create a navigator
    #[must_use]
    pub const fn new(driver: &'a dyn BrowserDriver, config: &'a MenuConfig, timeouts: Timeouts) -> Self {
        Self {
            interactor: Interactor::new(driver),
            config,
            timeouts,
        }
    }

    fn driver(&self) -> &'a dyn BrowserDriver {
        self.interactor.driver()
    }

    async fn candidate(&self, strategy: MenuStrategy, name: &str) -> ProbeResult<Option<ElementHandle>> {
        let driver = self.driver();
        let query = strategy.query(self.config, name);
        for element in driver.find_all(&query).await? {
            if !driver.is_displayed(&element).await? {
                continue;
            }
            if driver.text(&element).await?.trim().contains(name.trim()) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// Click the top-level entry named `name`; returns the strategy that found it
    pub async fn select_menu(&self, name: &str) -> ProbeResult<MenuStrategy> {
        let _ = wait_for_page_load(self.driver(), self.timeouts.page_wait()).await?;

        let found = poll(self.timeouts.element_wait(), move || async move {
            for &strategy in &self.config.strategies {
                if let Some(element) = self.candidate(strategy, name).await? {
                    return Ok(Some((strategy, element)));
                }
                tracing::debug!(menu = name, %strategy, "menu strategy found nothing");
            }
            Ok(None)
        })
        .await?;

        let (strategy, element) = found.map_err(|timeout| {
            let tried: Vec<String> = self.config.strategies.iter().map(ToString::to_string).collect();
            ProbeError::interaction(
                format!("menu '{name}'"),
                format!(
                    "no displayed entry found by {} after {}ms",
                    tried.join(", "),
                    timeout.waited.as_millis()
                ),
            )
        })?;

        let _ = self
            .interactor
            .click_element(&element, &format!("menu '{name}' ({strategy})"))
            .await
            .into_result()?;
        tracing::info!(status = "success", menu = name, %strategy, "menu selected");
        Ok(strategy)
    }

    async fn expand_sub_menu(&self) -> ProbeResult<()> {
        let script = format!(
            "(function () {{ var c = document.querySelector({:?}); if (c) {{ c.scrollTop += 300; }} return true; }})()",
            self.config.sub_menu_container
        );
        let _ = self.driver().execute_script(&script).await?;
        tokio::time::sleep(self.timeouts.scroll_settle).await;
        Ok(())
    }

    /// Click the sub-menu entry at `index`
    ///
    /// Scrolls the sub-menu container until the index is in range. Entries
    /// with blank text are never clicked.
    pub async fn select_sub_menu(&self, index: usize) -> ProbeResult<SubMenuSelection> {
        let driver = self.driver();
        let query = self.config.sub_menu_query();

        let mut items = match wait_for(driver, &query, &WaitCondition::Present, self.timeouts.element_wait()).await {
            Ok(items) => items,
            Err(e) if e.is_not_ready() => Vec::new(),
            Err(e) => return Err(e),
        };
        let mut attempts = 0;
        while index >= items.len() && attempts < self.config.max_scroll_attempts {
            attempts += 1;
            self.expand_sub_menu().await?;
            items = driver.find_all(&query).await?;
        }

        let Some(item) = items.get(index) else {
            return Err(ProbeError::interaction(
                query.to_string(),
                format!(
                    "sub-menu index {index} is out of range, found {} entries after {attempts} scroll(s)",
                    items.len()
                ),
            ));
        };

        let text = driver.text(item).await?.trim().to_string();
        if text.is_empty() {
            return Err(ProbeError::interaction(
                query.to_string(),
                format!("sub-menu entry at index {index} has no text"),
            ));
        }
        let href = driver.attribute(item, "href").await?;
        let previous_url = driver.current_url().await?;

        let _ = self
            .interactor
            .click_element(item, &format!("sub-menu '{text}'"))
            .await
            .into_result()?;
        tracing::info!(status = "success", index, sub_menu = %text, "sub-menu selected");

        Ok(SubMenuSelection {
            index,
            text,
            href,
            previous_url,
        })
    }

    /// Select `menu`, then the sub-menu entry at `sub_menu_index`
    pub async fn select_menu_and_sub_menu(&self, menu: &str, sub_menu_index: &str) -> ProbeResult<SubMenuSelection> {
        let index = parse_index(sub_menu_index, "sub-menu")?;
        let _ = self.select_menu(menu).await?;
        self.select_sub_menu(index).await
    }

    /// Check that the page behind `selection` opened; returns the new URL
    pub async fn verify_page_opened(&self, selection: &SubMenuSelection) -> ProbeResult<String> {
        let _ = wait_for_page_load(self.driver(), self.timeouts.page_wait()).await?;
        let path = selection.href_path();
        let url = wait_for_url(
            self.driver(),
            format!("page for sub-menu '{}'", selection.text),
            self.timeouts.page_wait(),
            |url| url != selection.previous_url || path.is_some_and(|p| url.contains(p)),
        )
        .await?;
        tracing::info!(status = "success", %url, "page opened");
        Ok(url)
    }
}

/// Parse a zero-based index from step text
pub fn parse_index(raw: &str, what: &str) -> ProbeResult<usize> {
    raw.trim().parse::<usize>().map_err(|_| {
        ProbeError::interaction(
            format!("{what} index"),
            format!("'{raw}' is not a non-negative integer"),
        )
    })
}
