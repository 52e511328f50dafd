//! Parameter, record and option discovery on the records screen.
//!
//! Selections narrow later lookups: records are searched under the selected
//! parameter's container, options within the selected record. An empty scoped
//! result falls back to a page-wide search.

use super::{element_at, PageObject};
use crate::config::Timeouts;
use crate::driver::{BrowserDriver, ElementHandle};
use crate::interaction::Interactor;
use crate::navigation::parse_index;
use crate::query::ElementQuery;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{wait_for, WaitCondition};

/// Elements picked by earlier steps of the scenario
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSelections {
    /// Selected parameter accordion
    pub parameter: Option<ElementHandle>,
    /// Selected record card
    pub record: Option<ElementHandle>,
}

impl RecordSelections {
    /// Forget every selection
    pub fn clear(&mut self) {
        self.parameter = None;
        self.record = None;
    }
}

/// Records screen queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordsPage {
    /// Parameter accordions
    pub parameters: ElementQuery,
    /// Record cards
    pub records: ElementQuery,
    /// Option cells of a record
    pub options: ElementQuery,
}

impl Default for RecordsPage {
    fn default() -> Self {
        Self {
            parameters: ElementQuery::css("div.custom-accordion"),
            records: ElementQuery::css("div.col-xxl-4.col-md-6.col-12.pb-3"),
            options: ElementQuery::css("div.col-lg-1.d-flex.justify-content-end.align-items-center"),
        }
    }
}

impl PageObject for RecordsPage {
    fn url_pattern(&self) -> &str {
        "parameters"
    }

    fn page_name(&self) -> &str {
        "RecordsPage"
    }
}

impl RecordsPage {
    /// Create with the ATS selectors
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Click the parameter accordion at `index` and remember it
    pub async fn find_parameter_at_index(
        &self,
        driver: &dyn BrowserDriver,
        selections: &mut RecordSelections,
        index: &str,
        timeouts: &Timeouts,
    ) -> ProbeResult<String> {
        let index = parse_index(index, "parameter")?;
        let parameter = element_at(driver, &self.parameters, index, "parameter", timeouts.element_wait()).await?;
        let name = driver.text(&parameter).await?.trim().to_string();
        tracing::info!(status = "success", index, parameter = %name, "parameter found");

        driver.scroll_into_view(&parameter).await?;
        tokio::time::sleep(timeouts.scroll_settle).await;
        let _ = Interactor::new(driver)
            .click_element(&parameter, &format!("parameter '{name}'"))
            .await
            .into_result()?;

        selections.parameter = Some(parameter);
        selections.record = None;
        Ok(name)
    }

    async fn scoped(
        &self,
        driver: &dyn BrowserDriver,
        scope: Option<&ElementHandle>,
        query: &ElementQuery,
        timeouts: &Timeouts,
    ) -> ProbeResult<Vec<ElementHandle>> {
        if let Some(scope) = scope {
            match driver.find_within(scope, query).await {
                Ok(found) if !found.is_empty() => {
                    tracing::info!(status = "info", count = found.len(), %query, "found within selection");
                    return Ok(found);
                }
                Ok(_) => tracing::info!(status = "info", %query, "nothing within selection, searching page"),
                Err(err) => tracing::info!(status = "info", %query, error = %err, "scoped search failed, searching page"),
            }
        }
        match wait_for(driver, query, &WaitCondition::Present, timeouts.element_wait()).await {
            Ok(found) => Ok(found),
            Err(e) if e.is_not_ready() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Click the record at `index`, scoped under the selected parameter
    pub async fn find_record_at_index(
        &self,
        driver: &dyn BrowserDriver,
        selections: &mut RecordSelections,
        index: &str,
        timeouts: &Timeouts,
        overlays: &[String],
    ) -> ProbeResult<String> {
        let index = parse_index(index, "record")?;
        let container = match &selections.parameter {
            Some(parameter) => driver.parent_of(parameter).await.unwrap_or(None),
            None => None,
        };
        let records = self.scoped(driver, container.as_ref(), &self.records, timeouts).await?;
        let Some(record) = records.get(index).cloned() else {
            return Err(ProbeError::interaction(
                self.records.to_string(),
                format!("record index {index} is out of range, found {}", records.len()),
            ));
        };
        let number = driver.text(&record).await?.trim().to_string();
        tracing::info!(status = "success", index, record = %number, "record found");

        driver.scroll_into_view(&record).await?;
        tokio::time::sleep(timeouts.scroll_settle).await;
        let ui = Interactor::new(driver);
        let _ = ui.remove_overlays(overlays).await;
        let _ = ui
            .click_element(&record, &format!("record '{number}'"))
            .await
            .into_result()?;

        selections.record = Some(record);
        Ok(number)
    }

    /// Click the option whose text or title contains `text`, within the selected record
    pub async fn find_option_with_text(
        &self,
        driver: &dyn BrowserDriver,
        selections: &RecordSelections,
        text: &str,
        timeouts: &Timeouts,
        overlays: &[String],
    ) -> ProbeResult<()> {
        let options = self
            .scoped(driver, selections.record.as_ref(), &self.options, timeouts)
            .await?;
        tracing::debug!(count = options.len(), "option candidates");

        let mut target = None;
        for option in options {
            let shown = driver.text(&option).await.unwrap_or_default();
            let title = driver.attribute(&option, "title").await.unwrap_or(None);
            tracing::debug!(option = %option, text = shown.trim(), title = ?title, "checking option");
            if shown.trim().contains(text) || title.as_deref().is_some_and(|t| t.contains(text)) {
                target = Some(option);
                break;
            }
        }
        let Some(option) = target else {
            return Err(ProbeError::interaction(
                self.options.to_string(),
                format!("no option with text or title containing '{text}'"),
            ));
        };

        driver.scroll_into_view(&option).await?;
        tokio::time::sleep(timeouts.scroll_settle).await;
        let ui = Interactor::new(driver);
        let _ = ui.remove_overlays(overlays).await;
        let _ = ui
            .click_element(&option, &format!("option '{text}'"))
            .await
            .into_result()?;
        tracing::info!(status = "success", option = text, "option clicked");
        tokio::time::sleep(timeouts.option_observe).await;
        Ok(())
    }
}
