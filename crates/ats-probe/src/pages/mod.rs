//! ATS page objects.
//!
//! Each page object owns the queries for one screen and the flows that drive
//! it. Flows take the driver explicitly; a page object holds no session state.

mod login;
mod records;

pub use login::{LoginPage, LoginParams, DASHBOARD_URL_FRAGMENT};
pub use records::{RecordSelections, RecordsPage};

use crate::driver::{BrowserDriver, ElementHandle};
use crate::query::ElementQuery;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{wait_for, WaitCondition, WaitOptions};

/// A page or component of the application under test
pub trait PageObject {
    /// URL fragment identifying the page
    fn url_pattern(&self) -> &str;

    /// Page name for logs
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether `url` belongs to this page
    fn matches_url(&self, url: &str) -> bool {
        url.contains(self.url_pattern())
    }
}

/// Wait until `query` matches more than `index` elements, then return that one
///
/// Out-of-range indices become `InteractionFailed` naming how many matches
/// were available.
pub(crate) async fn element_at(
    driver: &dyn BrowserDriver,
    query: &ElementQuery,
    index: usize,
    what: &str,
    options: WaitOptions,
) -> ProbeResult<ElementHandle> {
    match wait_for(driver, query, &WaitCondition::CountAtLeast(index + 1), options).await {
        Ok(mut found) => Ok(found.swap_remove(index)),
        Err(e) if e.is_not_ready() => {
            let available = driver.find_all(query).await.map(|f| f.len()).unwrap_or(0);
            Err(ProbeError::interaction(
                query.to_string(),
                format!("{what} index {index} is out of range, found {available}"),
            ))
        }
        Err(e) => Err(e),
    }
}
