//! ATS Probe: resilient browser interaction for the ATS regression suite
//!
//! The crate drives a Chromium session through a narrow async driver boundary
//! and layers the suite's tolerance for a flaky UI on top of it: polling
//! waits, a click strategy chain, overlay removal, scroll-to-find and menu
//! navigation with selector fallbacks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    ATS PROBE Architecture                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Page flows │    │ Interactor │            │
//! │   │ Context    │───►│ login/menu │───►│ waits +    │            │
//! │   │ (soft/fail │    │ records    │    │ click chain│            │
//! │   │  policy)   │    └────────────┘    └─────┬──────┘            │
//! │   └─────┬──────┘                            │                   │
//! │         │ Session (open / close)            ▼                   │
//! │         └──────────────────────────► BrowserDriver              │
//! │                                      ├─ ChromiumDriver (CDP)    │
//! │                                      └─ MockDriver (tests)      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ats_probe::prelude::*;
//!
//! # async fn demo(driver: &dyn BrowserDriver) -> ProbeResult<()> {
//! let ui = Interactor::new(driver);
//! let strategy = ui
//!     .click(&ElementQuery::id("login-button"), WaitOptions::seconds(15))
//!     .await?;
//! println!("clicked with {}", strategy.label());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Chromium over CDP (feature `browser`)
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
mod browser;
mod config;
mod driver;
mod interaction;
/// Scripted in-memory driver for tests
pub mod mock_driver;
/// Menu and sub-menu navigation
pub mod navigation;
/// Page objects for the ATS screens
pub mod pages;
mod query;
mod result;
/// Scenario state shared by BDD steps
pub mod scenario;
/// Scroll helpers
pub mod scroll;
mod session;
mod soft;
/// Generated test inputs
pub mod testdata;
/// Polling waits
pub mod wait;

#[cfg(feature = "browser")]
pub use browser::{ChromiumDriver, ChromiumLauncher};
pub use config::{duration_secs, SuiteConfig, Timeouts, DEFAULT_CONFIG_FILE, DEFAULT_OVERLAY_SELECTORS};
pub use driver::{
    BrowserDriver, DriverConfig, ElementHandle, FailingLauncher, MockLauncher, SessionLauncher,
    DEFAULT_BROWSER_ARGS,
};
pub use interaction::{
    Action, ClickStrategy, InteractionOutcome, InteractionReport, Interactor, Performed,
    StrategyAttempt,
};
pub use mock_driver::{ClickReaction, MockClick, MockDriver, MockElement};
pub use navigation::{MenuConfig, MenuNavigator, MenuStrategy, SubMenuSelection};
pub use pages::{LoginPage, LoginParams, PageObject, RecordSelections, RecordsPage};
pub use query::{xpath_literal, ElementQuery, SelectorKind};
pub use result::{ProbeError, ProbeResult};
pub use scenario::ScenarioContext;
pub use session::{with_session, Session};
pub use soft::{FailurePolicy, SoftAssertions, StepPolicies};
pub use wait::{WaitCondition, WaitOptions};

/// Prelude for convenient imports
pub mod prelude {
    #[cfg(feature = "browser")]
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::interaction::*;
    pub use super::mock_driver::*;
    pub use super::navigation::*;
    pub use super::pages::*;
    pub use super::query::*;
    pub use super::result::*;
    pub use super::scenario::ScenarioContext;
    pub use super::scroll::*;
    pub use super::session::*;
    pub use super::soft::*;
    pub use super::wait::*;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    mod prelude_tests {
        use super::*;

        #[tokio::test]
        async fn test_prelude_covers_a_full_click() {
            let driver = MockDriver::new();
            let login = ElementQuery::id("login-button");
            driver.add_element(MockElement::new("login", "button").matching(login.clone()));
            let strategy = Interactor::new(&driver)
                .click(&login, Timeouts::immediate().element_wait())
                .await
                .unwrap();
            assert_eq!(strategy, ClickStrategy::Native);
        }

        #[test]
        fn test_default_suite_config_is_valid() {
            let config = SuiteConfig::default();
            config.validate().unwrap();
            assert_eq!(config.policy, FailurePolicy::FailFast);
            assert_eq!(config.menu.strategies, MenuStrategy::DEFAULT_ORDER.to_vec());
        }
    }
}
