//! Per-scenario context.
//!
//! [`ScenarioContext`] carries everything one scenario needs: its session, its
//! soft assertions and the selections earlier steps made. Each step method
//! runs one flow and routes its result through the step's [`FailurePolicy`].

use crate::config::SuiteConfig;
use crate::driver::SessionLauncher;
use crate::navigation::{MenuNavigator, SubMenuSelection};
use crate::pages::{LoginPage, LoginParams, RecordSelections, RecordsPage};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::soft::{FailurePolicy, SoftAssertions};
use std::sync::Arc;

/// Step names, as used for per-step policy overrides
pub mod steps {
    /// `Login to system with ...`
    pub const LOGIN: &str = "login";
    /// `perform logout from system`
    pub const LOGOUT: &str = "logout";
    /// `verify login successful`
    pub const VERIFY_LOGIN: &str = "verify login";
    /// `Select menu ... and sub-menu ...`
    pub const SELECT_MENU: &str = "select menu";
    /// `verify page opened successfully`
    pub const VERIFY_PAGE: &str = "verify page opened";
    /// `find parameter name at index ...`
    pub const FIND_PARAMETER: &str = "find parameter";
    /// `find record number at index ...`
    pub const FIND_RECORD: &str = "find record";
    /// `find option id with text ...`
    pub const FIND_OPTION: &str = "find option";

    /// Every step name
    pub const ALL: [&str; 8] = [
        LOGIN,
        LOGOUT,
        VERIFY_LOGIN,
        SELECT_MENU,
        VERIFY_PAGE,
        FIND_PARAMETER,
        FIND_RECORD,
        FIND_OPTION,
    ];
}

/// State of one running scenario
#[derive(Debug)]
pub struct ScenarioContext {
    config: Arc<SuiteConfig>,
    name: String,
    session: Option<Session>,
    soft: SoftAssertions,
    login_page: LoginPage,
    records_page: RecordsPage,
    selections: RecordSelections,
    sub_menu: Option<SubMenuSelection>,
}

impl ScenarioContext {
    /// Create an idle context
    #[must_use]
    pub fn new(config: Arc<SuiteConfig>) -> Self {
        Self {
            config,
            name: String::new(),
            session: None,
            soft: SoftAssertions::new(),
            login_page: LoginPage::new(),
            records_page: RecordsPage::new(),
            selections: RecordSelections::default(),
            sub_menu: None,
        }
    }

    /// Suite configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    /// Soft failures recorded so far
    #[must_use]
    pub const fn soft(&self) -> &SoftAssertions {
        &self.soft
    }

    /// Current session, if open
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Policy a step runs under
    #[must_use]
    pub fn policy_for(&self, step: &str) -> FailurePolicy {
        self.config.policy_for(step)
    }

    /// Open a fresh session and forget everything from a previous scenario
    pub async fn start(&mut self, name: &str, launcher: &dyn SessionLauncher) -> ProbeResult<()> {
        if let Some(mut stale) = self.session.take() {
            let _ = stale.close().await;
        }
        self.name = name.to_string();
        self.soft.reset();
        self.selections.clear();
        self.sub_menu = None;
        self.session = Some(Session::open(launcher, &self.config.driver).await?);
        tracing::info!(status = "info", scenario = %self.name, "scenario started");
        Ok(())
    }

    /// Close the session, then raise every soft failure
    ///
    /// The session is closed even when the scenario failed; a close error is
    /// reported only when there are no soft failures to report.
    pub async fn finish(&mut self) -> ProbeResult<()> {
        let closed = match self.session.take() {
            Some(mut session) => session.close().await,
            None => Ok(()),
        };
        self.selections.clear();
        self.sub_menu = None;
        let verdict = self.soft.assert_all();
        match &verdict {
            Ok(()) => tracing::info!(status = "success", scenario = %self.name, "scenario finished"),
            Err(err) => tracing::error!(status = "error", scenario = %self.name, "{err}"),
        }
        verdict.and(closed)
    }

    fn conclude<T>(&mut self, step: &str, result: ProbeResult<T>) -> ProbeResult<Option<T>> {
        match &result {
            Ok(_) => tracing::info!(status = "success", step, "step completed"),
            Err(err) => tracing::error!(status = "error", step, "{err}"),
        }
        let policy = self.config.policy_for(step);
        self.soft.apply(policy, step, result)
    }

    // =========================================================================
    // STEPS
    // =========================================================================

    /// `Login to system with {page_url} and {email} and {search_text} and {account_index} and {password}`
    pub async fn login(&mut self, params: &LoginParams) -> ProbeResult<()> {
        let result = match self.session.as_ref().map(Session::driver) {
            Some(Ok(driver)) => {
                self.login_page
                    .perform_login(driver, params, &self.config.timeouts)
                    .await
            }
            Some(Err(err)) => Err(err),
            None => Err(ProbeError::SessionClosed),
        };
        self.conclude(steps::LOGIN, result).map(|_| ())
    }

    /// `perform logout from system`
    pub async fn logout(&mut self) -> ProbeResult<()> {
        let result = match self.session.as_ref().map(Session::driver) {
            Some(Ok(driver)) => {
                self.login_page
                    .perform_logout(driver, &self.config.timeouts)
                    .await
            }
            Some(Err(err)) => Err(err),
            None => Err(ProbeError::SessionClosed),
        };
        self.conclude(steps::LOGOUT, result).map(|_| ())
    }

    /// `verify login successful`
    pub async fn verify_login_successful(&mut self) -> ProbeResult<()> {
        let result = match self.session.as_ref().map(Session::driver) {
            Some(Ok(driver)) => self.login_page.verify_login_successful(driver).await,
            Some(Err(err)) => Err(err),
            None => Err(ProbeError::SessionClosed),
        };
        self.conclude(steps::VERIFY_LOGIN, result).map(|_| ())
    }

    /// `Select menu {menu} and sub-menu {index}`
    pub async fn select_menu_and_sub_menu(&mut self, menu: &str, sub_menu_index: &str) -> ProbeResult<()> {
        let result = match self.session.as_ref().map(Session::driver) {
            Some(Ok(driver)) => {
                MenuNavigator::new(driver, &self.config.menu, self.config.timeouts)
                    .select_menu_and_sub_menu(menu, sub_menu_index)
                    .await
            }
            Some(Err(err)) => Err(err),
            None => Err(ProbeError::SessionClosed),
        };
        if let Some(selection) = self.conclude(steps::SELECT_MENU, result)? {
            self.sub_menu = Some(selection);
        }
        Ok(())
    }

    /// `verify page opened successfully`
    pub async fn verify_page_opened(&mut self) -> ProbeResult<()> {
        let result = match (self.session.as_ref().map(Session::driver), &self.sub_menu) {
            (Some(Ok(driver)), Some(selection)) => MenuNavigator::new(driver, &self.config.menu, self.config.timeouts)
                .verify_page_opened(selection)
                .await
                .map(|_| ()),
            (Some(Ok(driver)), None) => {
                let url = driver.current_url().await.unwrap_or_default();
                Err(ProbeError::navigation("a page opened from a sub-menu selection", url))
            }
            (Some(Err(err)), _) => Err(err),
            (None, _) => Err(ProbeError::SessionClosed),
        };
        self.conclude(steps::VERIFY_PAGE, result).map(|_| ())
    }

    /// `find parameter name at index {index}`
    pub async fn find_parameter_at_index(&mut self, index: &str) -> ProbeResult<()> {
        let Self {
            config,
            session,
            records_page,
            selections,
            ..
        } = self;
        let result = match session.as_ref().map(Session::driver) {
            Some(Ok(driver)) => {
                records_page
                    .find_parameter_at_index(driver, selections, index, &config.timeouts)
                    .await
            }
            Some(Err(err)) => Err(err),
            None => Err(ProbeError::SessionClosed),
        };
        self.conclude(steps::FIND_PARAMETER, result).map(|_| ())
    }

    /// `find record number at index {index}`
    pub async fn find_record_at_index(&mut self, index: &str) -> ProbeResult<()> {
        let Self {
            config,
            session,
            records_page,
            selections,
            ..
        } = self;
        let result = match session.as_ref().map(Session::driver) {
            Some(Ok(driver)) => {
                records_page
                    .find_record_at_index(driver, selections, index, &config.timeouts, &config.overlay_selectors)
                    .await
            }
            Some(Err(err)) => Err(err),
            None => Err(ProbeError::SessionClosed),
        };
        self.conclude(steps::FIND_RECORD, result).map(|_| ())
    }

    /// `find option id with text {text}`
    pub async fn find_option_with_text(&mut self, text: &str) -> ProbeResult<()> {
        let result = match self.session.as_ref().map(Session::driver) {
            Some(Ok(driver)) => {
                self.records_page
                    .find_option_with_text(
                        driver,
                        &self.selections,
                        text,
                        &self.config.timeouts,
                        &self.config.overlay_selectors,
                    )
                    .await
            }
            Some(Err(err)) => Err(err),
            None => Err(ProbeError::SessionClosed),
        };
        self.conclude(steps::FIND_OPTION, result).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Timeouts;
    use crate::driver::MockLauncher;
    use crate::mock_driver::{ClickReaction, MockDriver, MockElement};
    use crate::soft::StepPolicies;
    use std::sync::Mutex;

    fn suite(policy: FailurePolicy) -> Arc<SuiteConfig> {
        Arc::new(SuiteConfig::default().with_policy(policy).with_timeouts(Timeouts::immediate()))
    }

    fn launcher_with(page: impl Fn(&MockDriver) + Send + Sync + 'static) -> (MockLauncher, Arc<Mutex<Vec<MockDriver>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let launcher = MockLauncher::new(move || {
            let mock = MockDriver::new();
            page(&mock);
            sink.lock().unwrap().push(mock.clone());
            mock
        });
        (launcher, seen)
    }

    mod policy_tests {
        use super::*;

        #[tokio::test]
        async fn test_fail_fast_returns_error() {
            let (launcher, seen) = launcher_with(|_| {});
            let mut ctx = ScenarioContext::new(suite(FailurePolicy::FailFast));
            ctx.start("records", &launcher).await.unwrap();
            let err = ctx.find_parameter_at_index("0").await.unwrap_err();
            assert!(err.is_interaction_failure());
            assert!(ctx.soft().is_empty());
            ctx.finish().await.unwrap();
            assert!(seen.lock().unwrap()[0].is_closed());
        }

        #[tokio::test]
        async fn test_soft_records_and_continues() {
            let (launcher, seen) = launcher_with(|m| m.set_url("https://ats.example.com/login"));
            let mut ctx = ScenarioContext::new(suite(FailurePolicy::Soft));
            ctx.start("records", &launcher).await.unwrap();
            ctx.find_parameter_at_index("0").await.unwrap();
            ctx.verify_login_successful().await.unwrap();
            assert_eq!(ctx.soft().failures().len(), 2);

            let err = ctx.finish().await.unwrap_err();
            assert!(matches!(err, ProbeError::AssertionFailed { .. }));
            assert!(err.to_string().contains("find parameter: "));
            assert!(err.to_string().contains("verify login: "));
            assert!(seen.lock().unwrap()[0].is_closed());
        }

        #[tokio::test]
        async fn test_step_override_beats_default() {
            let config = SuiteConfig {
                step_policies: StepPolicies::new().with(steps::FIND_OPTION, FailurePolicy::Soft),
                ..SuiteConfig::default().with_timeouts(Timeouts::immediate())
            };
            let (launcher, _) = launcher_with(|_| {});
            let mut ctx = ScenarioContext::new(Arc::new(config));
            ctx.start("mixed", &launcher).await.unwrap();
            ctx.find_option_with_text("Sil").await.unwrap();
            assert!(ctx.find_record_at_index("0").await.is_err());
            assert!(ctx.finish().await.is_err());
        }

        #[tokio::test]
        async fn test_steps_without_session_fail() {
            let mut ctx = ScenarioContext::new(suite(FailurePolicy::FailFast));
            let err = ctx.logout().await.unwrap_err();
            assert!(matches!(err, ProbeError::SessionClosed));
            ctx.finish().await.unwrap();
        }
    }

    mod lifecycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_start_resets_previous_scenario() {
            let (launcher, seen) = launcher_with(|_| {});
            let mut ctx = ScenarioContext::new(suite(FailurePolicy::Soft));
            ctx.start("first", &launcher).await.unwrap();
            ctx.verify_page_opened().await.unwrap();
            assert_eq!(ctx.soft().failures().len(), 1);

            ctx.start("second", &launcher).await.unwrap();
            assert!(ctx.soft().is_empty());
            assert!(seen.lock().unwrap()[0].is_closed());
            assert!(!seen.lock().unwrap()[1].is_closed());
            ctx.finish().await.unwrap();
        }

        #[tokio::test]
        async fn test_menu_then_verify_page() {
            let (launcher, seen) = launcher_with(|m| {
                let config = SuiteConfig::default();
                m.set_url("https://ats.example.com/dashboard");
                m.add_element(
                    MockElement::new("menu", "a")
                        .matching(crate::navigation::MenuStrategy::ByText.query(&config.menu, "Parametreler"))
                        .text("Parametreler"),
                );
                m.add_element(
                    MockElement::new("sub", "a")
                        .matching(config.menu.sub_menu_query())
                        .text("Genel")
                        .on_click(ClickReaction::Navigate("https://ats.example.com/parameters".into())),
                );
            });
            let mut ctx = ScenarioContext::new(suite(FailurePolicy::FailFast));
            ctx.start("menu", &launcher).await.unwrap();
            ctx.select_menu_and_sub_menu("Parametreler", "0").await.unwrap();
            ctx.verify_page_opened().await.unwrap();
            ctx.finish().await.unwrap();
            assert_eq!(seen.lock().unwrap()[0].url(), "https://ats.example.com/parameters");
        }
    }
}
