//! Login and logout flows.

use super::{element_at, PageObject};
use crate::config::Timeouts;
use crate::driver::BrowserDriver;
use crate::interaction::Interactor;
use crate::navigation::parse_index;
use crate::query::ElementQuery;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{wait_for, wait_for_page_load, WaitCondition};

/// Fragment the URL carries once a user is signed in
pub const DASHBOARD_URL_FRAGMENT: &str = "dashboard";

/// Inputs of the login step, in step order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginParams {
    /// Login page URL
    pub page_url: String,
    /// User email
    pub email: String,
    /// Text typed into the account search
    pub search_text: String,
    /// Zero-based account index, as written in the feature file
    pub account_index: String,
    /// User password
    pub password: String,
}

impl LoginParams {
    /// Build from the five step arguments
    #[must_use]
    pub fn new(
        page_url: impl Into<String>,
        email: impl Into<String>,
        search_text: impl Into<String>,
        account_index: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            page_url: page_url.into(),
            email: email.into(),
            search_text: search_text.into(),
            account_index: account_index.into(),
            password: password.into(),
        }
    }
}

/// Login screen and the user menu used to sign out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPage {
    /// Email field
    pub email_input: ElementQuery,
    /// First login button
    pub login_button: ElementQuery,
    /// Account search field
    pub account_search: ElementQuery,
    /// Account buttons listed by the search
    pub account_buttons: ElementQuery,
    /// Password field
    pub password_input: ElementQuery,
    /// Final login button
    pub password_login_button: ElementQuery,
    /// User menu dropdown toggle
    pub user_menu_toggle: ElementQuery,
    /// Entries of the user menu
    pub user_menu_items: ElementQuery,
    /// Position of the logout entry in the user menu
    pub logout_item_index: usize,
    /// Heading shown on the signed-out landing page
    pub welcome_heading: ElementQuery,
}

impl Default for LoginPage {
    fn default() -> Self {
        Self {
            email_input: ElementQuery::id("emailInputOnLoginPage"),
            login_button: ElementQuery::id("login-button"),
            account_search: ElementQuery::css("input[placeholder='Hesap ara...']"),
            account_buttons: ElementQuery::css("button[id='accountSelectButtonOnLoginPage']"),
            password_input: ElementQuery::id("passwordInputOnLoginPage"),
            password_login_button: ElementQuery::id("loginButtonInPasswordCheckInLoginPage"),
            user_menu_toggle: ElementQuery::id("__BVID__31__BV_toggle_"),
            user_menu_items: ElementQuery::css("a.dropdown-item"),
            logout_item_index: 3,
            welcome_heading: ElementQuery::xpath("//h1[contains(text(),'Hoş Geldin')]"),
        }
    }
}

impl PageObject for LoginPage {
    fn url_pattern(&self) -> &str {
        "login"
    }

    fn page_name(&self) -> &str {
        "LoginPage"
    }
}

impl LoginPage {
    /// Create with the ATS selectors
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign in: email, account choice, password, then land on the dashboard
    pub async fn perform_login(
        &self,
        driver: &dyn BrowserDriver,
        params: &LoginParams,
        timeouts: &Timeouts,
    ) -> ProbeResult<()> {
        let ui = Interactor::new(driver);
        let element_wait = timeouts.element_wait();
        let account_index = parse_index(&params.account_index, "account")?;

        driver.navigate(&params.page_url).await?;
        tracing::info!(status = "success", url = %params.page_url, "navigated to login page");
        let _ = wait_for_page_load(driver, timeouts.page_wait()).await?;

        ui.type_text(&self.email_input, &params.email, element_wait).await?;
        tracing::info!(status = "success", email = %params.email, "email entered");
        let _ = ui.click(&self.login_button, element_wait).await?;
        let _ = wait_for_page_load(driver, timeouts.page_wait()).await?;

        ui.type_text(&self.account_search, &params.search_text, element_wait)
            .await?;
        tracing::info!(status = "success", search = %params.search_text, "account search entered");
        let account = element_at(driver, &self.account_buttons, account_index, "account", element_wait).await?;
        let _ = ui
            .click_element(&account, &format!("{} [{account_index}]", self.account_buttons))
            .await
            .into_result()?;
        tracing::info!(status = "success", index = account_index, "account selected");
        let _ = wait_for_page_load(driver, timeouts.page_wait()).await?;

        ui.type_text(&self.password_input, &params.password, element_wait).await?;
        let _ = ui.click(&self.password_login_button, element_wait).await?;
        let _ = wait_for_page_load(driver, timeouts.page_wait()).await?;
        tokio::time::sleep(timeouts.login_settle).await;

        self.verify_login_successful(driver).await?;
        tracing::info!(status = "success", "login completed");
        Ok(())
    }

    /// Open the user menu, click logout, wait for the welcome heading
    pub async fn perform_logout(&self, driver: &dyn BrowserDriver, timeouts: &Timeouts) -> ProbeResult<()> {
        let ui = Interactor::new(driver);
        let element_wait = timeouts.element_wait();

        let _ = ui.click(&self.user_menu_toggle, element_wait).await?;
        let item = element_at(
            driver,
            &self.user_menu_items,
            self.logout_item_index,
            "user menu",
            element_wait,
        )
        .await?;
        let _ = ui
            .click_element(&item, &format!("{} [{}]", self.user_menu_items, self.logout_item_index))
            .await
            .into_result()?;
        let _ = wait_for(driver, &self.welcome_heading, &WaitCondition::Visible, element_wait).await?;
        tracing::info!(status = "success", "logout completed");
        Ok(())
    }

    /// The current URL is the dashboard
    pub async fn verify_login_successful(&self, driver: &dyn BrowserDriver) -> ProbeResult<()> {
        let url = driver.current_url().await?;
        if url.contains(DASHBOARD_URL_FRAGMENT) {
            Ok(())
        } else {
            Err(ProbeError::navigation(
                format!("URL containing '{DASHBOARD_URL_FRAGMENT}'"),
                url,
            ))
        }
    }
}
