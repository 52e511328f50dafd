//! BrowserDriver - Abstract Browser Automation Boundary
//!
//! Everything above this trait (waits, the interaction helper, page flows)
//! talks to the browser only through [`BrowserDriver`]. Two implementations
//! ship with the crate:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  BrowserDriver (object-safe async trait)                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐        ┌─────────────────────────┐  │
//! │  │  ChromiumDriver     │        │  MockDriver             │  │
//! │  │  (feature browser)  │        │  (scripted page, tests) │  │
//! │  │  CDP via            │        │  elements registered    │  │
//! │  │  chromiumoxide      │        │  against queries        │  │
//! │  └─────────────────────┘        └─────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drivers report raw failures as [`ProbeError::Driver`]; translating them into
//! the `ElementNotReady` / `InteractionFailed` taxonomy is the helper's job.

use crate::query::ElementQuery;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

/// Element handle for DOM interactions
///
/// Handles are only meaningful for the session that produced them and go
/// stale after navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Driver-assigned identifier
    pub id: String,
    /// Element tag name
    pub tag_name: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
        }
    }
}

impl std::fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}#{}>", self.tag_name, self.id)
    }
}

/// Chrome switches the ATS suite has always launched with
pub const DEFAULT_BROWSER_ARGS: &[&str] = &[
    "--remote-allow-origins=*",
    "--disable-dev-shm-usage",
    "--no-sandbox",
    "--disable-web-security",
    "--disable-features=VizDisplayCompositor",
    "--disable-extensions",
    "--disable-gpu",
];

/// Browser configuration for driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// UI / Accept-Language locale
    pub language: String,
    /// Extra browser switches
    pub args: Vec<String>,
    /// Executable path override
    pub executable_path: Option<String>,
    /// Timeout for a single navigation command
    #[serde(with = "crate::config::duration_secs")]
    pub navigation_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 2560,
            window_height: 1440,
            language: "tr".to_string(),
            args: DEFAULT_BROWSER_ARGS.iter().map(|a| (*a).to_string()).collect(),
            executable_path: None,
            navigation_timeout: Duration::from_secs(30),
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set window dimensions
    #[must_use]
    pub const fn window(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set the browser locale
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Append a browser switch
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set executable path
    #[must_use]
    pub fn executable_path(mut self, path: impl Into<String>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// All switches passed at launch, locale switches included
    #[must_use]
    pub fn launch_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(format!("--lang={}", self.language));
        args.push(format!("--accept-lang={}", self.language));
        args
    }
}

/// Abstract driver trait for browser automation
///
/// # Implementations
///
/// - `ChromiumDriver` - real browser over CDP (feature `browser`)
/// - `MockDriver` - scripted in-memory page for unit tests
#[async_trait]
pub trait BrowserDriver: Send + Sync + Debug {
    /// Navigate to URL
    async fn navigate(&self, url: &str) -> ProbeResult<()>;

    /// Get current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Get page title
    async fn title(&self) -> ProbeResult<String>;

    /// Reload page
    async fn reload(&self) -> ProbeResult<()>;

    /// Go back in history
    async fn go_back(&self) -> ProbeResult<()>;

    /// Go forward in history
    async fn go_forward(&self) -> ProbeResult<()>;

    /// Evaluate a JavaScript expression in page context
    async fn execute_script(&self, script: &str) -> ProbeResult<serde_json::Value>;

    /// All elements matching the query, in document order
    async fn find_all(&self, query: &ElementQuery) -> ProbeResult<Vec<ElementHandle>>;

    /// Elements matching the query below `parent`
    async fn find_within(
        &self,
        parent: &ElementHandle,
        query: &ElementQuery,
    ) -> ProbeResult<Vec<ElementHandle>>;

    /// Parent element, if any
    async fn parent_of(&self, element: &ElementHandle) -> ProbeResult<Option<ElementHandle>>;

    /// Whether the element is rendered and visible
    async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Whether the element accepts input
    async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Rendered text
    async fn text(&self, element: &ElementHandle) -> ProbeResult<String>;

    /// Attribute value (`None` when absent)
    async fn attribute(&self, element: &ElementHandle, name: &str)
        -> ProbeResult<Option<String>>;

    /// Current form value
    async fn value(&self, element: &ElementHandle) -> ProbeResult<String>;

    /// Driver-native click
    async fn native_click(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// `element.click()` invoked through script
    async fn script_click(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Move the pointer onto the element, then press and release
    async fn pointer_click(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Move the pointer onto the element
    async fn move_pointer(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Clear the element's content
    async fn clear(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Type literal text into the element
    async fn send_keys(&self, element: &ElementHandle, text: &str) -> ProbeResult<()>;

    /// Scroll the element into the viewport
    async fn scroll_into_view(&self, element: &ElementHandle) -> ProbeResult<()>;

    /// Capture the viewport as PNG bytes
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Delete all cookies of the session
    async fn clear_cookies(&self) -> ProbeResult<()>;

    /// Close the browser
    async fn close(&mut self) -> ProbeResult<()>;
}

/// Opens fresh driver sessions
///
/// One launch per scenario; the caller owns and closes what it gets back.
#[async_trait]
pub trait SessionLauncher: Send + Sync + Debug {
    /// Launch a new browser session
    async fn launch(&self, config: &DriverConfig) -> ProbeResult<Box<dyn BrowserDriver>>;
}

/// Launcher that hands out [`MockDriver`](crate::MockDriver)s built by a closure
pub struct MockLauncher {
    factory: Box<dyn Fn() -> crate::MockDriver + Send + Sync>,
}

impl MockLauncher {
    /// Create a launcher from a mock factory
    pub fn new(factory: impl Fn() -> crate::MockDriver + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
        }
    }
}

impl Debug for MockLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLauncher").finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionLauncher for MockLauncher {
    async fn launch(&self, _config: &DriverConfig) -> ProbeResult<Box<dyn BrowserDriver>> {
        Ok(Box::new((self.factory)()))
    }
}

/// Launcher that always fails, for exercising launch-error paths
#[derive(Debug, Clone)]
pub struct FailingLauncher {
    message: String,
}

impl FailingLauncher {
    /// Create a launcher failing with `message`
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl SessionLauncher for FailingLauncher {
    async fn launch(&self, _config: &DriverConfig) -> ProbeResult<Box<dyn BrowserDriver>> {
        Err(ProbeError::BrowserLaunch {
            message: self.message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod element_handle_tests {
        use super::*;

        #[test]
        fn test_element_handle_creation() {
            let elem = ElementHandle::new("btn-1", "button");
            assert_eq!(elem.id, "btn-1");
            assert_eq!(elem.tag_name, "button");
            assert_eq!(elem.to_string(), "<button#btn-1>");
        }
    }

    mod driver_config_tests {
        use super::*;

        #[test]
        fn test_config_default() {
            let config = DriverConfig::default();
            assert!(config.headless);
            assert_eq!(config.window_width, 2560);
            assert_eq!(config.window_height, 1440);
            assert_eq!(config.language, "tr");
            assert!(config.args.iter().any(|a| a == "--disable-gpu"));
        }

        #[test]
        fn test_config_builder() {
            let config = DriverConfig::new()
                .headless(false)
                .window(800, 600)
                .language("en")
                .arg("--incognito")
                .executable_path("/usr/bin/chromium");

            assert!(!config.headless);
            assert_eq!(config.window_width, 800);
            assert_eq!(config.window_height, 600);
            assert_eq!(config.executable_path.as_deref(), Some("/usr/bin/chromium"));
            assert!(config.args.iter().any(|a| a == "--incognito"));
        }

        #[test]
        fn test_launch_args_carry_language() {
            let args = DriverConfig::new().language("de").launch_args();
            assert!(args.contains(&"--lang=de".to_string()));
            assert!(args.contains(&"--accept-lang=de".to_string()));
        }
    }

    mod launcher_tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_launcher_builds_fresh_driver() {
            let launcher = MockLauncher::new(|| {
                let mock = crate::MockDriver::new();
                mock.set_url("https://ats.example.com/login");
                mock
            });
            let driver = launcher.launch(&DriverConfig::default()).await.unwrap();
            assert_eq!(
                driver.current_url().await.unwrap(),
                "https://ats.example.com/login"
            );
        }

        #[tokio::test]
        async fn test_failing_launcher() {
            let launcher = FailingLauncher::new("chromium missing");
            let err = launcher
                .launch(&DriverConfig::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::BrowserLaunch { .. }));
        }
    }
}
