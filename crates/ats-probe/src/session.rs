//! Scoped browser sessions.
//!
//! A [`Session`] is the single owner of one driver. It is opened before a
//! scenario and closed after it on every exit path; [`with_session`] packages
//! that discipline for callers that can express their work as one closure.

use crate::driver::{BrowserDriver, DriverConfig, SessionLauncher};
use crate::result::{ProbeError, ProbeResult};
use futures::future::BoxFuture;
use std::path::Path;
use uuid::Uuid;

/// Script clearing both web storages of the current origin
const CLEAR_STORAGE_SCRIPT: &str =
    "(function () { window.localStorage.clear(); window.sessionStorage.clear(); return true; })()";

/// One live browser session
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    driver: Option<Box<dyn BrowserDriver>>,
}

impl Session {
    /// Launch a browser and wrap it
    pub async fn open(launcher: &dyn SessionLauncher, config: &DriverConfig) -> ProbeResult<Self> {
        let driver = launcher.launch(config).await?;
        let session = Self::from_driver(driver);
        tracing::info!(status = "info", session = %session.id, headless = config.headless, "browser session opened");
        Ok(session)
    }

    /// Wrap an already-launched driver
    #[must_use]
    pub fn from_driver(driver: Box<dyn BrowserDriver>) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver: Some(driver),
        }
    }

    /// Session id used in logs
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Whether `close` has not run yet
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.driver.is_some()
    }

    /// The driver, or `SessionClosed`
    pub fn driver(&self) -> ProbeResult<&dyn BrowserDriver> {
        self.driver.as_deref().ok_or(ProbeError::SessionClosed)
    }

    /// Close the browser; later calls are no-ops
    pub async fn close(&mut self) -> ProbeResult<()> {
        let Some(mut driver) = self.driver.take() else {
            return Ok(());
        };
        match driver.close().await {
            Ok(()) => {
                tracing::info!(status = "info", session = %self.id, "browser session closed");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(status = "warning", session = %self.id, error = %err, "browser did not close cleanly");
                Err(err)
            }
        }
    }

    // =========================================================================
    // UTILITIES
    // =========================================================================

    /// Reload the page
    pub async fn refresh(&self) -> ProbeResult<()> {
        self.driver()?.reload().await
    }

    /// Go back in history
    pub async fn back(&self) -> ProbeResult<()> {
        self.driver()?.go_back().await
    }

    /// Go forward in history
    pub async fn forward(&self) -> ProbeResult<()> {
        self.driver()?.go_forward().await
    }

    /// Delete every cookie
    pub async fn clear_cookies(&self) -> ProbeResult<()> {
        self.driver()?.clear_cookies().await
    }

    /// Clear local and session storage
    pub async fn clear_storage(&self) -> ProbeResult<()> {
        let _ = self.driver()?.execute_script(CLEAR_STORAGE_SCRIPT).await?;
        Ok(())
    }

    /// Current URL
    pub async fn current_url(&self) -> ProbeResult<String> {
        self.driver()?.current_url().await
    }

    /// Whether the URL contains `fragment`
    pub async fn url_contains(&self, fragment: &str) -> ProbeResult<bool> {
        Ok(self.current_url().await?.contains(fragment))
    }

    /// Whether the title contains `fragment`
    pub async fn title_contains(&self, fragment: &str) -> ProbeResult<bool> {
        Ok(self.driver()?.title().await?.contains(fragment))
    }

    /// Write a PNG screenshot to `path`, creating parent directories
    pub async fn save_screenshot(&self, path: impl AsRef<Path>) -> ProbeResult<()> {
        let path = path.as_ref();
        let png = self.driver()?.screenshot().await?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, png).await?;
        tracing::info!(status = "info", path = %path.display(), "screenshot saved");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.driver.is_some() {
            tracing::warn!(status = "warning", session = %self.id, "session dropped without close");
        }
    }
}

/// Open a session, run `body`, close the session whatever happened
///
/// The body's error wins over a close error; a close error is returned only
/// when the body succeeded.
pub async fn with_session<T, F>(launcher: &dyn SessionLauncher, config: &DriverConfig, body: F) -> ProbeResult<T>
where
    F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, ProbeResult<T>>,
{
    let mut session = Session::open(launcher, config).await?;
    let result = body(&mut session).await;
    let closed = session.close().await;
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), _) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{FailingLauncher, MockLauncher};
    use crate::mock_driver::MockDriver;
    use futures::FutureExt;
    use std::sync::{Arc, Mutex};

    /// Launcher that keeps a handle on every mock it hands out
    fn observed() -> (MockLauncher, Arc<Mutex<Vec<MockDriver>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let launcher = MockLauncher::new(move || {
            let mock = MockDriver::new();
            sink.lock().unwrap().push(mock.clone());
            mock
        });
        (launcher, seen)
    }

    mod lifecycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_close_is_idempotent() {
            let (launcher, seen) = observed();
            let mut session = Session::open(&launcher, &DriverConfig::default()).await.unwrap();
            assert!(session.is_open());
            session.close().await.unwrap();
            session.close().await.unwrap();
            assert!(!session.is_open());
            assert!(matches!(session.driver(), Err(ProbeError::SessionClosed)));
            let mock = seen.lock().unwrap()[0].clone();
            assert_eq!(mock.history().iter().filter(|c| *c == "close").count(), 1);
        }

        #[tokio::test]
        async fn test_with_session_closes_after_success() {
            let (launcher, seen) = observed();
            let url = with_session(&launcher, &DriverConfig::default(), |s| {
                async move {
                    s.driver()?.navigate("https://ats.example.com/login").await?;
                    s.current_url().await
                }
                .boxed()
            })
            .await
            .unwrap();
            assert_eq!(url, "https://ats.example.com/login");
            assert!(seen.lock().unwrap()[0].is_closed());
        }

        #[tokio::test]
        async fn test_with_session_closes_after_failure() {
            let (launcher, seen) = observed();
            let err = with_session::<(), _>(&launcher, &DriverConfig::default(), |_| {
                async { Err(ProbeError::interaction("By.id: x", "boom")) }.boxed()
            })
            .await
            .unwrap_err();
            assert!(err.is_interaction_failure());
            assert!(seen.lock().unwrap()[0].is_closed());
        }

        #[tokio::test]
        async fn test_each_session_gets_a_fresh_driver() {
            let (launcher, seen) = observed();
            for _ in 0..2 {
                with_session(&launcher, &DriverConfig::default(), |_| async { Ok(()) }.boxed())
                    .await
                    .unwrap();
            }
            assert_eq!(seen.lock().unwrap().len(), 2);
        }

        #[tokio::test]
        async fn test_launch_failure_surfaces() {
            let err = Session::open(&FailingLauncher::new("no chromium"), &DriverConfig::default())
                .await
                .unwrap_err();
            assert!(matches!(err, ProbeError::BrowserLaunch { .. }));
        }
    }

    mod utility_tests {
        use super::*;

        #[tokio::test]
        async fn test_history_and_storage() {
            let mock = MockDriver::new();
            let mut session = Session::from_driver(Box::new(mock.clone()));
            session.refresh().await.unwrap();
            session.back().await.unwrap();
            session.forward().await.unwrap();
            session.clear_cookies().await.unwrap();
            session.clear_storage().await.unwrap();
            assert!(mock.was_called("reload"));
            assert!(mock.was_called("clear_cookies"));
            assert!(mock.scripts()[0].contains("localStorage.clear()"));
            session.close().await.unwrap();
        }

        #[tokio::test]
        async fn test_url_and_title_checks() {
            let mock = MockDriver::new();
            mock.set_url("https://ats.example.com/dashboard");
            mock.set_title("ATS | Dashboard");
            let mut session = Session::from_driver(Box::new(mock));
            assert!(session.url_contains("dashboard").await.unwrap());
            assert!(session.title_contains("ATS").await.unwrap());
            assert!(!session.url_contains("login").await.unwrap());
            session.close().await.unwrap();
        }

        #[tokio::test]
        async fn test_save_screenshot() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("shots").join("failure.png");
            let mut session = Session::from_driver(Box::new(MockDriver::new()));
            session.save_screenshot(&path).await.unwrap();
            let bytes = std::fs::read(&path).unwrap();
            assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);
            session.close().await.unwrap();
        }
    }
}
