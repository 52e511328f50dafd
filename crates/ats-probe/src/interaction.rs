//! Resilient Interaction Helper
//!
//! Locates an element, waits for it to be ready, then acts on it. Clicks fall
//! through a fixed chain of strategies; the first success ends the chain.
//!
//! ```text
//! Start ──► Polling ──► ConditionMet ──► Acting(Native)
//!              │                            │ fail
//!              │                            ▼
//!              │                         Acting(Script)
//!              │                            │ fail
//!              │                            ▼
//!              │                         Acting(Pointer) ──fail──► Failed(InteractionFailed)
//!              │                            │ ok (any step)
//!              ▼                            ▼
//!      Failed(ElementNotReady)           Succeeded
//! ```
//!
//! Driver errors never leave this module raw: a call yields an
//! [`InteractionReport`] whose outcome is either a [`Performed`] action or a
//! `ElementNotReady` / `InteractionFailed` error.

use crate::driver::{BrowserDriver, ElementHandle};
use crate::query::ElementQuery;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{wait_for, WaitCondition, WaitOptions};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// STRATEGIES AND ACTIONS
// =============================================================================

/// Ways of clicking an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickStrategy {
    /// Driver-native click
    Native,
    /// `element.click()` through script
    Script,
    /// Pointer moved onto the element, then pressed
    Pointer,
}

impl ClickStrategy {
    /// Order in which strategies are tried
    pub const CHAIN: [Self; 3] = [Self::Native, Self::Script, Self::Pointer];

    /// Short name used in logs
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Script => "script",
            Self::Pointer => "pointer",
        }
    }
}

impl fmt::Display for ClickStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What to do with the element once it is ready
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Click through the strategy chain
    Click,
    /// Clear, then type the text
    SetText(String),
    /// Read the trimmed text
    ReadText,
    /// Move the pointer onto the element
    Hover,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::SetText(_) => "set text",
            Self::ReadText => "read text",
            Self::Hover => "hover",
        }
    }
}

/// What a successful interaction did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Performed {
    /// Clicked with this strategy
    Clicked(ClickStrategy),
    /// Text entered
    TextSet,
    /// Text read
    TextRead(String),
    /// Pointer moved
    Hovered,
}

/// Result of one interaction call
#[derive(Debug)]
pub enum InteractionOutcome {
    /// The action happened
    Succeeded(Performed),
    /// Element never became ready, or every strategy failed
    Failed(ProbeError),
}

/// One strategy tried during a click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyAttempt {
    /// Strategy tried
    pub strategy: ClickStrategy,
    /// Driver error, `None` on success
    pub error: Option<String>,
}

impl StrategyAttempt {
    /// Whether the strategy worked
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything that happened during one interaction call
#[derive(Debug)]
pub struct InteractionReport {
    /// Locator or element description
    pub target: String,
    /// Final outcome
    pub outcome: InteractionOutcome,
    /// Click strategies tried, in order
    pub attempts: Vec<StrategyAttempt>,
    /// Wall time spent, waiting included
    pub elapsed: Duration,
}

impl InteractionReport {
    /// True if the outcome is `Succeeded`
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, InteractionOutcome::Succeeded(_))
    }

    /// Strategy that finally clicked, if any
    #[must_use]
    pub fn strategy_used(&self) -> Option<ClickStrategy> {
        match &self.outcome {
            InteractionOutcome::Succeeded(Performed::Clicked(s)) => Some(*s),
            _ => None,
        }
    }

    /// Number of failed strategy attempts
    #[must_use]
    pub fn failed_attempts(&self) -> usize {
        self.attempts.iter().filter(|a| !a.succeeded()).count()
    }

    /// Convert into a plain result
    pub fn into_result(self) -> ProbeResult<Performed> {
        match self.outcome {
            InteractionOutcome::Succeeded(performed) => Ok(performed),
            InteractionOutcome::Failed(err) => Err(err),
        }
    }
}

// =============================================================================
// INTERACTOR
// =============================================================================

/// Resilient interaction helper bound to one driver session
#[derive(Debug, Clone, Copy)]
pub struct Interactor<'a> {
    driver: &'a dyn BrowserDriver,
}

impl<'a> Interactor<'a> {
    /// Create a helper over `driver`
    #[must_use]
    pub const fn new(driver: &'a dyn BrowserDriver) -> Self {
        Self { driver }
    }

    /// Underlying driver
    #[must_use]
    pub const fn driver(&self) -> &'a dyn BrowserDriver {
        self.driver
    }

    /// Wait for `condition` on `query`, then perform `action` on the first match
    pub async fn perform(
        &self,
        query: &ElementQuery,
        condition: &WaitCondition,
        options: WaitOptions,
        action: Action,
    ) -> InteractionReport {
        let start = Instant::now();
        let target = query.to_string();

        let waited = wait_for(self.driver, query, condition, options)
            .await
            .and_then(|found| {
                found.into_iter().next().ok_or_else(|| ProbeError::ElementNotReady {
                    query: target.clone(),
                    condition: condition.to_string(),
                    waited_ms: start.elapsed().as_millis() as u64,
                    last_error: None,
                })
            });
        let element = match waited {
            Ok(element) => element,
            Err(err) => {
                tracing::error!(status = "error", %query, %condition, "{err}");
                return InteractionReport {
                    target,
                    outcome: InteractionOutcome::Failed(err),
                    attempts: Vec::new(),
                    elapsed: start.elapsed(),
                };
            }
        };

        let name = action.name();
        let result = match action {
            Action::Click => {
                let mut report = self.click_element(&element, &target).await;
                report.elapsed = start.elapsed();
                return report;
            }
            Action::SetText(text) => self
                .set_text(&element, &text)
                .await
                .map(|()| Performed::TextSet),
            Action::ReadText => self
                .driver
                .text(&element)
                .await
                .map(|t| Performed::TextRead(t.trim().to_string())),
            Action::Hover => self
                .driver
                .move_pointer(&element)
                .await
                .map(|()| Performed::Hovered),
        };

        let outcome = match result {
            Ok(performed) => {
                tracing::info!(status = "success", %query, action = name, "interaction done");
                InteractionOutcome::Succeeded(performed)
            }
            Err(err) => {
                tracing::error!(status = "error", %query, action = name, "{err}");
                InteractionOutcome::Failed(ProbeError::interaction(&target, err.to_string()))
            }
        };
        InteractionReport {
            target,
            outcome,
            attempts: Vec::new(),
            elapsed: start.elapsed(),
        }
    }

    async fn set_text(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        self.driver.clear(element).await?;
        self.driver.send_keys(element, text).await
    }

    /// Run the click chain on an already-resolved element
    pub async fn click_element(&self, element: &ElementHandle, target: &str) -> InteractionReport {
        let start = Instant::now();
        let mut attempts = Vec::with_capacity(ClickStrategy::CHAIN.len());
        let mut last_error = String::new();

        for strategy in ClickStrategy::CHAIN {
            let result = match strategy {
                ClickStrategy::Native => self.driver.native_click(element).await,
                ClickStrategy::Script => self.driver.script_click(element).await,
                ClickStrategy::Pointer => self.driver.pointer_click(element).await,
            };
            match result {
                Ok(()) => {
                    tracing::info!(status = "success", query = target, %strategy, "click succeeded");
                    attempts.push(StrategyAttempt {
                        strategy,
                        error: None,
                    });
                    return InteractionReport {
                        target: target.to_string(),
                        outcome: InteractionOutcome::Succeeded(Performed::Clicked(strategy)),
                        attempts,
                        elapsed: start.elapsed(),
                    };
                }
                Err(err) => {
                    last_error = err.to_string();
                    tracing::info!(status = "info", query = target, %strategy, error = %last_error, "click strategy failed");
                    attempts.push(StrategyAttempt {
                        strategy,
                        error: Some(last_error.clone()),
                    });
                }
            }
        }

        tracing::error!(status = "error", query = target, "all click strategies failed");
        InteractionReport {
            target: target.to_string(),
            outcome: InteractionOutcome::Failed(ProbeError::interaction(target, last_error)),
            attempts,
            elapsed: start.elapsed(),
        }
    }

    /// Hide overlay chrome matching `selectors`; returns how many elements were hidden
    ///
    /// Best effort: a failing script is logged and counts as zero.
    pub async fn remove_overlays(&self, selectors: &[String]) -> usize {
        if selectors.is_empty() {
            return 0;
        }
        let list = serde_json::to_string(&selectors.join(", ")).unwrap_or_else(|_| "''".into());
        let script = format!(
            "(function () {{ var n = 0; document.querySelectorAll({list}).forEach(function (e) {{ e.style.display = 'none'; n++; }}); return n; }})()"
        );
        match self.driver.execute_script(&script).await {
            Ok(value) => {
                let hidden = value.as_u64().unwrap_or(0) as usize;
                tracing::info!(status = "info", hidden, "overlay elements removed");
                hidden
            }
            Err(err) => {
                tracing::info!(status = "info", error = %err, "could not remove overlays, continuing");
                0
            }
        }
    }

    // =========================================================================
    // CONVENIENCE WRAPPERS
    // =========================================================================

    /// Wait until clickable, then click; returns the strategy that worked
    pub async fn click(&self, query: &ElementQuery, options: WaitOptions) -> ProbeResult<ClickStrategy> {
        let report = self
            .perform(query, &WaitCondition::Clickable, options, Action::Click)
            .await;
        match report.into_result()? {
            Performed::Clicked(strategy) => Ok(strategy),
            other => Err(ProbeError::interaction(query.to_string(), format!("unexpected result {other:?}"))),
        }
    }

    /// Wait until visible, clear, then type `text`
    pub async fn type_text(&self, query: &ElementQuery, text: &str, options: WaitOptions) -> ProbeResult<()> {
        self.perform(query, &WaitCondition::Visible, options, Action::SetText(text.to_string()))
            .await
            .into_result()
            .map(|_| ())
    }

    /// Wait until visible, then read the trimmed text
    pub async fn read_text(&self, query: &ElementQuery, options: WaitOptions) -> ProbeResult<String> {
        match self
            .perform(query, &WaitCondition::Visible, options, Action::ReadText)
            .await
            .into_result()?
        {
            Performed::TextRead(text) => Ok(text),
            other => Err(ProbeError::interaction(query.to_string(), format!("unexpected result {other:?}"))),
        }
    }

    /// Wait until visible, then hover
    pub async fn hover(&self, query: &ElementQuery, options: WaitOptions) -> ProbeResult<()> {
        self.perform(query, &WaitCondition::Visible, options, Action::Hover)
            .await
            .into_result()
            .map(|_| ())
    }

    /// Open a dropdown, then click an option inside it
    pub async fn select_dropdown_option(
        &self,
        dropdown: &ElementQuery,
        option: &ElementQuery,
        options: WaitOptions,
    ) -> ProbeResult<()> {
        let _ = self.click(dropdown, options).await?;
        let _ = self.click(option, options).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_driver::{MockDriver, MockElement};

    fn quick() -> WaitOptions {
        WaitOptions::new(Duration::from_secs(2))
    }

    fn button(id: &str) -> MockElement {
        MockElement::new(id, "button").matching(ElementQuery::id(id))
    }

    mod chain_tests {
        use super::*;

        #[test]
        fn test_chain_order() {
            assert_eq!(
                ClickStrategy::CHAIN,
                [ClickStrategy::Native, ClickStrategy::Script, ClickStrategy::Pointer]
            );
        }

        #[tokio::test]
        async fn test_native_success_short_circuits() {
            let driver = MockDriver::new().with_element(button("ok"));
            let report = Interactor::new(&driver)
                .perform(&ElementQuery::id("ok"), &WaitCondition::Clickable, quick(), Action::Click)
                .await;
            assert_eq!(report.strategy_used(), Some(ClickStrategy::Native));
            assert_eq!(report.attempts.len(), 1);
            assert_eq!(driver.clicks().len(), 1);
        }

        #[tokio::test]
        async fn test_native_failure_falls_back_to_script() {
            let driver = MockDriver::new().with_element(button("b").native_click_fails());
            let report = Interactor::new(&driver)
                .perform(&ElementQuery::id("b"), &WaitCondition::Clickable, quick(), Action::Click)
                .await;
            assert_eq!(report.strategy_used(), Some(ClickStrategy::Script));
            assert_eq!(report.failed_attempts(), 1);
            assert_eq!(report.attempts[0].strategy, ClickStrategy::Native);
            assert_eq!(report.attempts[1].strategy, ClickStrategy::Script);
            assert!(report.attempts[1].succeeded());
            let clicks = driver.clicks();
            assert_eq!(clicks.len(), 1);
            assert_eq!(clicks[0].method, "script");
        }

        #[tokio::test]
        async fn test_pointer_is_last_resort() {
            let driver = MockDriver::new()
                .with_element(button("b").native_click_fails().script_click_fails());
            let report = Interactor::new(&driver)
                .click_element(&ElementHandle::new("b", "button"), "By.id: b")
                .await;
            assert_eq!(report.strategy_used(), Some(ClickStrategy::Pointer));
            assert_eq!(report.failed_attempts(), 2);
        }

        #[tokio::test]
        async fn test_exhausted_chain_is_interaction_failed() {
            let driver = MockDriver::new().with_element(
                button("b")
                    .native_click_fails()
                    .script_click_fails()
                    .pointer_click_fails(),
            );
            let report = Interactor::new(&driver)
                .perform(&ElementQuery::id("b"), &WaitCondition::Present, quick(), Action::Click)
                .await;
            assert_eq!(report.attempts.len(), 3);
            let err = report.into_result().unwrap_err();
            assert!(err.is_interaction_failure());
            assert!(err.to_string().contains("move target out of bounds"));
            assert!(driver.clicks().is_empty());
        }

        #[tokio::test(start_paused = true)]
        async fn test_unresolved_query_never_succeeds() {
            let driver = MockDriver::new();
            let report = Interactor::new(&driver)
                .perform(&ElementQuery::id("missing"), &WaitCondition::Clickable, quick(), Action::Click)
                .await;
            assert!(report.attempts.is_empty());
            match report.outcome {
                InteractionOutcome::Failed(err) => assert!(err.is_not_ready()),
                InteractionOutcome::Succeeded(_) => panic!("unexpected success"),
            }
        }
    }

    mod log_tests {
        use super::*;
        use std::sync::{Arc, Mutex};
        use tracing::field::{Field, Visit};
        use tracing::{Event, Level, Subscriber};
        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::Layer;

        /// Level and `status` field of every event
        #[derive(Clone, Default)]
        struct Captured(Arc<Mutex<Vec<(Level, String)>>>);

        struct Status(String);

        impl Visit for Status {
            fn record_str(&mut self, field: &Field, value: &str) {
                if field.name() == "status" {
                    self.0 = value.to_string();
                }
            }

            fn record_debug(&mut self, _field: &Field, _value: &dyn std::fmt::Debug) {}
        }

        impl<S: Subscriber> Layer<S> for Captured {
            fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
                let mut status = Status(String::new());
                event.record(&mut status);
                self.0.lock().unwrap().push((*event.metadata().level(), status.0));
            }
        }

        impl Captured {
            fn count(&self, level: Level, status: &str) -> usize {
                self.0
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|(l, s)| *l == level && s == status)
                    .count()
            }
        }

        #[tokio::test]
        async fn test_script_fallback_logs_one_failure_and_one_success() {
            let captured = Captured::default();
            let subscriber = tracing_subscriber::registry().with(captured.clone());
            let _guard = tracing::subscriber::set_default(subscriber);

            let driver = MockDriver::new().with_element(button("b").native_click_fails());
            let report = Interactor::new(&driver)
                .perform(&ElementQuery::id("b"), &WaitCondition::Clickable, quick(), Action::Click)
                .await;

            assert_eq!(report.strategy_used(), Some(ClickStrategy::Script));
            assert_eq!(captured.count(Level::INFO, "info"), 1);
            assert_eq!(captured.count(Level::INFO, "success"), 1);
            assert_eq!(captured.count(Level::ERROR, "error"), 0);
        }

        #[tokio::test]
        async fn test_exhausted_chain_logs_each_failure_then_error() {
            let captured = Captured::default();
            let subscriber = tracing_subscriber::registry().with(captured.clone());
            let _guard = tracing::subscriber::set_default(subscriber);

            let driver = MockDriver::new().with_element(
                button("b")
                    .native_click_fails()
                    .script_click_fails()
                    .pointer_click_fails(),
            );
            let element = driver.find_all(&ElementQuery::id("b")).await.unwrap().remove(0);
            let report = Interactor::new(&driver).click_element(&element, "By.id: b").await;

            assert!(!report.is_success());
            assert_eq!(captured.count(Level::INFO, "info"), 3);
            assert_eq!(captured.count(Level::INFO, "success"), 0);
            assert_eq!(captured.count(Level::ERROR, "error"), 1);
        }
    }

    mod text_tests {
        use super::*;

        #[tokio::test]
        async fn test_set_text_replaces_prior_content() {
            let driver = MockDriver::new().with_element(
                MockElement::new("email", "input")
                    .matching(ElementQuery::id("emailInputOnLoginPage"))
                    .value("OLD"),
            );
            Interactor::new(&driver)
                .type_text(&ElementQuery::id("emailInputOnLoginPage"), "NEW", quick())
                .await
                .unwrap();
            assert_eq!(driver.value_of("email").as_deref(), Some("NEW"));
        }

        #[tokio::test]
        async fn test_set_text_on_disabled_field_fails() {
            let driver = MockDriver::new().with_element(
                MockElement::new("f", "input")
                    .matching(ElementQuery::id("f"))
                    .disabled(),
            );
            let err = Interactor::new(&driver)
                .type_text(&ElementQuery::id("f"), "x", quick())
                .await
                .unwrap_err();
            assert!(err.is_interaction_failure());
        }

        #[tokio::test]
        async fn test_read_text_trims() {
            let driver = MockDriver::new().with_element(
                MockElement::new("t", "span")
                    .matching(ElementQuery::css("span.title"))
                    .text("  Parametreler\n"),
            );
            let text = Interactor::new(&driver)
                .read_text(&ElementQuery::css("span.title"), quick())
                .await
                .unwrap();
            assert_eq!(text, "Parametreler");
        }

        #[tokio::test]
        async fn test_hover() {
            let driver = MockDriver::new().with_element(button("menu"));
            Interactor::new(&driver)
                .hover(&ElementQuery::id("menu"), quick())
                .await
                .unwrap();
            assert!(driver.was_called("hover:menu"));
        }
    }

    mod helper_tests {
        use super::*;
        use crate::mock_driver::ClickReaction;

        #[tokio::test]
        async fn test_select_dropdown_option() {
            let driver = MockDriver::new()
                .with_element(button("toggle").on_click(ClickReaction::Show("item".into())))
                .with_element(
                    MockElement::new("item", "a")
                        .matching(ElementQuery::css("a.dropdown-item"))
                        .hidden(),
                );
            Interactor::new(&driver)
                .select_dropdown_option(
                    &ElementQuery::id("toggle"),
                    &ElementQuery::css("a.dropdown-item"),
                    quick(),
                )
                .await
                .unwrap();
            let clicked: Vec<_> = driver.clicks().into_iter().map(|c| c.element).collect();
            assert_eq!(clicked, vec!["toggle", "item"]);
        }

        #[tokio::test]
        async fn test_remove_overlays_reports_count() {
            let driver = MockDriver::new();
            driver.set_script_result("style.display = 'none'", serde_json::json!(2));
            let hidden = Interactor::new(&driver)
                .remove_overlays(&[".overlay".to_string(), ".modal-backdrop".to_string()])
                .await;
            assert_eq!(hidden, 2);
            assert!(driver.scripts()[0].contains(".overlay, .modal-backdrop"));
        }

        #[tokio::test]
        async fn test_remove_overlays_is_best_effort() {
            let mut driver = MockDriver::new();
            driver.close().await.unwrap();
            let hidden = Interactor::new(&driver)
                .remove_overlays(&[".overlay".to_string()])
                .await;
            assert_eq!(hidden, 0);
        }
    }
}
