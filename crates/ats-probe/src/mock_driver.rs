//! Mock driver for unit testing
//!
//! A scripted, in-memory page. Elements are registered against the exact
//! queries that should resolve them, so no selector engine is involved: a
//! query matches an element when it compares equal to one of the element's
//! registered queries.
//!
//! The mock is a cheap handle over shared state. Clone it before handing it
//! to a session and keep the clone to inspect calls afterwards.

use crate::driver::{BrowserDriver, ElementHandle};
use crate::query::ElementQuery;
use crate::result::{ProbeError, ProbeResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What a successful click does to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickReaction {
    /// Change the current URL
    Navigate(String),
    /// Make an element visible (and present)
    Show(String),
    /// Hide an element
    Hide(String),
    /// Remove an element from the page
    Remove(String),
    /// Change the page title
    SetTitle(String),
}

/// An element on the mock page
#[derive(Debug, Clone)]
pub struct MockElement {
    id: String,
    tag_name: String,
    matches: Vec<ElementQuery>,
    text: String,
    value: String,
    attributes: BTreeMap<String, String>,
    displayed: bool,
    enabled: bool,
    removed: bool,
    parent: Option<String>,
    present_after_lookups: u32,
    present_after_scrolls: u32,
    native_fails: bool,
    script_fails: bool,
    pointer_fails: bool,
    reactions: Vec<ClickReaction>,
}

impl MockElement {
    /// Create a visible, enabled element
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            matches: Vec::new(),
            text: String::new(),
            value: String::new(),
            attributes: BTreeMap::new(),
            displayed: true,
            enabled: true,
            removed: false,
            parent: None,
            present_after_lookups: 0,
            present_after_scrolls: 0,
            native_fails: false,
            script_fails: false,
            pointer_fails: false,
            reactions: Vec::new(),
        }
    }

    /// Resolve this element for `query`
    #[must_use]
    pub fn matching(mut self, query: ElementQuery) -> Self {
        self.matches.push(query);
        self
    }

    /// Rendered text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Initial form value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.attributes.insert(name.into(), value.into());
        self
    }

    /// Present in the DOM but not rendered
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Rendered but not accepting input
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Nest under another element
    #[must_use]
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Only resolvable once the page has served `lookups` queries
    #[must_use]
    pub const fn appears_after_lookups(mut self, lookups: u32) -> Self {
        self.present_after_lookups = lookups;
        self
    }

    /// Only resolvable once the page has been scrolled `scrolls` times
    #[must_use]
    pub const fn appears_after_scrolls(mut self, scrolls: u32) -> Self {
        self.present_after_scrolls = scrolls;
        self
    }

    /// Driver-native clicks throw
    #[must_use]
    pub const fn native_click_fails(mut self) -> Self {
        self.native_fails = true;
        self
    }

    /// Script clicks throw
    #[must_use]
    pub const fn script_click_fails(mut self) -> Self {
        self.script_fails = true;
        self
    }

    /// Pointer clicks throw
    #[must_use]
    pub const fn pointer_click_fails(mut self) -> Self {
        self.pointer_fails = true;
        self
    }

    /// Apply `reaction` after every successful click
    #[must_use]
    pub fn on_click(mut self, reaction: ClickReaction) -> Self {
        self.reactions.push(reaction);
        self
    }

    fn handle(&self) -> ElementHandle {
        ElementHandle::new(self.id.clone(), self.tag_name.clone())
    }
}

/// A click the mock accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockClick {
    /// Element id
    pub element: String,
    /// `native`, `script` or `pointer`
    pub method: &'static str,
}

#[derive(Debug)]
struct MockState {
    url: String,
    title: String,
    elements: Vec<MockElement>,
    back_stack: Vec<String>,
    forward_stack: Vec<String>,
    call_history: Vec<String>,
    scripts: Vec<String>,
    script_results: Vec<(String, serde_json::Value)>,
    default_script_result: serde_json::Value,
    clicks: Vec<MockClick>,
    lookups: u32,
    scrolls: u32,
    screenshot: Vec<u8>,
    closed: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            url: "about:blank".to_string(),
            title: String::new(),
            elements: Vec::new(),
            back_stack: Vec::new(),
            forward_stack: Vec::new(),
            call_history: Vec::new(),
            scripts: Vec::new(),
            script_results: Vec::new(),
            default_script_result: serde_json::Value::Bool(true),
            clicks: Vec::new(),
            lookups: 0,
            scrolls: 0,
            screenshot: vec![0x89, 0x50, 0x4E, 0x47],
            closed: false,
        }
    }
}

impl MockState {
    fn element(&self, id: &str) -> ProbeResult<&MockElement> {
        self.elements
            .iter()
            .find(|e| e.id == id && self.is_present(e))
            .ok_or_else(|| ProbeError::driver(format!("stale element reference: {id}")))
    }

    fn element_mut(&mut self, id: &str) -> ProbeResult<&mut MockElement> {
        let (lookups, scrolls) = (self.lookups, self.scrolls);
        self.elements
            .iter_mut()
            .find(|e| e.id == id && present(e, lookups, scrolls))
            .ok_or_else(|| ProbeError::driver(format!("stale element reference: {id}")))
    }

    fn is_present(&self, element: &MockElement) -> bool {
        present(element, self.lookups, self.scrolls)
    }

    fn is_descendant(&self, element: &MockElement, ancestor: &str) -> bool {
        let mut current = element.parent.clone();
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self
                .elements
                .iter()
                .find(|e| e.id == id)
                .and_then(|e| e.parent.clone());
        }
        false
    }

    fn ensure_open(&self) -> ProbeResult<()> {
        if self.closed {
            Err(ProbeError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn record_click(&mut self, id: &str, method: &'static str) {
        self.clicks.push(MockClick {
            element: id.to_string(),
            method,
        });
        self.call_history.push(format!("click:{method}:{id}"));
        let reactions = self
            .elements
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.reactions.clone())
            .unwrap_or_default();
        for reaction in reactions {
            self.apply(reaction);
        }
    }

    fn apply(&mut self, reaction: ClickReaction) {
        match reaction {
            ClickReaction::Navigate(url) => {
                let previous = std::mem::replace(&mut self.url, url);
                self.back_stack.push(previous);
                self.forward_stack.clear();
            }
            ClickReaction::Show(id) => {
                if let Some(e) = self.elements.iter_mut().find(|e| e.id == id) {
                    e.displayed = true;
                    e.removed = false;
                    e.present_after_lookups = 0;
                    e.present_after_scrolls = 0;
                }
            }
            ClickReaction::Hide(id) => {
                if let Some(e) = self.elements.iter_mut().find(|e| e.id == id) {
                    e.displayed = false;
                }
            }
            ClickReaction::Remove(id) => {
                if let Some(e) = self.elements.iter_mut().find(|e| e.id == id) {
                    e.removed = true;
                }
            }
            ClickReaction::SetTitle(title) => self.title = title,
        }
    }
}

fn present(element: &MockElement, lookups: u32, scrolls: u32) -> bool {
    !element.removed
        && lookups >= element.present_after_lookups
        && scrolls >= element.present_after_scrolls
}

/// Mock driver for unit testing
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    /// Create new mock driver on `about:blank`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a mock element
    pub fn add_element(&self, element: MockElement) {
        self.state().elements.push(element);
    }

    /// Builder-style [`add_element`](Self::add_element)
    #[must_use]
    pub fn with_element(self, element: MockElement) -> Self {
        self.add_element(element);
        self
    }

    /// Set the current URL without recording a navigation
    pub fn set_url(&self, url: impl Into<String>) {
        self.state().url = url.into();
    }

    /// Set the page title
    pub fn set_title(&self, title: impl Into<String>) {
        self.state().title = title.into();
    }

    /// Return `result` for scripts containing `pattern`
    pub fn set_script_result(&self, pattern: impl Into<String>, result: serde_json::Value) {
        self.state().script_results.push((pattern.into(), result));
    }

    /// Result for scripts no pattern matches (defaults to `true`)
    pub fn set_default_script_result(&self, result: serde_json::Value) {
        self.state().default_script_result = result;
    }

    /// Current URL
    #[must_use]
    pub fn url(&self) -> String {
        self.state().url.clone()
    }

    /// Current value of an element's form field
    #[must_use]
    pub fn value_of(&self, id: &str) -> Option<String> {
        self.state()
            .elements
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.value.clone())
    }

    /// Whether an element is currently displayed
    #[must_use]
    pub fn is_shown(&self, id: &str) -> bool {
        self.state()
            .elements
            .iter()
            .any(|e| e.id == id && e.displayed && !e.removed)
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.state().call_history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state()
            .call_history
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Scripts evaluated so far
    #[must_use]
    pub fn scripts(&self) -> Vec<String> {
        self.state().scripts.clone()
    }

    /// Clicks accepted so far
    #[must_use]
    pub fn clicks(&self) -> Vec<MockClick> {
        self.state().clicks.clone()
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Number of scroll scripts evaluated
    #[must_use]
    pub fn scroll_count(&self) -> u32 {
        self.state().scrolls
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn navigate(&self, url: &str) -> ProbeResult<()> {
        let mut state = self.state();
        state.ensure_open()?;
        state.call_history.push(format!("navigate:{url}"));
        let previous = std::mem::replace(&mut state.url, url.to_string());
        state.back_stack.push(previous);
        state.forward_stack.clear();
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        let state = self.state();
        state.ensure_open()?;
        Ok(state.url.clone())
    }

    async fn title(&self) -> ProbeResult<String> {
        let state = self.state();
        state.ensure_open()?;
        Ok(state.title.clone())
    }

    async fn reload(&self) -> ProbeResult<()> {
        let mut state = self.state();
        state.ensure_open()?;
        state.call_history.push("reload".to_string());
        Ok(())
    }

    async fn go_back(&self) -> ProbeResult<()> {
        let mut state = self.state();
        state.ensure_open()?;
        state.call_history.push("go_back".to_string());
        if let Some(previous) = state.back_stack.pop() {
            let current = std::mem::replace(&mut state.url, previous);
            state.forward_stack.push(current);
        }
        Ok(())
    }

    async fn go_forward(&self) -> ProbeResult<()> {
        let mut state = self.state();
        state.ensure_open()?;
        state.call_history.push("go_forward".to_string());
        if let Some(next) = state.forward_stack.pop() {
            let current = std::mem::replace(&mut state.url, next);
            state.back_stack.push(current);
        }
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> ProbeResult<serde_json::Value> {
        let mut state = self.state();
        state.ensure_open()?;
        state.scripts.push(script.to_string());
        if script.contains("scroll") {
            state.scrolls += 1;
        }
        let result = state
            .script_results
            .iter()
            .find(|(pattern, _)| script.contains(pattern.as_str()))
            .map_or_else(|| state.default_script_result.clone(), |(_, v)| v.clone());
        Ok(result)
    }

    async fn find_all(&self, query: &ElementQuery) -> ProbeResult<Vec<ElementHandle>> {
        let mut state = self.state();
        state.ensure_open()?;
        state.lookups += 1;
        Ok(state
            .elements
            .iter()
            .filter(|e| state.is_present(e) && e.matches.contains(query))
            .map(MockElement::handle)
            .collect())
    }

    async fn find_within(
        &self,
        parent: &ElementHandle,
        query: &ElementQuery,
    ) -> ProbeResult<Vec<ElementHandle>> {
        let mut state = self.state();
        state.ensure_open()?;
        let _ = state.element(&parent.id)?;
        state.lookups += 1;
        Ok(state
            .elements
            .iter()
            .filter(|e| {
                state.is_present(e) && e.matches.contains(query) && state.is_descendant(e, &parent.id)
            })
            .map(MockElement::handle)
            .collect())
    }

    async fn parent_of(&self, element: &ElementHandle) -> ProbeResult<Option<ElementHandle>> {
        let state = self.state();
        let parent = state.element(&element.id)?.parent.clone();
        Ok(parent.and_then(|id| {
            state
                .elements
                .iter()
                .find(|e| e.id == id && state.is_present(e))
                .map(MockElement::handle)
        }))
    }

    async fn is_displayed(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.state().element(&element.id)?.displayed)
    }

    async fn is_enabled(&self, element: &ElementHandle) -> ProbeResult<bool> {
        Ok(self.state().element(&element.id)?.enabled)
    }

    async fn text(&self, element: &ElementHandle) -> ProbeResult<String> {
        Ok(self.state().element(&element.id)?.text.clone())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> ProbeResult<Option<String>> {
        Ok(self
            .state()
            .element(&element.id)?
            .attributes
            .get(name)
            .cloned())
    }

    async fn value(&self, element: &ElementHandle) -> ProbeResult<String> {
        Ok(self.state().element(&element.id)?.value.clone())
    }

    async fn native_click(&self, element: &ElementHandle) -> ProbeResult<()> {
        let mut state = self.state();
        let e = state.element(&element.id)?;
        if e.native_fails {
            return Err(ProbeError::driver(format!(
                "element click intercepted: {}",
                element.id
            )));
        }
        if !e.displayed {
            return Err(ProbeError::driver(format!(
                "element not interactable: {}",
                element.id
            )));
        }
        state.record_click(&element.id, "native");
        Ok(())
    }

    async fn script_click(&self, element: &ElementHandle) -> ProbeResult<()> {
        let mut state = self.state();
        if state.element(&element.id)?.script_fails {
            return Err(ProbeError::driver(format!(
                "script click rejected: {}",
                element.id
            )));
        }
        state.record_click(&element.id, "script");
        Ok(())
    }

    async fn pointer_click(&self, element: &ElementHandle) -> ProbeResult<()> {
        let mut state = self.state();
        let e = state.element(&element.id)?;
        if e.pointer_fails || !e.displayed {
            return Err(ProbeError::driver(format!(
                "move target out of bounds: {}",
                element.id
            )));
        }
        state.record_click(&element.id, "pointer");
        Ok(())
    }

    async fn move_pointer(&self, element: &ElementHandle) -> ProbeResult<()> {
        let mut state = self.state();
        let _ = state.element(&element.id)?;
        state.call_history.push(format!("hover:{}", element.id));
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> ProbeResult<()> {
        let mut state = self.state();
        let e = state.element_mut(&element.id)?;
        if !e.enabled {
            return Err(ProbeError::driver(format!(
                "invalid element state: {} is disabled",
                element.id
            )));
        }
        e.value.clear();
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> ProbeResult<()> {
        let mut state = self.state();
        let e = state.element_mut(&element.id)?;
        if !e.enabled {
            return Err(ProbeError::driver(format!(
                "invalid element state: {} is disabled",
                element.id
            )));
        }
        e.value.push_str(text);
        Ok(())
    }

    async fn scroll_into_view(&self, element: &ElementHandle) -> ProbeResult<()> {
        let mut state = self.state();
        let _ = state.element(&element.id)?;
        state.call_history.push(format!("scroll_into_view:{}", element.id));
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        let state = self.state();
        state.ensure_open()?;
        Ok(state.screenshot.clone())
    }

    async fn clear_cookies(&self) -> ProbeResult<()> {
        let mut state = self.state();
        state.ensure_open()?;
        state.call_history.push("clear_cookies".to_string());
        Ok(())
    }

    async fn close(&mut self) -> ProbeResult<()> {
        let mut state = self.state();
        state.call_history.push("close".to_string());
        state.closed = true;
        Ok(())
    }
}
