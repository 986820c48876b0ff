//! Page navigation capability.
//!
//! The envelope guard and logout both move the user to another page. They do
//! it through `Navigator` so the browser location can be swapped for a
//! recorder on native hosts and in tests.

use std::sync::{Mutex, MutexGuard};

use tracing::info;

pub trait Navigator: Send + Sync {
    /// Absolute URL of the page currently shown.
    fn current_url(&self) -> String;

    /// Move to `url`, which may be relative to the current origin.
    fn navigate(&self, url: &str);
}

/// Navigator that records where it was sent instead of leaving the page.
#[derive(Debug)]
pub struct RecordingNavigator {
    state: Mutex<NavigationState>,
}

#[derive(Debug)]
struct NavigationState {
    current: String,
    visited: Vec<String>,
}

impl RecordingNavigator {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(NavigationState {
                current: start_url.into(),
                visited: Vec::new(),
            }),
        }
    }

    /// Every navigation target, oldest first.
    pub fn visited(&self) -> Vec<String> {
        self.state().visited.clone()
    }

    pub fn last_navigation(&self) -> Option<String> {
        self.state().visited.last().cloned()
    }

    /// Pretend the user opened `url` without it counting as a navigation.
    pub fn set_current(&self, url: impl Into<String>) {
        self.state().current = url.into();
    }

    fn state(&self) -> MutexGuard<'_, NavigationState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for RecordingNavigator {
    fn current_url(&self) -> String {
        self.state().current.clone()
    }

    fn navigate(&self, url: &str) {
        info!(to = url, "Navigating");
        let mut state = self.state();
        state.current = resolve_against(&state.current, url);
        state.visited.push(url.to_string());
    }
}

/// Resolve an origin-relative target (`/login`) against the current page URL.
fn resolve_against(current: &str, target: &str) -> String {
    if !target.starts_with('/') {
        return target.to_string();
    }
    match reqwest::Url::parse(current).and_then(|base| base.join(target)) {
        Ok(url) => url.to_string(),
        Err(_) => target.to_string(),
    }
}
