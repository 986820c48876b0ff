//! Browser bindings: `document.cookie` and `window.location`.

use tracing::warn;
use wasm_bindgen::JsCast;
use web_sys::HtmlDocument;

use crate::cookie::{Cookie, CookieStore};
use crate::navigation::Navigator;

/// The page's own cookie store.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentCookies;

impl DocumentCookies {
    fn document() -> Option<HtmlDocument> {
        web_sys::window()?.document()?.dyn_into::<HtmlDocument>().ok()
    }
}

impl CookieStore for DocumentCookies {
    fn cookie_header(&self) -> String {
        Self::document()
            .and_then(|doc| doc.cookie().ok())
            .unwrap_or_default()
    }

    fn set(&self, cookie: &Cookie) {
        let Some(doc) = Self::document() else {
            warn!(name = %cookie.name, "No HTML document, cookie not written");
            return;
        };
        if let Err(e) = doc.set_cookie(&cookie.assignment()) {
            warn!(name = %cookie.name, error = ?e, "Browser rejected cookie");
        }
    }
}

/// Navigates the current tab.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn current_url(&self) -> String {
        web_sys::window()
            .and_then(|window| window.location().href().ok())
            .unwrap_or_default()
    }

    fn navigate(&self, url: &str) {
        let Some(window) = web_sys::window() else {
            warn!(to = url, "No window to navigate");
            return;
        };
        if let Err(e) = window.location().set_href(url) {
            warn!(to = url, error = ?e, "Navigation failed");
        }
    }
}
