//! authglue - client-side authentication presentation helpers.
//!
//! Keeps a display profile in a script-readable cookie, wraps requests so
//! the server's session cookie always travels with them, and turns the
//! server's "not logged in" response into a trip to the login page.
//!
//! Build one `AuthKit` at startup and hand references to whatever needs it.

pub mod api;
pub mod auth;
pub mod config;
pub mod cookie;
pub mod navigation;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

use std::sync::Arc;

pub use api::{ApiError, AuthClient, EnvelopeGuard, EnvelopeStatus, RequestOptions};
pub use auth::{AuthPresentationStore, StoreError, SubscriptionId, UserInfoUpdated, UserProfile};
pub use config::Config;
#[cfg(not(target_arch = "wasm32"))]
pub use self::cookie::MemoryCookieJar;
pub use self::cookie::{Cookie, CookieOptions, CookieStore, SameSite};
pub use navigation::{Navigator, RecordingNavigator};

/// The auth service: presentation store, envelope guard and client wired
/// to one cookie store and one navigator.
pub struct AuthKit {
    config: Config,
    store: Arc<AuthPresentationStore>,
    client: AuthClient,
    navigator: Arc<dyn Navigator>,
}

impl AuthKit {
    /// Wire the service around `cookies`.
    ///
    /// In the browser, `fetch` and `document.cookie` already share one jar.
    /// On native targets the HTTP client cannot read an arbitrary
    /// `CookieStore`, so it gets a separate in-memory one: cookies written
    /// through `store()` are not sent with requests, and cookies the server
    /// sets never show up in `store()`. Use `with_jar` when both sides must
    /// see the same cookies.
    pub fn new(
        config: Config,
        cookies: Arc<dyn CookieStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        #[cfg(not(target_arch = "wasm32"))]
        let http = AuthClient::http_client(&config, None)?;
        #[cfg(target_arch = "wasm32")]
        let http = AuthClient::http_client(&config)?;
        Self::assemble(config, cookies, navigator, http)
    }

    /// Wire the service around a jar that scripts and HTTP requests share,
    /// the way a browser's cookie store works.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_jar(
        config: Config,
        jar: Arc<MemoryCookieJar>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let http = AuthClient::http_client(&config, Some(Arc::clone(&jar)))?;
        Self::assemble(config, jar, navigator, http)
    }

    /// Wire the service to the current page.
    #[cfg(all(feature = "web", target_arch = "wasm32"))]
    pub fn browser(config: Config) -> Result<Self, ApiError> {
        Self::new(
            config,
            Arc::new(web::DocumentCookies),
            Arc::new(web::BrowserNavigator),
        )
    }

    fn assemble(
        config: Config,
        cookies: Arc<dyn CookieStore>,
        navigator: Arc<dyn Navigator>,
        http: reqwest::Client,
    ) -> Result<Self, ApiError> {
        let store = Arc::new(AuthPresentationStore::new(Arc::clone(&cookies), &config));
        let guard = EnvelopeGuard::new(cookies, Arc::clone(&navigator), &config);
        let client = AuthClient::new(&config, http, Arc::clone(&store), guard, Arc::clone(&navigator))?;

        Ok(Self {
            config,
            store,
            client,
            navigator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &AuthPresentationStore {
        &self.store
    }

    /// Shared handle to the store, for listeners that outlive a borrow.
    pub fn store_handle(&self) -> Arc<AuthPresentationStore> {
        Arc::clone(&self.store)
    }

    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Interpret an already-decoded response envelope.
    pub fn handle_api_response(&self, body: serde_json::Value) -> Result<serde_json::Value, ApiError> {
        self.client.guard().handle(body)
    }
}
