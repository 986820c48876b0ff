//! Authenticated fetch and logout.
//!
//! Every request carries the browser's cookies, so the server sees its
//! HTTP-only session cookie. Callers cannot opt out: `RequestOptions` has no
//! credentials setting.

use std::sync::Arc;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{ApiError, EnvelopeGuard};
use crate::auth::{AuthPresentationStore, UserProfile};
use crate::config::Config;
#[cfg(not(target_arch = "wasm32"))]
use crate::cookie::MemoryCookieJar;
use crate::navigation::Navigator;

/// Method, headers and JSON body of a request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// HTTP client for the application server.
pub struct AuthClient {
    http: Client,
    base_url: Url,
    login_endpoint: String,
    logout_endpoint: String,
    home_page: String,
    store: Arc<AuthPresentationStore>,
    guard: EnvelopeGuard,
    navigator: Arc<dyn Navigator>,
}

impl AuthClient {
    pub fn new(
        config: &Config,
        http: Client,
        store: Arc<AuthPresentationStore>,
        guard: EnvelopeGuard,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        Ok(Self {
            http,
            base_url,
            login_endpoint: config.login_endpoint.clone(),
            logout_endpoint: config.logout_endpoint.clone(),
            home_page: config.home_page.clone(),
            store,
            guard,
            navigator,
        })
    }

    /// Build the underlying `reqwest` client.
    ///
    /// On native targets cookies go through `jar` when given (so scripts and
    /// requests share one store), otherwise through reqwest's own store.
    /// In the browser, `fetch` uses the page's cookies.
    pub fn http_client(
        config: &Config,
        #[cfg(not(target_arch = "wasm32"))] jar: Option<Arc<MemoryCookieJar>>,
    ) -> Result<Client, ApiError> {
        #[allow(unused_mut)]
        let mut builder = Client::builder();

        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = match jar {
                Some(jar) => builder.cookie_provider(jar),
                None => builder.cookie_store(true),
            };
            if let Some(secs) = config.request_timeout_secs {
                builder = builder.timeout(Duration::from_secs(secs));
            }
        }
        #[cfg(target_arch = "wasm32")]
        let _ = config;

        Ok(builder.build()?)
    }

    pub fn guard(&self) -> &EnvelopeGuard {
        &self.guard
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `url` against the base URL; absolute URLs are kept.
    pub fn resolve(&self, url: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", url, e)))
    }

    /// Send a request with credentials, parse the body as JSON and run it
    /// through the envelope guard.
    ///
    /// The HTTP status is not checked; only the envelope decides success.
    /// Transport and JSON errors come back as `ApiError::Network`.
    pub async fn fetch(&self, url: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let url = self.resolve(url)?;
        debug!(method = %options.method, url = %url, "Sending request");

        let mut request = self
            .http
            .request(options.method, url.clone())
            .headers(options.headers);
        if let Some(ref body) = options.body {
            request = request.json(body);
        }
        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        let response = request.send().await?;
        debug!(url = %url, status = %response.status(), "Received response");
        let body: Value = response.json().await?;

        self.guard.handle(body)
    }

    pub async fn get(&self, url: &str) -> Result<Value, ApiError> {
        self.fetch(url, RequestOptions::get()).await
    }

    pub async fn post(&self, url: &str, body: Value) -> Result<Value, ApiError> {
        self.fetch(url, RequestOptions::post_json(body)).await
    }

    /// Fetch and deserialize the envelope's `data` member.
    pub async fn fetch_data<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let body = self.fetch(url, options).await?;
        let data = body.get("data").cloned().unwrap_or(Value::Null);
        serde_json::from_value(data.clone()).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "{}: {}",
                e,
                ApiError::truncate_body(&data.to_string())
            ))
        })
    }

    /// Log in and store the returned profile for display.
    ///
    /// The server answers with its session cookie and the profile in `data`.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile, ApiError> {
        let body = json!({ "username": username, "password": password });
        let profile: Option<UserProfile> = self
            .fetch_data(&self.login_endpoint, RequestOptions::post_json(body))
            .await?;

        self.store.set_user_info(profile.as_ref());
        match profile {
            Some(profile) => {
                info!(username = ?profile.username(), "Logged in");
                Ok(profile)
            }
            None => Err(ApiError::InvalidResponse(
                "Login response carried no user info".to_string(),
            )),
        }
    }

    /// Tell the server to end the session, then clear the profile and go home.
    ///
    /// The cleanup runs however the call ends, including when the server is
    /// unreachable or this future is dropped, so logout never fails.
    pub async fn logout(&self) {
        let _cleanup = LogoutCleanup {
            store: self.store.as_ref(),
            navigator: self.navigator.as_ref(),
            home_page: &self.home_page,
        };

        match self.send_logout().await {
            Ok(status) => debug!(status = %status, "Logout request completed"),
            Err(e) => warn!(error = %e, "Logout request failed, clearing local state anyway"),
        }
    }

    async fn send_logout(&self) -> Result<reqwest::StatusCode, ApiError> {
        let url = self.resolve(&self.logout_endpoint)?;
        let request = self.http.post(url);
        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        let response = request.send().await?;
        Ok(response.status())
    }
}

struct LogoutCleanup<'a> {
    store: &'a AuthPresentationStore,
    navigator: &'a dyn Navigator,
    home_page: &'a str,
}

impl Drop for LogoutCleanup<'_> {
    fn drop(&mut self) {
        self.store.remove_user_info();
        self.navigator.navigate(self.home_page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::{CookieStore, MemoryCookieJar};
    use crate::navigation::RecordingNavigator;

    fn client(base_url: &str) -> AuthClient {
        let config = Config {
            base_url: base_url.to_string(),
            ..Config::default()
        };
        let jar: Arc<dyn CookieStore> = Arc::new(MemoryCookieJar::localhost());
        let nav: Arc<dyn Navigator> = Arc::new(RecordingNavigator::new("http://localhost/"));
        let store = Arc::new(AuthPresentationStore::new(jar.clone(), &config));
        let guard = EnvelopeGuard::new(jar, nav.clone(), &config);
        let http = AuthClient::http_client(&config, None).expect("client");
        AuthClient::new(&config, http, store, guard, nav).expect("auth client")
    }

    #[test]
    fn test_resolve() {
        let client = client("https://blog.example.com");
        assert_eq!(
            client.resolve("/api/articles?page=2").expect("url").as_str(),
            "https://blog.example.com/api/articles?page=2"
        );
        assert_eq!(
            client.resolve("https://cdn.example.com/x").expect("url").as_str(),
            "https://cdn.example.com/x"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = Config {
            base_url: "not a url".to_string(),
            ..Config::default()
        };
        let jar: Arc<dyn CookieStore> = Arc::new(MemoryCookieJar::localhost());
        let nav: Arc<dyn Navigator> = Arc::new(RecordingNavigator::new("/"));
        let store = Arc::new(AuthPresentationStore::new(jar.clone(), &config));
        let guard = EnvelopeGuard::new(jar, nav.clone(), &config);
        let http = AuthClient::http_client(&config, None).expect("client");

        let result = AuthClient::new(&config, http, store, guard, nav);
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_request_options() {
        let options = RequestOptions::post_json(json!({"title": "Hi"}))
            .method(Method::PUT)
            .header(reqwest::header::ACCEPT, HeaderValue::from_static("application/json"));
        assert_eq!(options.method, Method::PUT);
        assert_eq!(options.body, Some(json!({"title": "Hi"})));
        assert_eq!(options.headers.len(), 1);
        assert_eq!(RequestOptions::get().method, Method::GET);
    }
}
