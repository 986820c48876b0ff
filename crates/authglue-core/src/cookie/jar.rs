use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use ::cookie::Cookie as RawCookie;
use cookie_store::{CookieDomain, CookieError, CookieExpiration, StoreAction};
use reqwest::Url;
use tracing::{debug, warn};

use super::options::{Cookie, SameSite};
use super::store::CookieStore;

type Rfc6265Store = cookie_store::CookieStore;

/// Read-only view of one live cookie in a `MemoryCookieJar`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    /// Value exactly as it travels on the wire
    pub value: String,
    pub path: String,
    pub domain: String,
    /// No `Domain` attribute was given, so only `domain` itself matches
    pub host_only: bool,
    /// `None` for session cookies
    pub expires_at: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl StoredCookie {
    fn from_entry(entry: &cookie_store::Cookie<'_>) -> Self {
        let expires_at = match entry.expires {
            CookieExpiration::AtUtc(at) => DateTime::from_timestamp(at.unix_timestamp(), 0),
            CookieExpiration::SessionEnd => None,
        };
        Self {
            name: entry.name().to_string(),
            value: entry.value().to_string(),
            path: String::from(&entry.path),
            domain: String::from(&entry.domain),
            host_only: matches!(entry.domain, CookieDomain::HostOnly(_)),
            expires_at,
            secure: entry.secure().unwrap_or(false),
            http_only: entry.http_only().unwrap_or(false),
            same_site: entry.same_site(),
        }
    }
}

/// Browser-like cookie jar for one page origin.
///
/// Holds both script-visible cookies and HTTP-only cookies set by the server,
/// with RFC 6265 domain, path, secure and expiry rules from `cookie_store`.
/// Script writes are scoped to `origin` the way `document.cookie` scopes
/// them to the page. On native targets the jar doubles as the `reqwest`
/// cookie provider, so requests carry every matching cookie the way a
/// browser with `credentials: "include"` would.
#[derive(Debug)]
pub struct MemoryCookieJar {
    origin: Url,
    store: Mutex<Rfc6265Store>,
}

impl MemoryCookieJar {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            store: Mutex::new(Rfc6265Store::new()),
        }
    }

    /// An empty jar for the page at `origin`, e.g. the configured base URL.
    pub fn for_origin(origin: &str) -> Result<Self> {
        Ok(Self::new(parse_origin(origin)?))
    }

    /// Load a jar from disk, dropping cookies that expired in the meantime.
    pub fn load(path: &Path, origin: &str) -> Result<Self> {
        let origin = parse_origin(origin)?;
        if !path.exists() {
            return Ok(Self::new(origin));
        }
        let file = File::open(path).context("Failed to read cookie jar")?;
        let store = cookie_store::serde::json::load(BufReader::new(file))
            .map_err(|e| anyhow!("Failed to parse cookie jar: {}", e))?;

        debug!(path = %path.display(), count = store.iter_unexpired().count(), "Loaded cookie jar");
        Ok(Self {
            origin,
            store: Mutex::new(store),
        })
    }

    /// Save the jar to disk. Session cookies are kept: one CLI session spans
    /// several runs.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path).context("Failed to write cookie jar")?;
        let mut writer = BufWriter::new(file);
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&self.lock(), &mut writer)
            .map_err(|e| anyhow!("Failed to write cookie jar: {}", e))?;
        writer.flush().context("Failed to write cookie jar")?;
        Ok(())
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// All live cookies, HTTP-only ones included.
    pub fn snapshot(&self) -> Vec<StoredCookie> {
        self.lock().iter_unexpired().map(StoredCookie::from_entry).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().iter_unexpired().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `Cookie` request header for a request to `url`.
    pub fn request_header(&self, url: &Url) -> Option<String> {
        let header = self
            .lock()
            .get_request_values(url)
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }

    fn lock(&self) -> MutexGuard<'_, Rfc6265Store> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn parse_origin(origin: &str) -> Result<Url> {
    let url = Url::parse(origin).with_context(|| format!("Invalid cookie origin: {}", origin))?;
    if url.host_str().is_none() {
        bail!("Cookie origin has no host: {}", origin);
    }
    Ok(url)
}

/// Store a script-side cookie. The caller holds the lock for the whole
/// check-then-insert, so a server write cannot land in between.
fn insert_from_script(
    store: &mut Rfc6265Store,
    origin: &Url,
    raw: RawCookie<'static>,
) -> Result<StoreAction, CookieError> {
    let cookie = cookie_store::Cookie::try_from_raw_cookie(&raw, origin)?;

    // Scripts can neither overwrite nor expire an HTTP-only cookie
    let shadows_http_only = cookie.domain.as_cow().is_some_and(|domain| {
        store
            .get(&domain, cookie.path.as_ref(), cookie.name())
            .is_some_and(|existing| existing.http_only().unwrap_or(false))
    });
    if shadows_http_only {
        return Err(CookieError::NonHttpScheme);
    }
    store.insert(cookie, origin)
}

impl CookieStore for MemoryCookieJar {
    fn cookie_header(&self) -> String {
        self.lock()
            .iter_unexpired()
            .filter(|c| !c.http_only().unwrap_or(false) && c.domain.matches(&self.origin))
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn set(&self, cookie: &Cookie) {
        let raw = match RawCookie::parse(cookie.assignment()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(name = %cookie.name, error = %e, "Ignoring malformed cookie assignment");
                return;
            }
        };

        let mut store = self.lock();
        match insert_from_script(&mut store, &self.origin, raw) {
            Ok(action) => debug!(name = %cookie.name, ?action, "Script set cookie"),
            Err(e) => debug!(name = %cookie.name, error = %e, "Script cookie not stored"),
        }
    }
}

impl reqwest::cookie::CookieStore for MemoryCookieJar {
    fn set_cookies(
        &self,
        cookie_headers: &mut dyn Iterator<Item = &reqwest::header::HeaderValue>,
        url: &Url,
    ) {
        let mut store = self.lock();
        for header in cookie_headers {
            let raw = header
                .to_str()
                .ok()
                .and_then(|value| RawCookie::parse(value.to_string()).ok());
            let Some(raw) = raw else {
                warn!(url = %url, "Ignoring malformed Set-Cookie header");
                continue;
            };

            match store.insert_raw(&raw, url) {
                Ok(action) => debug!(
                    name = raw.name(),
                    http_only = raw.http_only().unwrap_or(false),
                    ?action,
                    "Server set cookie"
                ),
                Err(e) => debug!(name = raw.name(), error = %e, "Server cookie not stored"),
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<reqwest::header::HeaderValue> {
        let header = self.request_header(url)?;
        reqwest::header::HeaderValue::from_str(&header).ok()
    }
}

#[cfg(test)]
impl MemoryCookieJar {
    /// Jar for a page served from `http://localhost:8080`.
    pub(crate) fn localhost() -> Self {
        Self::for_origin("http://localhost:8080").expect("static origin")
    }
}
