use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::events::{Listeners, SubscriptionId, UserInfoUpdated};
use super::profile::UserProfile;
use crate::config::Config;
use crate::cookie::{decode_component, Cookie, CookieOptions, CookieStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Stored user info is not valid JSON: {0}")]
    CorruptProfile(#[source] serde_json::Error),

    #[error("Failed to serialize user info: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Reads and writes the `user_info` presentation cookie.
///
/// Built once at startup around an injected cookie store and shared by
/// reference with everything that shows or edits the profile.
pub struct AuthPresentationStore {
    cookies: Arc<dyn CookieStore>,
    cookie_name: String,
    max_age_secs: i64,
    listeners: Listeners,
}

impl AuthPresentationStore {
    pub fn new(cookies: Arc<dyn CookieStore>, config: &Config) -> Self {
        Self {
            cookies,
            cookie_name: config.user_info_cookie.clone(),
            max_age_secs: config.user_info_max_age_secs,
            listeners: Listeners::default(),
        }
    }

    pub fn cookies(&self) -> &Arc<dyn CookieStore> {
        &self.cookies
    }

    /// Store the profile for 7 days. `None` is ignored.
    pub fn set_user_info(&self, profile: Option<&UserProfile>) {
        let Some(profile) = profile else {
            warn!("Attempting to store missing user info");
            return;
        };
        if let Err(e) = self.write_profile(profile) {
            error!(error = %e, "Failed to store user info");
        }
    }

    /// The stored profile, or `None` when absent, empty, or corrupt.
    pub fn get_user_info(&self) -> Option<UserProfile> {
        match self.try_user_info() {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Treating unreadable user info as absent");
                None
            }
        }
    }

    /// Like `get_user_info`, but reports a corrupt cookie instead of hiding it.
    pub fn try_user_info(&self) -> Result<Option<UserProfile>, StoreError> {
        let raw = match self.cookies.get_raw(&self.cookie_name) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };
        let json = decode_component(&raw);
        let profile: Option<UserProfile> =
            serde_json::from_str(&json).map_err(StoreError::CorruptProfile)?;
        debug!(username = ?profile.as_ref().and_then(|p| p.username()), "Read user info");
        Ok(profile)
    }

    /// Expire the profile cookie
    pub fn remove_user_info(&self) {
        debug!("Removing user info");
        self.cookies.remove(&self.cookie_name, "/");
    }

    /// True when any profile data is stored.
    pub fn is_authenticated(&self) -> bool {
        self.get_user_info().map(|p| !p.is_empty()).unwrap_or(false)
    }

    /// True when a usable profile (one with a username) is stored. Never fails.
    pub fn init(&self) -> bool {
        match self.try_user_info() {
            Ok(Some(profile)) if profile.is_valid() => {
                info!("Auth presentation state initialized");
                true
            }
            Ok(_) => {
                debug!("No usable user info stored");
                false
            }
            Err(e) => {
                error!(error = %e, "Error initializing auth presentation state");
                false
            }
        }
    }

    /// Merge the editable fields of `update` into the stored profile, persist
    /// it, then notify subscribers. Does nothing without an update or without
    /// a stored profile.
    pub fn update_user_info(&self, update: Option<&UserProfile>) {
        let Some(update) = update else {
            return;
        };
        let Some(current) = self.get_user_info() else {
            return;
        };

        let merged = current.merged_with(update);
        self.set_user_info(Some(&merged));
        info!(username = ?merged.username(), "User info updated in cookie");

        self.listeners.emit(&UserInfoUpdated {
            new_user_info: merged,
        });

        if let Some(new_name) = update.username() {
            if Some(new_name) != current.username() {
                // Listeners refresh what they show; no reload is performed.
                debug!(from = ?current.username(), to = new_name, "Username changed");
            }
        }
    }

    /// Register a listener for profile updates.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&UserInfoUpdated) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Decoded value of the first cookie named `name`.
    pub fn get_cookie(&self, name: &str) -> Option<String> {
        self.cookies.get_raw(name).map(|raw| decode_component(&raw))
    }

    /// Write a cookie with exactly the attributes given in `options`.
    pub fn set_cookie(&self, name: &str, value: &str, options: &CookieOptions) {
        self.cookies.set(&Cookie::new(name, value, options.clone()));
    }

    fn write_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let json = serde_json::to_string(profile).map_err(StoreError::Serialize)?;
        let options = CookieOptions::new().path("/").max_age(self.max_age_secs);
        self.cookies.set(&Cookie::new(self.cookie_name.as_str(), json, options));
        debug!(username = ?profile.username(), "Stored user info");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::cookie::MemoryCookieJar;
    use serde_json::json;

    fn store() -> (Arc<MemoryCookieJar>, AuthPresentationStore) {
        let jar = Arc::new(MemoryCookieJar::localhost());
        let store = AuthPresentationStore::new(jar.clone(), &Config::default());
        (jar, store)
    }

    #[test]
    fn test_set_then_get_returns_same_profile() {
        let (_, store) = store();
        let profile = UserProfile::new("alice")
            .with_email("a@x.com")
            .with_bio("Writes about Rust; sometimes = signs")
            .with_field("userId", json!(12))
            .with_field("roles", json!(["author", "admin"]));

        store.set_user_info(Some(&profile));
        assert_eq!(store.get_user_info(), Some(profile));
    }

    #[test]
    fn test_cookie_layout() {
        let (jar, store) = store();
        store.set_user_info(Some(&UserProfile::new("alice")));

        let stored = jar.snapshot();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "user_info");
        assert_eq!(stored[0].path, "/");
        assert_eq!(stored[0].value, "%7B%22username%22%3A%22alice%22%7D");
        let expires = stored[0].expires_at.expect("max-age applied");
        let remaining = expires - chrono::Utc::now();
        assert!(remaining.num_seconds() > 604_700 && remaining.num_seconds() <= 604_800);
    }

    #[test]
    fn test_set_none_is_noop() {
        let (_, store) = store();
        store.set_user_info(Some(&UserProfile::new("alice")));
        store.set_user_info(None);
        assert_eq!(store.get_user_info(), Some(UserProfile::new("alice")));
    }

    #[test]
    fn test_remove() {
        let (_, store) = store();
        store.set_user_info(Some(&UserProfile::new("alice")));
        assert!(store.is_authenticated());

        store.remove_user_info();
        assert_eq!(store.get_user_info(), None);
        assert!(!store.is_authenticated());
        assert!(!store.init());
    }

    #[test]
    fn test_empty_or_null_cookie_means_no_profile() {
        let (jar, store) = store();
        jar.set(&Cookie::new("user_info", "", CookieOptions::new().path("/")));
        assert_eq!(store.get_user_info(), None);

        jar.set(&Cookie::new("user_info", "null", CookieOptions::new().path("/")));
        assert_eq!(store.get_user_info(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_corrupt_cookie() {
        let (jar, store) = store();
        jar.set(&Cookie::new("user_info", "{broken", CookieOptions::new().path("/")));

        assert_eq!(store.get_user_info(), None);
        assert!(matches!(store.try_user_info(), Err(StoreError::CorruptProfile(_))));
        assert!(!store.is_authenticated());
        assert!(!store.init());
    }

    #[test]
    fn test_init_requires_username() {
        let (_, store) = store();
        assert!(!store.init());

        store.set_user_info(Some(&UserProfile::default().with_email("a@x.com")));
        assert!(store.is_authenticated());
        assert!(!store.init());

        store.set_user_info(Some(&UserProfile::new("")));
        assert!(!store.init());

        store.set_user_info(Some(&UserProfile::new("alice")));
        assert!(store.init());
    }

    #[test]
    fn test_empty_object_is_not_authenticated() {
        let (jar, store) = store();
        jar.set(&Cookie::new("user_info", "{}", CookieOptions::new().path("/")));
        assert_eq!(store.get_user_info(), Some(UserProfile::default()));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_update_merges_and_preserves() {
        let (_, store) = store();
        store.set_user_info(Some(&UserProfile::new("alice").with_email("a@x.com")));

        store.update_user_info(Some(&UserProfile::new("bob")));
        assert_eq!(
            store.get_user_info(),
            Some(UserProfile::new("bob").with_email("a@x.com"))
        );
    }

    #[test]
    fn test_update_without_input_or_profile_is_noop() {
        let (jar, store) = store();
        let notified = Arc::new(Mutex::new(0));
        {
            let notified = Arc::clone(&notified);
            store.subscribe(move |_| *notified.lock().unwrap() += 1);
        }

        store.update_user_info(Some(&UserProfile::new("bob")));
        assert_eq!(store.get_user_info(), None);
        assert!(jar.is_empty());

        store.set_user_info(Some(&UserProfile::new("alice")));
        store.update_user_info(None);
        assert_eq!(store.get_user_info(), Some(UserProfile::new("alice")));

        assert_eq!(*notified.lock().unwrap(), 0);
    }

    #[test]
    fn test_listener_sees_persisted_profile() {
        let jar = Arc::new(MemoryCookieJar::localhost());
        let store = Arc::new(AuthPresentationStore::new(jar, &Config::default()));
        store.set_user_info(Some(&UserProfile::new("alice").with_avatar_url("/a.png")));

        let observed = Arc::new(Mutex::new(Vec::new()));
        let id = {
            let observed = Arc::clone(&observed);
            let reader = Arc::clone(&store);
            store.subscribe(move |event| {
                observed
                    .lock()
                    .unwrap()
                    .push((event.new_user_info.clone(), reader.get_user_info()));
            })
        };

        store.update_user_info(Some(&UserProfile::default().with_avatar_url("/b.png")));
        {
            let observed = observed.lock().unwrap();
            assert_eq!(observed.len(), 1);
            let (event_profile, persisted) = &observed[0];
            assert_eq!(event_profile.avatar_url.as_deref(), Some("/b.png"));
            assert_eq!(persisted.as_ref(), Some(event_profile));
        }

        assert!(store.unsubscribe(id));
        store.update_user_info(Some(&UserProfile::new("carol")));
        assert_eq!(observed.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_generic_cookie_helpers() {
        let (_, store) = store();
        store.set_cookie("a", "b", &CookieOptions::new().path("/").max_age(10));
        assert_eq!(store.get_cookie("a").as_deref(), Some("b"));

        store.set_cookie("note", "x=1; y=2", &CookieOptions::new());
        assert_eq!(store.get_cookie("note").as_deref(), Some("x=1; y=2"));
        assert_eq!(store.get_cookie("missing"), None);
    }
}
