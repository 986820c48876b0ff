use super::find_cookie;
use super::options::Cookie;

/// Storage capability for cookies, shaped after what a page script can do
/// with `document.cookie`: read the visible list, write one assignment.
pub trait CookieStore: Send + Sync {
    /// The `name=value; name=value` list visible to scripts. HTTP-only and
    /// expired cookies are never part of it.
    fn cookie_header(&self) -> String;

    /// Apply a script-side cookie assignment. `max-age <= 0` removes the cookie.
    fn set(&self, cookie: &Cookie);

    /// Raw (still encoded) value of the first visible cookie named `name`.
    fn get_raw(&self, name: &str) -> Option<String> {
        find_cookie(&self.cookie_header(), name).map(str::to_string)
    }

    /// Expire a cookie immediately.
    fn remove(&self, name: &str, path: &str) {
        self.set(&Cookie::expired(name, path));
    }
}
