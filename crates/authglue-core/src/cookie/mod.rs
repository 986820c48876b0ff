//! Cookie model and storage.
//!
//! This module provides:
//! - `Cookie` / `CookieOptions`: a script-side cookie assignment and its attributes
//! - `CookieStore`: the storage capability the rest of the crate is written against
//! - `MemoryCookieJar`: a browser-like jar for native hosts and tests, backed
//!   by `cookie_store`
//!
//! Values are percent-encoded the way `encodeURIComponent` does it, so cookies
//! written here are interchangeable with ones written by page scripts.

pub mod encoding;
#[cfg(not(target_arch = "wasm32"))]
pub mod jar;
pub mod options;
pub mod store;

pub use encoding::{decode_component, encode_component};
#[cfg(not(target_arch = "wasm32"))]
pub use jar::{MemoryCookieJar, StoredCookie};
pub use options::{parse_same_site, Cookie, CookieOptions, SameSite};
pub use store::CookieStore;

/// Find the first cookie called `name` in a `name=value; name=value` list and
/// return its raw value.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
}
