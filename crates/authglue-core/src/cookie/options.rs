pub use ::cookie::SameSite;

use super::encoding::encode_component;

/// Parse a `SameSite` attribute value the way a `Set-Cookie` header's would
/// be read, case-insensitively.
pub fn parse_same_site(value: &str) -> Option<SameSite> {
    ::cookie::Cookie::parse(format!("_=; SameSite={}", value.trim()))
        .ok()
        .and_then(|c| c.same_site())
}

/// Optional cookie attributes. Only the ones that are set are written out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub max_age: Option<i64>,
    pub domain: Option<String>,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl CookieOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// A cookie assignment as a page script would write it.
///
/// `value` holds the decoded value; it is percent-encoded when the
/// assignment string is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    /// An empty cookie with `max-age=0`, which makes the store drop it.
    pub fn expired(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, "", CookieOptions::new().path(path).max_age(0))
    }

    /// The value as it goes on the wire.
    pub fn encoded_value(&self) -> String {
        encode_component(&self.value)
    }

    /// Build the `document.cookie` assignment string, e.g.
    /// `user_info=%7B%7D;path=/;max-age=604800`.
    pub fn assignment(&self) -> String {
        let mut s = format!("{}={}", self.name, self.encoded_value());
        let opts = &self.options;

        if let Some(ref path) = opts.path {
            s.push_str(&format!(";path={}", path));
        }
        if let Some(max_age) = opts.max_age {
            s.push_str(&format!(";max-age={}", max_age));
        }
        if let Some(ref domain) = opts.domain {
            s.push_str(&format!(";domain={}", domain));
        }
        if opts.secure {
            s.push_str(";secure");
        }
        if let Some(same_site) = opts.same_site {
            s.push_str(&format!(";samesite={}", same_site));
        }
        s
    }
}
