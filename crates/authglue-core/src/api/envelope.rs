use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::ApiError;
use crate::config::Config;
use crate::cookie::{Cookie, CookieOptions, CookieStore};
use crate::navigation::Navigator;

/// Typed view of the envelope's `status` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeStatus {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
}

impl EnvelopeStatus {
    /// Read the status block of a response body.
    ///
    /// Returns `None` when the body carries no status (missing, `null`,
    /// `false`, `0` or `""`), which counts as success. A present block whose
    /// `code` is missing or not an integer is kept with `code: None`.
    pub fn from_body(body: &Value) -> Option<Self> {
        let status = body.get("status")?;
        if !is_truthy(status) {
            return None;
        }
        Some(Self {
            code: status.get("code").and_then(as_code),
            msg: status.get("msg").and_then(as_message),
        })
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Integral codes only; `0.0` counts as `0`.
fn as_code(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Scalar messages are shown as text, so `42` reads `"42"`.
fn as_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Interprets response envelopes.
///
/// Success passes the body through untouched. The "not logged in" code saves
/// the current page in the redirect cookie and navigates to the login page
/// before failing. Any other non-zero code fails with the server's message.
pub struct EnvelopeGuard {
    cookies: Arc<dyn CookieStore>,
    navigator: Arc<dyn Navigator>,
    redirect_cookie: String,
    login_page: String,
    not_logged_in_code: i64,
}

impl EnvelopeGuard {
    pub fn new(cookies: Arc<dyn CookieStore>, navigator: Arc<dyn Navigator>, config: &Config) -> Self {
        Self {
            cookies,
            navigator,
            redirect_cookie: config.redirect_cookie.clone(),
            login_page: config.login_page.clone(),
            not_logged_in_code: config.not_logged_in_code,
        }
    }

    pub fn handle(&self, body: Value) -> Result<Value, ApiError> {
        let status = match EnvelopeStatus::from_body(&body) {
            None => return Ok(body),
            Some(status) if status.is_success() => return Ok(body),
            Some(status) => status,
        };

        if status.code == Some(self.not_logged_in_code) {
            let here = self.navigator.current_url();
            info!(redirect_url = %here, "Not logged in, sending user to login page");
            self.cookies.set(&Cookie::new(
                self.redirect_cookie.as_str(),
                here,
                CookieOptions::new().path("/"),
            ));
            self.navigator.navigate(&self.login_page);
            return Err(ApiError::NotLoggedIn);
        }

        let msg = status.msg.unwrap_or_default();
        if status.code.is_none() {
            warn!(msg = %msg, "Envelope status without a numeric code");
        } else {
            debug!(code = ?status.code, msg = %msg, "Request failed");
        }
        Err(ApiError::Status {
            code: status.code,
            msg,
        })
    }
}
