use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("User not logged in")]
    NotLoggedIn,

    #[error("{msg}")]
    Status { code: Option<i64>, msg: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    pub(crate) fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// The server's status code, when the error came from an envelope.
    pub fn status_code(&self) -> Option<i64> {
        match self {
            ApiError::Status { code, .. } => *code,
            _ => None,
        }
    }

    pub fn is_not_logged_in(&self) -> bool {
        matches!(self, ApiError::NotLoggedIn)
    }
}
