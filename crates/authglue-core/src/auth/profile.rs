use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The user profile kept in the `user_info` cookie.
///
/// Only the fields the UI edits are typed; anything else the server sent is
/// kept in `extra` and written back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(rename = "avatarUrl", default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Username if present and non-empty
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|name| !name.is_empty())
    }

    /// A profile is usable for display once it has a username.
    pub fn is_valid(&self) -> bool {
        self.username().is_some()
    }

    /// True when no field at all is set.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.bio.is_none()
            && self.avatar_url.is_none()
            && self.extra.is_empty()
    }

    /// Overlay the editable fields of `update` on top of `self`.
    ///
    /// A field is taken from `update` only when it is present and non-empty;
    /// other fields of `update` are ignored and everything else in `self` is kept.
    pub fn merged_with(&self, update: &UserProfile) -> UserProfile {
        UserProfile {
            username: pick(&update.username, &self.username),
            email: pick(&update.email, &self.email),
            bio: pick(&update.bio, &self.bio),
            avatar_url: pick(&update.avatar_url, &self.avatar_url),
            extra: self.extra.clone(),
        }
    }
}

fn pick(incoming: &Option<String>, current: &Option<String>) -> Option<String> {
    match incoming.as_deref() {
        Some(value) if !value.is_empty() => Some(value.to_string()),
        _ => current.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let value = json!({
            "username": "alice",
            "avatarUrl": "/img/a.png",
            "userId": 42,
            "roles": ["admin"]
        });
        let profile: UserProfile = serde_json::from_value(value.clone()).expect("parse");
        assert_eq!(profile.username(), Some("alice"));
        assert_eq!(profile.avatar_url.as_deref(), Some("/img/a.png"));
        assert_eq!(profile.extra.get("userId"), Some(&json!(42)));
        assert_eq!(serde_json::to_value(&profile).expect("serialize"), value);
    }

    #[test]
    fn test_validity() {
        assert!(UserProfile::new("alice").is_valid());
        assert!(!UserProfile::new("").is_valid());
        assert!(!UserProfile::default().with_email("a@x.com").is_valid());
        assert!(UserProfile::default().is_empty());
        assert!(!UserProfile::default().with_field("id", json!(1)).is_empty());
    }

    #[test]
    fn test_merge_keeps_unspecified_fields() {
        let current = UserProfile::new("alice")
            .with_email("a@x.com")
            .with_field("userId", json!(7));
        let merged = current.merged_with(&UserProfile::new("bob"));
        assert_eq!(merged.username(), Some("bob"));
        assert_eq!(merged.email.as_deref(), Some("a@x.com"));
        assert_eq!(merged.extra.get("userId"), Some(&json!(7)));
    }

    #[test]
    fn test_merge_ignores_empty_and_unrecognized() {
        let current = UserProfile::new("alice").with_bio("hello");
        let update = UserProfile {
            username: Some(String::new()),
            bio: Some(String::new()),
            avatar_url: Some("/a.png".to_string()),
            ..UserProfile::default()
        }
        .with_field("role", json!("admin"));

        let merged = current.merged_with(&update);
        assert_eq!(merged.username(), Some("alice"));
        assert_eq!(merged.bio.as_deref(), Some("hello"));
        assert_eq!(merged.avatar_url.as_deref(), Some("/a.png"));
        assert!(merged.extra.get("role").is_none());
    }
}
