//! Authentication presentation state.
//!
//! This module provides:
//! - `UserProfile`: the display profile kept in a script-readable cookie
//! - `AuthPresentationStore`: get/set/update/remove of that cookie plus generic cookie helpers
//! - `Listeners` / `UserInfoUpdated`: change notification for UI that shows the profile
//!
//! The session token itself lives in an HTTP-only cookie owned by the server
//! and is never read or written here.

pub mod events;
pub mod profile;
pub mod store;

pub use events::{Listeners, SubscriptionId, UserInfoUpdated};
pub use profile::UserProfile;
pub use store::{AuthPresentationStore, StoreError};
