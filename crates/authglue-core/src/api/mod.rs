//! Authenticated HTTP access to the application server.
//!
//! This module provides the `AuthClient` for issuing requests with the
//! session cookie attached, and the `EnvelopeGuard` that interprets the
//! server's `{ status: { code, msg }, ... }` response envelope.
//!
//! A "not logged in" envelope sends the user to the login page and
//! remembers where they were so the login page can send them back.

pub mod client;
pub mod envelope;
pub mod error;

pub use client::{AuthClient, RequestOptions};
pub use envelope::{EnvelopeGuard, EnvelopeStatus};
pub use error::ApiError;
