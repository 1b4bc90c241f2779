//! Bookdesk API access
//!
//! This module provides the authenticated HTTP path to the remote Bookdesk
//! API: the request gateway, the session transport for the `/auth/*`
//! endpoints, and the session client that ties them to one credential store.
//!
//! # Architecture
//!
//! - Uses the retrying [`HttpClient`](crate::http::HttpClient) (no direct
//!   reqwest clients outside `http`)
//! - Bearer credential attached per request, refreshed single-flight on
//!   expiry, replayed at most once
//! - Session proof confined to the cookie jar of [`SessionTransport`]
//! - Structured tracing only, credentials logged as fingerprints

pub mod auth;
pub mod client;
pub mod errors;
pub mod session;

pub use auth::SessionTransport;
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig, PendingRequest};
pub use errors::{ApiError, ApiErrorCategory};
pub use session::SessionClient;
