//! # Bookdesk Infrastructure
//!
//! HTTP side of the authenticated session layer.
//!
//! This crate contains:
//! - The retrying HTTP transport ([`http::HttpClient`])
//! - The request gateway that attaches credentials and replays expired
//!   requests once ([`api::ApiClient`])
//! - The cookie-carrying session transport used for login, refresh and
//!   logout ([`api::SessionTransport`])
//! - The session composition root ([`api::SessionClient`])
//! - Configuration loading and tracing initialization
//!
//! ## Architecture
//! - Implements the `RefreshTransport` seam defined in `bookdesk-common`
//! - Depends on `bookdesk-domain` and `bookdesk-common`
//! - Contains all network and file I/O

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::{ApiClient, ApiError, ApiErrorCategory, PendingRequest, SessionClient, SessionTransport};
pub use errors::InfraError;
pub use http::HttpClient;
