//! HTTP transport

pub mod client;
pub mod cookies;

pub use client::{HttpClient, HttpClientBuilder};
pub use cookies::SessionCookies;
