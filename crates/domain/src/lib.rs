//! # Bookdesk Domain
//!
//! Session domain types for the Bookdesk administration console.
//!
//! This crate contains:
//! - The bearer [`Credential`] and its display-only [`Identity`] claims
//! - Session lifecycle types ([`SessionState`], [`SessionEvent`])
//! - Configuration structures shared by the infrastructure crate
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other Bookdesk crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
