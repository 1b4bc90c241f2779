//! Macro for implementing Display and FromStr for session enums
//!
//! Generates a single lowercase string mapping used for both directions,
//! so config files, logs and the UI layer agree on the spelling.
//!
//! # Example
//!
//! ```rust
//! use bookdesk_domain::impl_session_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Backend {
//!     File,
//!     Memory,
//! }
//!
//! impl_session_enum_conversions!(Backend {
//!     File => "file",
//!     Memory => "memory",
//! });
//!
//! assert_eq!("FILE".parse::<Backend>(), Ok(Backend::File));
//! ```

/// Implements Display and FromStr traits for unit-variant enums
///
/// - Display writes the mapped lowercase string
/// - FromStr parses case-insensitively and reports the enum name on failure
#[macro_export]
macro_rules! impl_session_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
