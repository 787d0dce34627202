//! Macro for implementing Display and FromStr for code enums
//!
//! Outcome codes, email types and queue kinds all travel as short lowercase
//! strings (logs, persisted rows, CLI output). This macro provides a single
//! implementation for both Display and FromStr.
//!
//! # Example
//!
//! ```rust
//! use listsync_domain::impl_domain_code_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Delivery {
//!     Html,
//!     Text,
//! }
//!
//! impl_domain_code_conversions!(Delivery {
//!     Html => "html",
//!     Text => "text",
//! });
//!
//! assert_eq!(Delivery::Html.to_string(), "html");
//! ```

/// Implements Display and FromStr traits for code enums
///
/// This macro generates:
/// - Display trait: converts enum variants to their lowercase code
/// - FromStr trait: parses case-insensitive strings to enum variants
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $code` - Mapping of enum variants to their string codes
#[macro_export]
macro_rules! impl_domain_code_conversions {
    ($enum_name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Stable string code for this variant.
            pub const fn as_code(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_code())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
