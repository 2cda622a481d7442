//! Kernel utilities shared across slices.
//! Keep this crate lightweight: application state, the HTTP error type, caller
//! authentication, pagination and config loading live here; routes live in the features.
//!
//! ## Token generation
//! Use `safe_nanoid!` for URL-safe, unambiguous secrets:
//! ```rust
//! # use ingest_kernel::safe_nanoid;
//! let token = safe_nanoid!();
//! assert_eq!(token.len(), 40);
//! ```
//!
//! ## Config loading
//! ```rust,no_run
//! use ingest_kernel::config::load_config;
//! use ingest_kernel::domain::config::ApiConfig;
//!
//! let cfg: ApiConfig = load_config(Some("server.toml")).unwrap();
//! ```
pub mod config;
pub mod prelude;
pub mod security;
pub mod server;

// Alphabet excludes visually ambiguous characters (I, O, l, 0, 1).
pub const SAFE_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

pub use ingest_database as database;
pub use ingest_domain as domain;
pub use nanoid::nanoid;

/// Generates an unambiguous `NanoID` (no visually confusing characters).
///
/// Defaults to 40 characters, enough entropy for API tokens.
#[macro_export]
macro_rules! safe_nanoid {
    () => {
        $crate::nanoid!(40, $crate::SAFE_ALPHABET)
    };
    ($size:expr) => {
        $crate::nanoid!($size, $crate::SAFE_ALPHABET)
    };
}
