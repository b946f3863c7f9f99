//! # CASK
//!
//! Common Annotated Security Key codec.
//!
//! A CASK key is a base64url string that carries its own structure: random
//! sensitive data, a fixed `QJJQ` signature, an allocation timestamp,
//! provider annotations and a checksum. Keys can therefore be recognized in
//! logs or source code with no access to the secret itself.
//!
//! This crate provides:
//! - Key generation, allocating or into a caller buffer ([`generate_key`])
//! - Structural validation of text, UTF-8 and byte forms ([`is_cask`])
//! - HMAC-derived hashes and constant-time comparison ([`generate_hash`])
//! - Non-secret correlating ids ([`correlating_id`])
//! - Scanning free-form text for keys ([`find_keys`])

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod base64url;
mod checksum;
mod clock;
pub mod correlating_id;
pub mod error;
mod generate;
mod hash;
pub mod key;
pub mod layout;
mod random;
pub mod scan;
mod timestamp;
pub mod validate;

pub use error::{CaskError, FormatError};
pub use generate::{generate_key, generate_key_into};
pub use hash::{compare_hash, generate_hash};
pub use key::CaskKey;
pub use layout::{KeyKind, Layout, SensitiveDataSize};
pub use scan::find_keys;
pub use timestamp::{MAX_YEAR, MIN_YEAR};
pub use validate::{is_cask, is_cask_bytes, is_cask_utf8};
