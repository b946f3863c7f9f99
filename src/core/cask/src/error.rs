//! CASK error types.

use thiserror::Error;

use crate::layout::MAX_PROVIDER_DATA_CHARS;
use crate::timestamp::{MAX_YEAR, MIN_YEAR};

/// Reasons a candidate fails the CASK format grammar.
///
/// This type is `Copy` and carries no heap data so that the boolean
/// validation path stays allocation-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Length is out of range or not 4-char / 3-byte aligned.
    #[error("invalid key length")]
    InvalidLength,

    /// Text is not strict, unpadded base64url.
    #[error("invalid base64url encoding")]
    InvalidBase64,

    /// The fixed CASK signature is missing.
    #[error("CASK signature mismatch")]
    SignatureMismatch,

    /// The embedded size class disagrees with the size implied by the length.
    #[error("sensitive data size mismatch")]
    SizeMismatch,

    /// The key kind bits are not a known kind.
    #[error("unknown key kind")]
    InvalidKeyKind,

    /// The embedded optional data size disagrees with the key length.
    #[error("provider data size mismatch")]
    ProviderDataSizeMismatch,

    /// Alignment padding inside the sensitive data is not zeroed.
    #[error("non-zero sensitive data padding")]
    NonZeroPadding,

    /// Timestamp characters do not form a valid UTC date and time.
    #[error("invalid timestamp")]
    InvalidTimestamp,

    /// The trailing checksum does not match the preceding bytes.
    #[error("checksum mismatch")]
    ChecksumMismatch,
}

/// Errors that can occur during CASK operations.
#[derive(Debug, Error)]
pub enum CaskError {
    /// Provider signature is not exactly 4 base64url characters.
    #[error("invalid provider signature: {0}")]
    InvalidProviderSignature(String),

    /// Provider kind is not a base64url character.
    #[error("invalid provider kind: {0:?} is not a base64url character")]
    InvalidProviderKind(char),

    /// Provider data is not 4-char aligned or not base64url.
    #[error("invalid provider data: {0}")]
    InvalidProviderData(String),

    /// Provider data exceeds the maximum length.
    #[error("provider data must be at most {} characters, got {0}", MAX_PROVIDER_DATA_CHARS)]
    ProviderDataTooLong(usize),

    /// The sensitive data size is not a supported size class.
    #[error("invalid sensitive data size: {0}")]
    InvalidSize(String),

    /// The current year falls outside the window the timestamp can encode.
    #[error(
        "CASK requires the current year to be between {} and {}, got {0}",
        MIN_YEAR,
        MAX_YEAR
    )]
    YearOutOfRange(i32),

    /// Output buffer cannot hold the result.
    #[error("destination too small: {required} bytes required, {available} available")]
    DestinationTooSmall {
        /// Bytes needed.
        required: usize,
        /// Bytes provided.
        available: usize,
    },

    /// Operation attempted on the uninitialized key sentinel.
    #[error("key is empty")]
    EmptyKey,

    /// A hash was requested from something other than a primary key.
    #[error("secret must be a primary key")]
    NotAPrimaryKey,

    /// The input is not a well-formed CASK key.
    #[error("invalid CASK key: {0}")]
    InvalidFormat(#[from] FormatError),

    /// Hash primitive failure.
    #[error("crypto error: {0}")]
    Crypto(String),
}
