//! Structural validation of CASK candidates.
//!
//! Validation needs no secret material. The string, UTF-8 and decoded byte
//! forms of the same candidate always receive the same verdict: text is
//! strictly decoded into a stack buffer and then checked by
//! [`validate_bytes`].

use tracing::trace;
use zeroize::Zeroizing;

use crate::base64url;
use crate::checksum;
use crate::error::FormatError;
use crate::layout::{Layout, Metadata, CASK_SIGNATURE_BYTES, MAX_KEY_BYTES};
use crate::timestamp;

/// Returns true if `candidate` is a well-formed CASK key or hash.
pub fn is_cask(candidate: &str) -> bool {
    is_cask_utf8(candidate.as_bytes())
}

/// Returns true if the UTF-8 text in `candidate` is a well-formed CASK key or hash.
pub fn is_cask_utf8(candidate: &[u8]) -> bool {
    accept(validate_utf8(candidate))
}

/// Returns true if `candidate` is the decoded byte form of a well-formed
/// CASK key or hash.
pub fn is_cask_bytes(candidate: &[u8]) -> bool {
    accept(validate_bytes(candidate))
}

fn accept(result: Result<Layout, FormatError>) -> bool {
    match result {
        Ok(_) => true,
        Err(reason) => {
            trace!(%reason, "Rejected CASK candidate");
            false
        }
    }
}

/// Validates a candidate in text form.
///
/// # Returns
///
/// The layout of the key, or the first structural check it fails.
pub fn validate(candidate: &str) -> Result<Layout, FormatError> {
    validate_utf8(candidate.as_bytes())
}

/// Validates a candidate given as UTF-8 text bytes.
pub fn validate_utf8(candidate: &[u8]) -> Result<Layout, FormatError> {
    let layout = Layout::infer_from_chars(candidate.len())?;

    let mut buffer = Zeroizing::new([0u8; MAX_KEY_BYTES]);
    let bytes = &mut buffer[..layout.len_in_bytes()];
    base64url::decode_into(candidate, bytes).map_err(|_| FormatError::InvalidBase64)?;

    validate_bytes(bytes)
}

/// Validates a candidate in decoded byte form.
pub fn validate_bytes(key: &[u8]) -> Result<Layout, FormatError> {
    let layout = Layout::infer(key.len())?;

    if key[layout.signature()] != CASK_SIGNATURE_BYTES {
        return Err(FormatError::SignatureMismatch);
    }

    let metadata = Metadata::read(&key[layout.metadata()]);

    // Guards against truncation or extension that still lands on a valid length.
    if metadata.size_index() != layout.size().index() {
        return Err(FormatError::SizeMismatch);
    }

    if metadata.kind().is_none() {
        return Err(FormatError::InvalidKeyKind);
    }

    if metadata.provider_data_len() != layout.provider_data_len() {
        return Err(FormatError::ProviderDataSizeMismatch);
    }

    if key[layout.sensitive_data_padding()].iter().any(|&b| b != 0) {
        return Err(FormatError::NonZeroPadding);
    }

    if timestamp::decode(metadata.timestamp()).is_none() {
        return Err(FormatError::InvalidTimestamp);
    }

    if checksum::compute(&key[layout.checksummed()]) != key[layout.checksum()] {
        return Err(FormatError::ChecksumMismatch);
    }

    Ok(layout)
}
