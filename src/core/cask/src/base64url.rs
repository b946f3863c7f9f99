//! Strict URL-safe base64.
//!
//! Canonical CASK text uses the `A-Z a-z 0-9 - _` alphabet with no padding.
//! Decoding rejects `=`, whitespace and any character outside the alphabet,
//! and reports a mismatch between written and expected byte counts as a
//! format error rather than silently accepting it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{CaskError, FormatError};

/// The base64url alphabet, indexed by sextet value.
pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Returns the number of characters needed to encode `bytes` bytes without padding.
#[inline]
pub const fn encoded_len(bytes: usize) -> usize {
    (bytes * 4).div_ceil(3)
}

/// Returns the number of bytes produced by decoding `chars` unpadded characters.
#[inline]
pub const fn decoded_len(chars: usize) -> usize {
    chars * 3 / 4
}

/// Returns true if `c` is in the base64url alphabet.
#[inline]
pub const fn is_base64url_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_'
}

/// Returns true if every character of `text` is in the base64url alphabet.
pub fn is_base64url(text: &str) -> bool {
    text.bytes().all(is_base64url_char)
}

/// Maps a base64url character to its sextet value.
#[inline]
pub const fn char_to_index(c: u8) -> Option<u8> {
    match c {
        b'A'..=b'Z' => Some(c - b'A'),
        b'a'..=b'z' => Some(c - b'a' + 26),
        b'0'..=b'9' => Some(c - b'0' + 52),
        b'-' => Some(62),
        b'_' => Some(63),
        _ => None,
    }
}

/// Maps a sextet value (masked to 6 bits) to its base64url character.
#[inline]
pub const fn index_to_char(index: u8) -> char {
    ALPHABET[(index & 0x3F) as usize] as char
}

/// Encodes bytes as unpadded base64url.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Appends the unpadded base64url encoding of `bytes` to `output`.
pub fn encode_append(bytes: &[u8], output: &mut String) {
    URL_SAFE_NO_PAD.encode_string(bytes, output);
}

/// Encodes bytes into a caller-provided buffer.
///
/// The destination is checked before anything is written.
///
/// # Returns
///
/// The number of characters written.
pub fn encode_into(bytes: &[u8], destination: &mut [u8]) -> Result<usize, CaskError> {
    let required = encoded_len(bytes.len());
    if destination.len() < required {
        return Err(CaskError::DestinationTooSmall {
            required,
            available: destination.len(),
        });
    }

    URL_SAFE_NO_PAD
        .encode_slice(bytes, &mut destination[..required])
        .map_err(|_| CaskError::DestinationTooSmall {
            required,
            available: destination.len(),
        })
}

/// Decodes unpadded base64url text (string or UTF-8 bytes).
pub fn decode(text: impl AsRef<[u8]>) -> Result<Vec<u8>, CaskError> {
    let text = text.as_ref();
    let mut bytes = vec![0u8; decoded_len(text.len())];
    decode_into(text, &mut bytes)?;
    Ok(bytes)
}

/// Decodes unpadded base64url text into a caller-provided buffer.
///
/// # Returns
///
/// The number of bytes written, which always equals `decoded_len(text.len())`.
pub fn decode_into(text: &[u8], destination: &mut [u8]) -> Result<usize, CaskError> {
    let expected = decoded_len(text.len());
    if destination.len() < expected {
        return Err(CaskError::DestinationTooSmall {
            required: expected,
            available: destination.len(),
        });
    }

    let written = URL_SAFE_NO_PAD
        .decode_slice(text, &mut destination[..expected])
        .map_err(|_| FormatError::InvalidBase64)?;

    if written != expected {
        return Err(FormatError::InvalidBase64.into());
    }

    Ok(written)
}

/// Splits 3-byte groups into sextet values, 4 per group.
pub(crate) fn bytes_to_sextets(bytes: &[u8], sextets: &mut [u8]) {
    debug_assert_eq!(bytes.len() % 3, 0);
    debug_assert_eq!(sextets.len(), bytes.len() / 3 * 4);

    for (group, out) in bytes.chunks_exact(3).zip(sextets.chunks_exact_mut(4)) {
        out[0] = group[0] >> 2;
        out[1] = ((group[0] & 0x03) << 4) | (group[1] >> 4);
        out[2] = ((group[1] & 0x0F) << 2) | (group[2] >> 6);
        out[3] = group[2] & 0x3F;
    }
}

/// Packs sextet values, 4 per group, into 3-byte groups.
pub(crate) fn sextets_to_bytes(sextets: &[u8], bytes: &mut [u8]) {
    debug_assert_eq!(sextets.len() % 4, 0);
    debug_assert_eq!(bytes.len(), sextets.len() / 4 * 3);

    for (group, out) in sextets.chunks_exact(4).zip(bytes.chunks_exact_mut(3)) {
        out[0] = (group[0] << 2) | (group[1] >> 4);
        out[1] = (group[1] << 4) | (group[2] >> 2);
        out[2] = (group[2] << 6) | (group[3] & 0x3F);
    }
}
