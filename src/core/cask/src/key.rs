//! The CASK key value type.
//!
//! A [`CaskKey`] is either a fully validated key or hash in canonical text
//! form, or the empty sentinel produced by [`Default`]. There is no way to
//! construct a partially valid key.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::base64url::{self, char_to_index};
use crate::correlating_id;
use crate::error::CaskError;
use crate::layout::{KeyKind, Layout, Metadata, SensitiveDataSize};
use crate::timestamp;
use crate::validate;

/// A validated CASK key or hash, zeroized on drop.
///
/// Equality runs in constant time over the encoded text.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct CaskKey {
    encoded: String,
}

impl CaskKey {
    /// Parses and validates a key in canonical text form.
    ///
    /// # Errors
    ///
    /// Returns [`CaskError::InvalidFormat`] naming the first structural check
    /// the text fails.
    pub fn parse(text: &str) -> Result<Self, CaskError> {
        validate::validate(text)?;
        Ok(Self::from_validated(text.to_owned()))
    }

    /// Validates a key in decoded byte form and re-encodes it as text.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CaskError> {
        validate::validate_bytes(bytes)?;
        Ok(Self::from_validated(base64url::encode(bytes)))
    }

    pub(crate) fn from_validated(encoded: String) -> Self {
        Self { encoded }
    }

    /// Returns the canonical text form. Empty for the sentinel.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    /// Returns true for the uninitialized sentinel.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.encoded.is_empty()
    }

    /// Returns the decoded length in bytes, 0 for the sentinel.
    pub fn len_in_bytes(&self) -> usize {
        base64url::decoded_len(self.encoded.len())
    }

    pub(crate) fn layout(&self) -> Option<Layout> {
        if self.is_empty() {
            return None;
        }
        Layout::infer_from_chars(self.encoded.len()).ok()
    }

    fn metadata(&self) -> Option<Metadata> {
        let layout = self.layout()?;
        Metadata::from_chars(self.encoded.as_bytes().get(layout.metadata_chars())?)
    }

    fn sextet(&self, index: usize) -> Option<u8> {
        self.encoded.as_bytes().get(index).copied().and_then(char_to_index)
    }

    /// Size class of the sensitive data.
    pub fn size(&self) -> Option<SensitiveDataSize> {
        self.layout().map(|layout| layout.size())
    }

    /// Whether this is a primary key or a derived hash.
    pub fn kind(&self) -> Option<KeyKind> {
        self.metadata().and_then(|metadata| metadata.kind())
    }

    /// The 4-character provider signature.
    pub fn provider_signature(&self) -> Option<&str> {
        let layout = self.layout()?;
        self.encoded.get(Layout::chars(layout.provider_signature()))
    }

    /// The single-character provider kind.
    pub fn provider_kind(&self) -> Option<char> {
        let layout = self.layout()?;
        self.sextet(layout.provider_kind_char())
            .map(base64url::index_to_char)
    }

    /// The optional provider data, empty when none was embedded.
    pub fn provider_data(&self) -> Option<&str> {
        let layout = self.layout()?;
        self.encoded.get(Layout::chars(layout.provider_data()))
    }

    /// The allocation time, truncated to the minute.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let layout = self.layout()?;
        let mut sextets = [0u8; 5];
        for (sextet, index) in sextets.iter_mut().zip(layout.timestamp_chars()) {
            *sextet = self.sextet(index)?;
        }
        timestamp::decode(sextets)
    }

    /// Computes the non-secret correlating id of this key.
    pub fn correlating_id(&self) -> String {
        correlating_id::compute(&self.encoded)
    }

    /// Decodes the key into a caller-provided buffer.
    ///
    /// # Returns
    ///
    /// The number of bytes written.
    ///
    /// # Errors
    ///
    /// [`CaskError::EmptyKey`] for the sentinel and
    /// [`CaskError::DestinationTooSmall`] before any byte is written if
    /// `destination` cannot hold the key.
    pub fn decode_into(&self, destination: &mut [u8]) -> Result<usize, CaskError> {
        if self.is_empty() {
            return Err(CaskError::EmptyKey);
        }
        base64url::decode_into(self.encoded.as_bytes(), destination)
    }
}

impl fmt::Display for CaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl fmt::Debug for CaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaskKey")
            .field("kind", &self.kind())
            .field("size", &self.size())
            .field("encoded", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for CaskKey {
    fn eq(&self, other: &Self) -> bool {
        self.encoded.as_bytes().ct_eq(other.encoded.as_bytes()).into()
    }
}

impl Eq for CaskKey {}

impl AsRef<str> for CaskKey {
    fn as_ref(&self) -> &str {
        &self.encoded
    }
}

impl FromStr for CaskKey {
    type Err = CaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for CaskKey {
    type Error = CaskError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&[u8]> for CaskKey {
    type Error = CaskError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}
