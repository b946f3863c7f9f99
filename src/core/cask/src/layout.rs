//! Field layout of a CASK key.
//!
//! Every field boundary is 3-byte / 4-char aligned so that byte offsets and
//! character offsets describe the same positions:
//!
//! ```text
//! sensitive data (padded) | QJJQ | Y M D H m S K P | provider data | provider signature | checksum
//! ```
//!
//! Offsets depend on the sensitive data size class and the optional provider
//! data length, so they are always obtained from a [`Layout`] rather than
//! hardcoded.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::base64url::{bytes_to_sextets, char_to_index, sextets_to_bytes};
use crate::error::{CaskError, FormatError};

/// Fixed CASK signature in text form.
pub const CASK_SIGNATURE: &str = "QJJQ";

/// Fixed CASK signature in byte form.
pub const CASK_SIGNATURE_BYTES: [u8; 3] = [0x40, 0x92, 0x50];

/// Maximum optional provider data, in bytes.
pub const MAX_PROVIDER_DATA_BYTES: usize = 12;

/// Maximum optional provider data, in characters.
pub const MAX_PROVIDER_DATA_CHARS: usize = 16;

/// Provider signature length in characters.
pub const PROVIDER_SIGNATURE_CHARS: usize = 4;

/// Bytes following the sensitive data in a key without provider data.
const FIXED_BYTES: usize = SIGNATURE_BYTES + METADATA_BYTES + PROVIDER_SIGNATURE_BYTES + CHECKSUM_BYTES;

const SIGNATURE_BYTES: usize = 3;
const METADATA_BYTES: usize = 6;
const PROVIDER_SIGNATURE_BYTES: usize = 3;
const CHECKSUM_BYTES: usize = 3;

/// Smallest valid key, in bytes.
pub const MIN_KEY_BYTES: usize = SensitiveDataSize::Bits128.padded_len_in_bytes() + FIXED_BYTES;

/// Largest valid key, in bytes.
pub const MAX_KEY_BYTES: usize =
    SensitiveDataSize::Bits512.padded_len_in_bytes() + FIXED_BYTES + MAX_PROVIDER_DATA_BYTES;

/// Smallest valid key, in characters.
pub const MIN_KEY_CHARS: usize = MIN_KEY_BYTES / 3 * 4;

/// Largest valid key, in characters.
pub const MAX_KEY_CHARS: usize = MAX_KEY_BYTES / 3 * 4;

/// Size class of the sensitive data component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SensitiveDataSize {
    /// 128 bits (16 bytes, padded to 18).
    Bits128 = 1,
    /// 256 bits (32 bytes, padded to 33).
    Bits256 = 2,
    /// 384 bits (48 bytes).
    Bits384 = 3,
    /// 512 bits (64 bytes, padded to 66).
    Bits512 = 4,
}

impl SensitiveDataSize {
    /// All size classes, smallest first.
    pub const ALL: [SensitiveDataSize; 4] = [
        SensitiveDataSize::Bits128,
        SensitiveDataSize::Bits256,
        SensitiveDataSize::Bits384,
        SensitiveDataSize::Bits512,
    ];

    /// Returns the size class for an encoded index.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(SensitiveDataSize::Bits128),
            2 => Some(SensitiveDataSize::Bits256),
            3 => Some(SensitiveDataSize::Bits384),
            4 => Some(SensitiveDataSize::Bits512),
            _ => None,
        }
    }

    /// Returns the index embedded in the key.
    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Returns the size in bits.
    #[inline]
    pub const fn bits(self) -> usize {
        self.len_in_bytes() * 8
    }

    /// Returns the unpadded size in bytes.
    #[inline]
    pub const fn len_in_bytes(self) -> usize {
        self as usize * 16
    }

    /// Returns the size in bytes rounded up to 3-byte alignment.
    #[inline]
    pub const fn padded_len_in_bytes(self) -> usize {
        round_up_to_3_byte_alignment(self.len_in_bytes())
    }
}

impl fmt::Display for SensitiveDataSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

impl FromStr for SensitiveDataSize {
    type Err = CaskError;

    /// Parses `128`, `256`, `384` or `512`, optionally suffixed with `-bit`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = s.strip_suffix("-bit").unwrap_or(s);
        SensitiveDataSize::ALL
            .into_iter()
            .find(|size| bits.parse::<usize>().ok() == Some(size.bits()))
            .ok_or_else(|| CaskError::InvalidSize(format!("{s} (expected 128, 256, 384 or 512)")))
    }
}

/// Whether a key is a primary secret or a value derived from one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyKind {
    /// Randomly generated secret.
    PrimaryKey = 0,
    /// HMAC derived from a primary key.
    Hash = 1,
}

impl KeyKind {
    /// Returns the kind for an encoded index.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(KeyKind::PrimaryKey),
            1 => Some(KeyKind::Hash),
            _ => None,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::PrimaryKey => f.write_str("primary key"),
            KeyKind::Hash => f.write_str("hash"),
        }
    }
}

/// Byte and character ranges of every field for one size class and
/// provider data length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    size: SensitiveDataSize,
    provider_data_len: usize,
}

impl Layout {
    /// Computes the layout for a size class and provider data length in bytes.
    pub fn new(size: SensitiveDataSize, provider_data_len: usize) -> Result<Self, FormatError> {
        if provider_data_len % 3 != 0 || provider_data_len > MAX_PROVIDER_DATA_BYTES {
            return Err(FormatError::InvalidLength);
        }

        Ok(Self {
            size,
            provider_data_len,
        })
    }

    /// Infers the layout from a total key length in bytes.
    ///
    /// The size class is the largest one whose minimum key length fits;
    /// whatever remains is provider data. Because the gap between adjacent
    /// minimum lengths exceeds [`MAX_PROVIDER_DATA_BYTES`], at most one size
    /// class is consistent with any length.
    pub fn infer(len_in_bytes: usize) -> Result<Self, FormatError> {
        if !(MIN_KEY_BYTES..=MAX_KEY_BYTES).contains(&len_in_bytes) || len_in_bytes % 3 != 0 {
            return Err(FormatError::InvalidLength);
        }

        let size = SensitiveDataSize::ALL
            .into_iter()
            .rev()
            .find(|size| size.padded_len_in_bytes() + FIXED_BYTES <= len_in_bytes)
            .ok_or(FormatError::InvalidLength)?;

        Self::new(size, len_in_bytes - size.padded_len_in_bytes() - FIXED_BYTES)
    }

    /// Infers the layout from a total key length in characters.
    pub fn infer_from_chars(len_in_chars: usize) -> Result<Self, FormatError> {
        if len_in_chars % 4 != 0 {
            return Err(FormatError::InvalidLength);
        }
        Self::infer(len_in_chars / 4 * 3)
    }

    /// Size class of the sensitive data.
    #[inline]
    pub fn size(&self) -> SensitiveDataSize {
        self.size
    }

    /// Length of the optional provider data in bytes.
    #[inline]
    pub fn provider_data_len(&self) -> usize {
        self.provider_data_len
    }

    /// Total key length in bytes.
    pub fn len_in_bytes(&self) -> usize {
        self.size.padded_len_in_bytes() + self.provider_data_len + FIXED_BYTES
    }

    /// Total key length in characters.
    pub fn len_in_chars(&self) -> usize {
        self.len_in_bytes() / 3 * 4
    }

    /// Unpadded sensitive data.
    pub fn sensitive_data(&self) -> Range<usize> {
        0..self.size.len_in_bytes()
    }

    /// Zero padding that aligns the sensitive data to 3 bytes.
    pub fn sensitive_data_padding(&self) -> Range<usize> {
        self.size.len_in_bytes()..self.size.padded_len_in_bytes()
    }

    /// CASK signature bytes.
    pub fn signature(&self) -> Range<usize> {
        let start = self.size.padded_len_in_bytes();
        start..start + SIGNATURE_BYTES
    }

    /// Metadata bytes: timestamp, size, kind and provider kind.
    pub fn metadata(&self) -> Range<usize> {
        let start = self.signature().end;
        start..start + METADATA_BYTES
    }

    /// Optional provider data bytes.
    pub fn provider_data(&self) -> Range<usize> {
        let start = self.metadata().end;
        start..start + self.provider_data_len
    }

    /// Provider signature bytes.
    pub fn provider_signature(&self) -> Range<usize> {
        let start = self.provider_data().end;
        start..start + PROVIDER_SIGNATURE_BYTES
    }

    /// Checksum bytes.
    pub fn checksum(&self) -> Range<usize> {
        let start = self.provider_signature().end;
        start..start + CHECKSUM_BYTES
    }

    /// Bytes covered by the checksum.
    pub fn checksummed(&self) -> Range<usize> {
        0..self.checksum().start
    }

    /// Metadata characters.
    pub fn metadata_chars(&self) -> Range<usize> {
        Self::chars(self.metadata())
    }

    /// Timestamp characters: year, month, day, hour and minute.
    pub fn timestamp_chars(&self) -> Range<usize> {
        let start = self.metadata_chars().start;
        start + Metadata::YEAR..start + Metadata::MINUTE + 1
    }

    /// Index of the size class character.
    pub fn size_char(&self) -> usize {
        self.metadata_chars().start + Metadata::SIZE
    }

    /// Index of the character holding the key kind and provider data size.
    pub fn kind_char(&self) -> usize {
        self.metadata_chars().start + Metadata::KIND
    }

    /// Index of the provider kind character.
    pub fn provider_kind_char(&self) -> usize {
        self.metadata_chars().start + Metadata::PROVIDER_KIND
    }

    /// Character range for a byte range.
    pub fn chars(bytes: Range<usize>) -> Range<usize> {
        debug_assert!(bytes.start % 3 == 0 && bytes.end % 3 == 0);
        bytes.start / 3 * 4..bytes.end / 3 * 4
    }
}

/// Number of characters in the metadata block.
pub(crate) const METADATA_CHARS: usize = METADATA_BYTES / 3 * 4;

/// Decoded metadata characters, one sextet per field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Metadata([u8; METADATA_CHARS]);

impl Metadata {
    pub(crate) const YEAR: usize = 0;
    pub(crate) const MONTH: usize = 1;
    pub(crate) const DAY: usize = 2;
    pub(crate) const HOUR: usize = 3;
    pub(crate) const MINUTE: usize = 4;
    pub(crate) const SIZE: usize = 5;
    pub(crate) const KIND: usize = 6;
    pub(crate) const PROVIDER_KIND: usize = 7;

    const SEGMENT_MASK: u8 = 0b0000_0111;
    const KIND_SHIFT: u8 = 3;

    /// Builds the metadata block for a new key.
    pub(crate) fn new(
        timestamp: [u8; 5],
        size: SensitiveDataSize,
        kind: KeyKind,
        provider_data_len: usize,
        provider_kind: u8,
    ) -> Self {
        let [year, month, day, hour, minute] = timestamp;
        let segments = (provider_data_len / 3) as u8;

        let mut fields = [0u8; METADATA_CHARS];
        fields[Self::YEAR] = year;
        fields[Self::MONTH] = month;
        fields[Self::DAY] = day;
        fields[Self::HOUR] = hour;
        fields[Self::MINUTE] = minute;
        fields[Self::SIZE] = size.index();
        fields[Self::KIND] = ((kind as u8) << Self::KIND_SHIFT) | segments;
        fields[Self::PROVIDER_KIND] = provider_kind;
        Self(fields)
    }

    /// Reads the metadata block from its 6 bytes.
    pub(crate) fn read(bytes: &[u8]) -> Self {
        let mut fields = [0u8; METADATA_CHARS];
        bytes_to_sextets(bytes, &mut fields);
        Self(fields)
    }

    /// Reads the metadata block from its 8 characters.
    pub(crate) fn from_chars(chars: &[u8]) -> Option<Self> {
        let mut fields = [0u8; METADATA_CHARS];
        if chars.len() != METADATA_CHARS {
            return None;
        }
        for (field, &c) in fields.iter_mut().zip(chars) {
            *field = char_to_index(c)?;
        }
        Some(Self(fields))
    }

    /// Writes the metadata block into its 6 bytes.
    pub(crate) fn write(&self, bytes: &mut [u8]) {
        sextets_to_bytes(&self.0, bytes);
    }

    pub(crate) fn timestamp(&self) -> [u8; 5] {
        let mut timestamp = [0u8; 5];
        timestamp.copy_from_slice(&self.0[Self::YEAR..=Self::MINUTE]);
        timestamp
    }

    pub(crate) fn size_index(&self) -> u8 {
        self.0[Self::SIZE]
    }

    pub(crate) fn kind(&self) -> Option<KeyKind> {
        KeyKind::from_index(self.0[Self::KIND] >> Self::KIND_SHIFT)
    }

    pub(crate) fn provider_data_len(&self) -> usize {
        (self.0[Self::KIND] & Self::SEGMENT_MASK) as usize * 3
    }

    pub(crate) fn provider_kind(&self) -> u8 {
        self.0[Self::PROVIDER_KIND]
    }
}

/// Rounds a byte count up to the next multiple of 3.
#[inline]
pub const fn round_up_to_3_byte_alignment(bytes: usize) -> usize {
    bytes.div_ceil(3) * 3
}
