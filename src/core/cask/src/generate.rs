//! Primary key generation.

use tracing::debug;
use zeroize::Zeroizing;

use crate::base64url::{self, char_to_index, is_base64url};
use crate::checksum;
use crate::clock::{Clock, SystemClock};
use crate::error::{CaskError, FormatError};
use crate::key::CaskKey;
use crate::layout::{
    KeyKind, Layout, Metadata, SensitiveDataSize, CASK_SIGNATURE_BYTES, MAX_KEY_BYTES,
    MAX_KEY_CHARS, MAX_PROVIDER_DATA_CHARS, PROVIDER_SIGNATURE_CHARS,
};
use crate::random::{OsRandom, RandomSource};
use crate::timestamp;

/// Generates a new primary key.
///
/// The sensitive data is filled from the operating system CSPRNG and the
/// allocation time is taken from the system clock.
///
/// # Arguments
///
/// * `provider_signature` - Exactly 4 base64url characters identifying the provider
/// * `provider_kind` - A single base64url character chosen by the provider
/// * `provider_data` - Optional base64url data, a multiple of 4 characters, at most 16
/// * `size` - Size class of the sensitive data
///
/// # Errors
///
/// Each malformed argument is reported with its own error variant, and
/// [`CaskError::YearOutOfRange`] is returned when the current year cannot be
/// encoded.
pub fn generate_key(
    provider_signature: &str,
    provider_kind: char,
    provider_data: Option<&str>,
    size: SensitiveDataSize,
) -> Result<CaskKey, CaskError> {
    generate_key_with(
        &OsRandom,
        &SystemClock,
        provider_signature,
        provider_kind,
        provider_data,
        size,
    )
}

/// Generates a new primary key into a caller-provided buffer, in text form.
///
/// Arguments are checked first, then the destination, before any byte is
/// written. Nothing is allocated.
///
/// # Returns
///
/// The number of characters written.
///
/// # Errors
///
/// As [`generate_key`], plus [`CaskError::DestinationTooSmall`] if
/// `destination` cannot hold the key.
pub fn generate_key_into(
    provider_signature: &str,
    provider_kind: char,
    provider_data: Option<&str>,
    size: SensitiveDataSize,
    destination: &mut [u8],
) -> Result<usize, CaskError> {
    generate_into_with(
        &OsRandom,
        &SystemClock,
        provider_signature,
        provider_kind,
        provider_data,
        size,
        destination,
    )
}

pub(crate) fn generate_key_with(
    random: &impl RandomSource,
    clock: &impl Clock,
    provider_signature: &str,
    provider_kind: char,
    provider_data: Option<&str>,
    size: SensitiveDataSize,
) -> Result<CaskKey, CaskError> {
    let mut buffer = Zeroizing::new([0u8; MAX_KEY_CHARS]);
    let len = generate_into_with(
        random,
        clock,
        provider_signature,
        provider_kind,
        provider_data,
        size,
        &mut buffer[..],
    )?;

    let text = std::str::from_utf8(&buffer[..len]).map_err(|_| FormatError::InvalidBase64)?;
    Ok(CaskKey::from_validated(text.to_owned()))
}

pub(crate) fn generate_into_with(
    random: &impl RandomSource,
    clock: &impl Clock,
    provider_signature: &str,
    provider_kind: char,
    provider_data: Option<&str>,
    size: SensitiveDataSize,
    destination: &mut [u8],
) -> Result<usize, CaskError> {
    let provider_data = provider_data.unwrap_or_default();

    validate_provider_signature(provider_signature)?;
    let provider_kind = validate_provider_kind(provider_kind)?;
    validate_provider_data(provider_data)?;
    let timestamp = timestamp::encode(clock.now_utc())?;

    let layout = Layout::new(size, base64url::decoded_len(provider_data.len()))?;
    if destination.len() < layout.len_in_chars() {
        return Err(CaskError::DestinationTooSmall {
            required: layout.len_in_chars(),
            available: destination.len(),
        });
    }

    let mut buffer = Zeroizing::new([0u8; MAX_KEY_BYTES]);
    let key = &mut buffer[..layout.len_in_bytes()];

    random.fill(&mut key[layout.sensitive_data()]);
    key[layout.sensitive_data_padding()].fill(0);

    base64url::decode_into(provider_data.as_bytes(), &mut key[layout.provider_data()])?;
    base64url::decode_into(
        provider_signature.as_bytes(),
        &mut key[layout.provider_signature()],
    )?;

    let metadata = Metadata::new(
        timestamp,
        size,
        KeyKind::PrimaryKey,
        layout.provider_data_len(),
        provider_kind,
    );
    seal(key, &layout, &metadata);

    debug!(
        provider_signature,
        size = %size,
        provider_data_len = layout.provider_data_len(),
        "Generated CASK key"
    );

    base64url::encode_into(key, destination)
}

/// Writes the signature and metadata, then the checksum over everything
/// before it.
///
/// Sensitive data, provider data and provider signature must already be in
/// place.
pub(crate) fn seal(key: &mut [u8], layout: &Layout, metadata: &Metadata) {
    key[layout.signature()].copy_from_slice(&CASK_SIGNATURE_BYTES);
    metadata.write(&mut key[layout.metadata()]);

    let checksum = checksum::compute(&key[layout.checksummed()]);
    key[layout.checksum()].copy_from_slice(&checksum);
}

fn validate_provider_signature(provider_signature: &str) -> Result<(), CaskError> {
    let len = provider_signature.chars().count();
    if len != PROVIDER_SIGNATURE_CHARS {
        return Err(CaskError::InvalidProviderSignature(format!(
            "expected {} characters, got {}",
            PROVIDER_SIGNATURE_CHARS, len
        )));
    }

    if !is_base64url(provider_signature) {
        return Err(CaskError::InvalidProviderSignature(format!(
            "{provider_signature:?} is not base64url"
        )));
    }

    Ok(())
}

fn validate_provider_kind(provider_kind: char) -> Result<u8, CaskError> {
    u8::try_from(provider_kind)
        .ok()
        .and_then(char_to_index)
        .ok_or(CaskError::InvalidProviderKind(provider_kind))
}

fn validate_provider_data(provider_data: &str) -> Result<(), CaskError> {
    if provider_data.len() > MAX_PROVIDER_DATA_CHARS {
        return Err(CaskError::ProviderDataTooLong(provider_data.len()));
    }

    if provider_data.len() % 4 != 0 {
        return Err(CaskError::InvalidProviderData(format!(
            "length must be a multiple of 4, got {}",
            provider_data.len()
        )));
    }

    if !is_base64url(provider_data) {
        return Err(CaskError::InvalidProviderData(format!(
            "{provider_data:?} is not base64url"
        )));
    }

    Ok(())
}
