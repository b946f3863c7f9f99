//! HMAC-derived CASK hashes.
//!
//! A hash proves knowledge of a secret without revealing it. Its sensitive
//! data is HMAC-SHA256 keyed by the secret's sensitive bytes over a
//! caller-supplied derivation input. The secret's timestamp and provider
//! fields are copied verbatim, so deriving the same hash again later always
//! yields identical output, regardless of the current date.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;
use zeroize::{Zeroize, Zeroizing};

use crate::base64url;
use crate::error::CaskError;
use crate::generate::seal;
use crate::key::CaskKey;
use crate::layout::{KeyKind, Layout, Metadata, SensitiveDataSize, MAX_KEY_BYTES};

type HmacSha256 = Hmac<Sha256>;

/// Size class of every hash: HMAC-SHA256 output is 256 bits.
const HASH_SIZE: SensitiveDataSize = SensitiveDataSize::Bits256;

/// Derives a CASK hash of `secret` over `derivation_input`.
///
/// # Errors
///
/// [`CaskError::EmptyKey`] for the sentinel and [`CaskError::NotAPrimaryKey`]
/// if `secret` is itself a hash.
pub fn generate_hash(derivation_input: &[u8], secret: &CaskKey) -> Result<CaskKey, CaskError> {
    let mut buffer = Zeroizing::new([0u8; MAX_KEY_BYTES]);
    let len = derive_into(derivation_input, secret, &mut buffer[..])?;

    debug!(
        derivation_input_len = derivation_input.len(),
        "Derived CASK hash"
    );

    Ok(CaskKey::from_validated(base64url::encode(&buffer[..len])))
}

/// Returns true if `candidate` is the hash of `secret` over `derivation_input`.
///
/// The comparison runs in constant time over the hash bytes. Any invalid
/// argument yields `false`.
pub fn compare_hash(candidate: &CaskKey, derivation_input: &[u8], secret: &CaskKey) -> bool {
    let mut expected = Zeroizing::new([0u8; MAX_KEY_BYTES]);
    let Ok(expected_len) = derive_into(derivation_input, secret, &mut expected[..]) else {
        return false;
    };

    let mut actual = [0u8; MAX_KEY_BYTES];
    let Ok(actual_len) = candidate.decode_into(&mut actual) else {
        return false;
    };

    // Lengths are public: every hash for a given secret has the same layout.
    if actual_len != expected_len {
        return false;
    }

    expected[..expected_len].ct_eq(&actual[..actual_len]).into()
}

/// Writes the decoded hash of `secret` into `destination`.
fn derive_into(
    derivation_input: &[u8],
    secret: &CaskKey,
    destination: &mut [u8],
) -> Result<usize, CaskError> {
    let mut secret_buffer = Zeroizing::new([0u8; MAX_KEY_BYTES]);
    let secret_len = secret.decode_into(&mut secret_buffer[..])?;
    let secret_bytes = &secret_buffer[..secret_len];

    let secret_layout = Layout::infer(secret_len)?;
    let secret_metadata = Metadata::read(&secret_bytes[secret_layout.metadata()]);
    if secret_metadata.kind() != Some(KeyKind::PrimaryKey) {
        return Err(CaskError::NotAPrimaryKey);
    }

    let layout = Layout::new(HASH_SIZE, secret_layout.provider_data_len())?;
    if destination.len() < layout.len_in_bytes() {
        return Err(CaskError::DestinationTooSmall {
            required: layout.len_in_bytes(),
            available: destination.len(),
        });
    }
    let hash = &mut destination[..layout.len_in_bytes()];

    let mut mac = HmacSha256::new_from_slice(&secret_bytes[secret_layout.sensitive_data()])
        .map_err(|e| CaskError::Crypto(e.to_string()))?;
    mac.update(derivation_input);
    let mut tag = mac.finalize().into_bytes();
    hash[layout.sensitive_data()].copy_from_slice(&tag);
    tag.as_mut_slice().zeroize();

    hash[layout.sensitive_data_padding()].fill(0);
    hash[layout.provider_data()]
        .copy_from_slice(&secret_bytes[secret_layout.provider_data()]);
    hash[layout.provider_signature()]
        .copy_from_slice(&secret_bytes[secret_layout.provider_signature()]);

    let metadata = Metadata::new(
        secret_metadata.timestamp(),
        HASH_SIZE,
        KeyKind::Hash,
        layout.provider_data_len(),
        secret_metadata.provider_kind(),
    );
    seal(hash, &layout, &metadata);

    Ok(layout.len_in_bytes())
}
