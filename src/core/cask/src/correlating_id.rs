//! Correlating ids.
//!
//! A correlating id is a short, non-secret identifier derived from a
//! secret's text. It lets logs and incident reports refer to a leaked or
//! rotated secret without revealing it.

use sha2::{Digest, Sha256};

use crate::base64url;

/// Prefix of every correlating id.
pub const CORRELATING_ID_PREFIX: &str = "C3ID";

/// Number of digest bytes kept in a correlating id.
pub const CORRELATING_ID_BYTES: usize = 15;

/// Total length of a correlating id in characters.
pub const CORRELATING_ID_LEN: usize =
    CORRELATING_ID_PREFIX.len() + base64url::encoded_len(CORRELATING_ID_BYTES);

const SALT: &[u8] = b"CaskComputedCorrelatingId";

/// Computes the correlating id of an arbitrary secret.
///
/// The input need not be a CASK key: any secret text works, including the
/// empty string.
pub fn compute(text: &str) -> String {
    let inner = Sha256::digest(text.as_bytes());

    let mut hasher = Sha256::new();
    hasher.update(SALT);
    hasher.update(inner);
    let digest = hasher.finalize();

    let mut id = String::with_capacity(CORRELATING_ID_LEN);
    id.push_str(CORRELATING_ID_PREFIX);
    base64url::encode_append(&digest[..CORRELATING_ID_BYTES], &mut id);
    id
}

/// Returns true if `candidate` has the shape of a correlating id.
pub fn is_correlating_id(candidate: &str) -> bool {
    candidate.len() == CORRELATING_ID_LEN
        && candidate
            .strip_prefix(CORRELATING_ID_PREFIX)
            .is_some_and(base64url::is_base64url)
}
