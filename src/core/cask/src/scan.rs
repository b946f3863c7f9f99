//! Locating CASK keys in free-form text.
//!
//! Every key carries the fixed `QJJQ` signature, so scanning only has to
//! look at base64url tokens that contain it. A token is a maximal run of
//! base64url characters; keys glued to other base64url characters are not
//! reported.

use crate::base64url::is_base64url_char;
use crate::layout::{CASK_SIGNATURE, MAX_KEY_CHARS, MIN_KEY_CHARS};
use crate::validate::is_cask;

/// Returns an iterator over every well-formed CASK key or hash in `text`,
/// in order of appearance.
pub fn find_keys(text: &str) -> KeyScanner<'_> {
    KeyScanner { text, position: 0 }
}

/// Iterator returned by [`find_keys`].
#[derive(Debug, Clone)]
pub struct KeyScanner<'a> {
    text: &'a str,
    position: usize,
}

impl<'a> Iterator for KeyScanner<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let bytes = self.text.as_bytes();

        while let Some(offset) = find_signature(&bytes[self.position..]) {
            let hit = self.position + offset;

            let start = bytes[..hit]
                .iter()
                .rposition(|&b| !is_base64url_char(b))
                .map_or(0, |p| p + 1);
            let end = bytes[hit..]
                .iter()
                .position(|&b| !is_base64url_char(b))
                .map_or(bytes.len(), |p| hit + p);

            self.position = end;

            let token = &self.text[start..end];
            if (MIN_KEY_CHARS..=MAX_KEY_CHARS).contains(&token.len()) && is_cask(token) {
                return Some(token);
            }
        }

        self.position = bytes.len();
        None
    }
}

fn find_signature(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(CASK_SIGNATURE.len())
        .position(|window| window == CASK_SIGNATURE.as_bytes())
}
