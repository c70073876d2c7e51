/// Content digests of listing bodies, used as fragment file names.
use std::collections::HashMap;

use sha2::{Digest as _, Sha256};

use crate::types::Digest;

/// Number of hex characters kept from the SHA-256 output (128 bits).
const DIGEST_HEX_LEN: usize = 32;

/// Compute the digest of a listing body.
///
/// Normalization: `\r\n` becomes `\n`, nothing else. Whitespace, callout
/// markers and case are part of the identity of a listing.
pub fn digest_of(source: &str) -> Digest {
    let normalized = source.replace("\r\n", "\n");
    let hash = Sha256::digest(normalized.as_bytes());
    let mut hex = format!("{hash:x}");
    hex.truncate(DIGEST_HEX_LEN);
    return Digest(hex);
}

/// Memoizes digests by body text so identical listings are hashed once per run.
#[derive(Debug, Default)]
pub struct DigestCache {
    /// Body text to digest.
    entries: HashMap<String, Digest>,
}

impl DigestCache {
    /// Return the cached digest for `source`, computing it on first use.
    pub fn get(&mut self, source: &str) -> Digest {
        if let Some(found) = self.entries.get(source) {
            return found.clone();
        }
        let digest = digest_of(source);
        self.entries.insert(source.to_string(), digest.clone());
        return digest;
    }

    /// Number of distinct bodies seen.
    pub fn len(&self) -> usize {
        return self.entries.len();
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn digest_is_32_lowercase_hex() {
        let digest = digest_of("GET /_search\n");
        assert_eq!(digest.0.len(), 32);
        assert!(digest.0.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn known_value_is_stable() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(digest_of("").0, "e3b0c44298fc1c149afbf4c8996fb924");
    }

    #[test]
    fn crlf_is_normalized() {
        assert_eq!(digest_of("GET /\r\nPUT /x"), digest_of("GET /\nPUT /x"));
    }

    #[test]
    fn trailing_whitespace_is_significant() {
        assert_ne!(digest_of("GET /"), digest_of("GET / "));
    }

    #[test]
    fn cache_dedups_identical_bodies() {
        let mut cache = DigestCache::default();
        let a = cache.get("GET /");
        let b = cache.get("GET /");
        let c = cache.get("GET /other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.len(), 2);
    }

    proptest! {
        #[test]
        fn digest_is_deterministic(s in ".*") {
            prop_assert_eq!(digest_of(&s), digest_of(&s));
        }

        #[test]
        fn distinct_bodies_have_distinct_digests(a in "[a-z /]{0,40}", b in "[a-z /]{0,40}") {
            prop_assume!(a != b);
            prop_assert_ne!(digest_of(&a), digest_of(&b));
        }
    }
}
