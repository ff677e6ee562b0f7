//! Cache-key derivation.
//!
//! A source URL maps to exactly one cache key. URLs carrying a post/reel
//! identifier segment keep that segment verbatim, so distinct URL forms of
//! the same post share a key; anything else falls back to a truncated
//! SHA-256 of the raw URL bytes.
//!
//! The derivation is fixed for the lifetime of a deployed cache: changing
//! the pattern or hash would invalidate every existing entry.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

/// Number of hex characters kept from the hash fallback.
const HASH_KEY_LEN: usize = 12;

static ID_SEGMENT: OnceLock<Regex> = OnceLock::new();

fn id_segment() -> &'static Regex {
    ID_SEGMENT.get_or_init(|| {
        Regex::new(r"/(reel|p)/([A-Za-z0-9_-]+)").expect("id segment pattern compiles")
    })
}

/// Derive the cache key for a source URL.
///
/// Pure and total: never fails, and the same URL always yields the same key
/// across processes.
///
/// ```
/// use reelcache_core::keys::derive_reel_id;
///
/// assert_eq!(derive_reel_id("https://x.test/reel/ABC123/"), "ABC123");
/// assert_eq!(derive_reel_id("https://x.test/share?id=999").len(), 12);
/// ```
pub fn derive_reel_id(source_url: &str) -> String {
    if let Some(caps) = id_segment().captures(source_url) {
        return caps[2].to_string();
    }

    let mut hasher = Sha256::new();
    hasher.update(source_url.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..HASH_KEY_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_reel_segment() {
        assert_eq!(
            derive_reel_id("https://www.instagram.com/reel/ABC123xyz/"),
            "ABC123xyz"
        );
        assert_eq!(derive_reel_id("https://instagram.com/p/XYZ789/"), "XYZ789");
    }

    #[test]
    fn same_identifier_in_different_url_forms_shares_a_key() {
        let a = derive_reel_id("https://www.instagram.com/reel/ABC123/");
        let b = derive_reel_id("https://instagram.com/reel/ABC123/?igsh=tracking");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_fallback_is_stable_and_hex() {
        let key1 = derive_reel_id("https://x.test/share?id=999");
        let key2 = derive_reel_id("https://x.test/share?id=999");
        assert_eq!(key1, key2);
        assert_eq!(key1.len(), 12);
        assert!(key1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_urls_hash_to_distinct_keys() {
        let key1 = derive_reel_id("https://x.test/share?id=999");
        let key2 = derive_reel_id("https://x.test/share?id=1000");
        assert_ne!(key1, key2);
    }
}
