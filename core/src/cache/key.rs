//! Cache key derivation.
//!
//! A key is the lowercase hex SHA-256 digest of `voice|speed|text`. Speed is
//! hashed exactly as rendered by `format_speed`, so `1.0` and `1.00000001`
//! are different keys even if the remote side would treat them alike.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a rendered key in hex characters.
pub const KEY_HEX_LEN: usize = 64;

/// Field separator. Catalog voice ids never contain it; free text may, but
/// text is the last field so it cannot shift the split.
const SEPARATOR: &[u8] = b"|";

/// Stable identifier for one (voice, speed, text) synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a synthesis. Pure; never fails.
    pub fn derive(voice_id: &str, speed: f64, text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(voice_id.as_bytes());
        hasher.update(SEPARATOR);
        hasher.update(format_speed(speed).as_bytes());
        hasher.update(SEPARATOR);
        hasher.update(text.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Parse a previously rendered key (e.g. a cache file stem).
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == KEY_HEX_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Free-function form of [`CacheKey::derive`].
pub fn derive(voice_id: &str, speed: f64, text: &str) -> CacheKey {
    CacheKey::derive(voice_id, speed, text)
}

/// Render a speed the way it enters the key: shortest round-trip form with
/// a mandatory fractional part (`1.0`, `0.75`, `1.25`).
pub fn format_speed(speed: f64) -> String {
    format!("{:?}", speed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_derive_is_deterministic() {
        let a = CacheKey::derive("Vittorio22k_NT", 1.0, "Buongiorno");
        let b = CacheKey::derive("Vittorio22k_NT", 1.0, "Buongiorno");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), KEY_HEX_LEN);
    }

    #[test]
    fn test_each_field_changes_key() {
        let base = CacheKey::derive("Vittorio22k_NT", 1.0, "Ciao");
        assert_ne!(base, CacheKey::derive("Chiara22k_NT", 1.0, "Ciao"));
        assert_ne!(base, CacheKey::derive("Vittorio22k_NT", 1.25, "Ciao"));
        assert_ne!(base, CacheKey::derive("Vittorio22k_NT", 1.0, "Ciao!"));
    }

    #[test]
    fn test_speed_rendering() {
        assert_eq!(format_speed(1.0), "1.0");
        assert_eq!(format_speed(0.75), "0.75");
        assert_eq!(format_speed(2.0), "2.0");
    }

    #[test]
    fn test_separator_does_not_alias_fields() {
        // "a|1.0" + "b" vs "a" + "1.0|b" style shifts must not collide
        let a = CacheKey::derive("voice", 1.0, "x|y");
        let b = CacheKey::derive("voice|1.0|x", 1.0, "y");
        assert_ne!(a, b);
    }

    #[test]
    fn test_no_collisions_over_corpus() {
        let voices = ["Vittorio22k_HQ", "Chiara22k_NT", "Ryan22k_NT", "Klaus22k_NT"];
        let speeds = [0.5, 0.75, 1.0, 1.25, 1.5];
        let mut seen = HashSet::new();
        let mut total = 0usize;
        for voice in voices {
            for speed in speeds {
                for i in 0..500 {
                    let text = format!("Messaggio di prova numero {}", i);
                    seen.insert(CacheKey::derive(voice, speed, &text));
                    total += 1;
                }
            }
        }
        assert_eq!(total, 10_000);
        assert_eq!(seen.len(), total);
    }

    #[test]
    fn test_parse_roundtrip_and_rejects() {
        let key = CacheKey::derive("Vittorio22k_NT", 1.0, "Ciao");
        assert_eq!(CacheKey::parse(key.as_str()), Some(key));
        assert!(CacheKey::parse("not-a-key").is_none());
        assert!(CacheKey::parse(&"A".repeat(KEY_HEX_LEN)).is_none());
        assert!(CacheKey::parse(&"a".repeat(KEY_HEX_LEN - 1)).is_none());
    }
}
