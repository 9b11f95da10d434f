//! Transaction Identifiers
//!
//! Every request that expects a correlated reply carries a `txid` which the
//! daemon echoes back. Identifiers are random, fixed-length strings over
//! `A-Z0-9`; with 36^10 possibilities collisions are not checked for.

use rand::Rng;
use std::fmt;

/// Length of a generated transaction id.
pub const TXID_LEN: usize = 10;

/// Alphabet transaction ids are drawn from.
const TXID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A transaction id echoed by the admin endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Txid(String);

impl Txid {
    /// Generate a fresh random transaction id.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let id: String = (0..TXID_LEN)
            .map(|_| TXID_CHARSET[rng.gen_range(0..TXID_CHARSET.len())] as char)
            .collect();
        Self(id)
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the id as bytes (wire form).
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl From<&str> for Txid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Txid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_shape() {
        for _ in 0..1000 {
            let txid = Txid::generate();
            assert_eq!(txid.as_str().len(), TXID_LEN);
            assert!(txid
                .as_str()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_generated_ids_differ() {
        let ids: HashSet<Txid> = (0..100).map(|_| Txid::generate()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_from_and_display() {
        let txid = Txid::from("ABC123");
        assert_eq!(txid.to_string(), "ABC123");
        assert_eq!(txid.as_bytes(), b"ABC123");
        assert_eq!(Txid::from("ABC123".to_string()), txid);
    }
}
