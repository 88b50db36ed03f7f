//! PIN well-formedness and one-way hashing.
//!
//! The crate never stores or compares a raw PIN: candidates are validated
//! locally (exactly six digits), hashed through an injected one-way
//! function, and compared against the stored hash in constant time.
//! Malformed input is rejected before any policy or hash work happens.

use sha2::{Digest, Sha256};

/// Required PIN length (digits).
pub const PIN_LENGTH: usize = 6;

/// Number of SHA-256 iterations for PIN stretching.
const HASH_ITERATIONS: u32 = 100_000;

/// Domain-separation prefix mixed into every digest.
const DOMAIN_PREFIX: &[u8] = b"obralink-pin-v1";

/// Check whether a candidate PIN is exactly six ASCII digits.
pub fn is_well_formed(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.chars().all(|c| c.is_ascii_digit())
}

/// Injected one-way hash used to set and compare the stored PIN hash.
///
/// Contract: deterministic, collision-resistant, non-invertible. The gate
/// is generic over this trait so hosts can swap in their own primitive.
pub trait PinHasher {
    /// Hash a (well-formed) PIN to its stored representation.
    fn hash(&self, pin: &str) -> String;

    /// Compare a candidate PIN against a stored hash in constant time.
    fn verify(&self, pin: &str, stored_hash: &str) -> bool {
        constant_time_eq(self.hash(pin).as_bytes(), stored_hash.as_bytes())
    }
}

/// Default hasher: iterated SHA-256 under a domain prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct IteratedSha256;

impl PinHasher for IteratedSha256 {
    fn hash(&self, pin: &str) -> String {
        let mut hash = Sha256::new();
        hash.update(DOMAIN_PREFIX);
        hash.update(pin.as_bytes());
        let mut result = hash.finalize();

        // Iterated hashing for key stretching
        for _ in 1..HASH_ITERATIONS {
            let mut h = Sha256::new();
            h.update(result);
            h.update(DOMAIN_PREFIX);
            result = h.finalize();
        }

        hex::encode(result)
    }
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
