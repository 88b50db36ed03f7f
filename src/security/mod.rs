//! PIN security: well-formedness, one-way hashing, and brute-force lockout.

pub mod lockout;
pub mod pin;

pub use lockout::LockoutPolicy;
pub use pin::{IteratedSha256, PinHasher};
