//! Opaque identifier generation.
//!
//! Identifiers are fixed-length strings over `[0-9a-z]`, handed out to
//! profiles, sessions, and events that arrive without one. There is no
//! central registry and no uniqueness check — collisions are made
//! statistically unlikely by mixing a process-wide runtime fingerprint
//! (hostname + pid, hashed to base-36) with random base-36 digits. The
//! fingerprint keeps rapid same-process calls from colliding on RNG state
//! alone; the random remainder separates processes that share a host.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use rand::Rng;

/// Default identifier length, matching the remote store's ids.
pub const DEFAULT_LENGTH: usize = 32;

/// Base-36 charset: `0-9` then `a-z`.
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Error from identifier generation.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Requested length must be a positive integer.
    #[error("identifier length must be positive, got {0}")]
    InvalidLength(usize),
}

/// Generate an identifier of exactly `len` base-36 characters.
///
/// The runtime fingerprint (truncated to `len` if needed) is placed at the
/// head when its length is even, at the tail when odd; the remainder is
/// filled with random base-36 digits.
pub fn generate(len: usize) -> Result<String, IdError> {
    if len == 0 {
        return Err(IdError::InvalidLength(len));
    }

    let fp = fingerprint();
    let fp = &fp[..fp.len().min(len)];
    let fill: String = {
        let mut rng = rand::thread_rng();
        (0..len - fp.len())
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect()
    };

    Ok(if fp.len() % 2 == 0 {
        format!("{fp}{fill}")
    } else {
        format!("{fill}{fp}")
    })
}

/// Generate an identifier of [`DEFAULT_LENGTH`] characters.
pub fn generate_default() -> String {
    // DEFAULT_LENGTH is non-zero, so generate() cannot fail here.
    generate(DEFAULT_LENGTH).unwrap_or_default()
}

/// Process-wide runtime fingerprint: hostname + pid hashed to base-36.
/// Computed once per process.
fn fingerprint() -> &'static str {
    static FINGERPRINT: OnceLock<String> = OnceLock::new();
    FINGERPRINT.get_or_init(|| {
        let mut hasher = DefaultHasher::new();
        hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_default()
            .hash(&mut hasher);
        std::process::id().hash(&mut hasher);
        to_base36(hasher.finish())
    })
}

/// Render a u64 in base-36 (lowercase), `"0"` for zero.
fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
