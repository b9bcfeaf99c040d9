//! iperf3 session cookie generation.
//!
//! The cookie identifies a control connection's data streams to the
//! server. It must be unpredictable (it doubles as a weak session
//! secret), so generation uses a cryptographically seeded RNG — unlike
//! the data-plane payload filler in `dataplane`, which does not need one.

use crate::protocol::COOKIE_SIZE;
use rand::Rng;

/// Alphabet iperf3 uses for the textual part of the cookie (base32-like, lowercase).
const COOKIE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Generate a fresh 37-byte cookie: 36 independently uniform characters from
/// [`COOKIE_ALPHABET`] followed by a single `0x00` byte.
pub fn generate_cookie() -> [u8; COOKIE_SIZE] {
    let mut cookie = [0u8; COOKIE_SIZE];
    let mut rng = rand::thread_rng();
    for byte in cookie.iter_mut().take(COOKIE_SIZE - 1) {
        let idx = rng.gen_range(0..COOKIE_ALPHABET.len());
        *byte = COOKIE_ALPHABET[idx];
    }
    cookie[COOKIE_SIZE - 1] = 0;
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_is_37_bytes_ending_in_nul() {
        let cookie = generate_cookie();
        assert_eq!(cookie.len(), 37);
        assert_eq!(cookie[36], 0);
    }

    #[test]
    fn cookie_chars_are_from_alphabet() {
        for _ in 0..200 {
            let cookie = generate_cookie();
            for &b in &cookie[..36] {
                assert!(
                    COOKIE_ALPHABET.contains(&b),
                    "byte {:#x} not in cookie alphabet",
                    b
                );
            }
        }
    }

    #[test]
    fn cookies_are_not_constant() {
        let a = generate_cookie();
        let b = generate_cookie();
        assert_ne!(&a[..36], &b[..36], "two cookies collided — RNG looks broken");
    }
}
