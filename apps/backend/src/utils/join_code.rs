//! Join code generation for games.
//!
//! A join code is the game identifier players share: 7 characters drawn from
//! `A-Z0-9`. Uniqueness is the registry's job; see
//! `GameRegistry::create_game`.

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const JOIN_CODE_LEN: usize = 7;

/// Generate a join code from the thread-local RNG.
///
/// # Example
/// ```
/// use findmines::utils::join_code::generate_join_code;
///
/// let code = generate_join_code();
/// assert_eq!(code.len(), 7);
/// assert!(code.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
/// ```
pub fn generate_join_code() -> String {
    join_code_from(&mut rand::rng())
}

pub fn join_code_from<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..JOIN_CODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
